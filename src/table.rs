use nalgebra::Vector3;

use crate::constants::MAX_SATELLITES;

/// [PositionTable] holds the tabulated positions for one time step: one
/// optional geocentric ECEF sample (in kilometers) per registered
/// satellite index. An empty slot means the provider published no data
/// for that satellite at that step.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionTable {
    samples: Vec<Option<Vector3<f64>>>,
}

impl Default for PositionTable {
    fn default() -> Self {
        Self {
            samples: vec![None; MAX_SATELLITES],
        }
    }
}

impl PositionTable {
    /// New empty [PositionTable].
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the sample for satellite `index`.
    pub fn set(&mut self, index: usize, position_km: Vector3<f64>) {
        if let Some(slot) = self.samples.get_mut(index) {
            *slot = Some(position_km);
        }
    }

    /// Tabulated sample for satellite `index`, if the provider had data.
    pub fn sample(&self, index: usize) -> Option<Vector3<f64>> {
        self.samples.get(index).copied().flatten()
    }

    /// Number of satellites carrying data at this step.
    pub fn len(&self) -> usize {
        self.samples.iter().flatten().count()
    }

    /// True when no satellite carries data at this step.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
