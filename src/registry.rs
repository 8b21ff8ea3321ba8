use gnss::prelude::SV;
use log::debug;

use crate::{constants::MAX_SATELLITES, error::Error};

/// [DesignatorRegistry] maps the file-local designators found in orbit
/// products to small process-stable indices. Indices are assigned in
/// first-seen order, never reused, never removed.
#[derive(Debug, Default)]
pub(crate) struct DesignatorRegistry {
    desigs: Vec<SV>,
}

impl DesignatorRegistry {
    /// Index assigned to `sv`, registering it on first sight.
    /// Exceeding [MAX_SATELLITES] is a fatal configuration error.
    pub fn index_of(&mut self, sv: SV) -> Result<usize, Error> {
        if let Some(index) = self.desigs.iter().position(|d| *d == sv) {
            return Ok(index);
        }
        if self.desigs.len() == MAX_SATELLITES {
            return Err(Error::DesignatorCapacity(MAX_SATELLITES));
        }
        self.desigs.push(sv);
        debug!("registered {} as index {}", sv, self.desigs.len() - 1);
        Ok(self.desigs.len() - 1)
    }

    /// Designator registered at `index`, valid for any index previously
    /// returned by [Self::index_of].
    pub fn designator_of(&self, index: usize) -> Option<SV> {
        self.desigs.get(index).copied()
    }

    /// Number of designators seen so far.
    pub fn len(&self) -> usize {
        self.desigs.len()
    }
}
