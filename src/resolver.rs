//! Satellite position resolution at arbitrary epochs.

use gnss::prelude::SV;
use hifitime::Epoch;
use itertools::Itertools;
use log::{debug, error};
use nalgebra::{Rotation3, Vector3};

use crate::{
    cache::PositionCache,
    cfg::Config,
    constants::{
        EARTH_ANGULAR_VEL_RAD, INTERPOLATION_ORDER, SPEED_OF_LIGHT_KM_S, STEP_DURATION_S,
    },
    error::Error,
    interp::interpolate,
    providers::SourceChain,
    registry::DesignatorRegistry,
    table::PositionTable,
    time::Step,
};

/// Initial light-time guess, typical of navigation-satellite ranges.
const INITIAL_LIGHT_TIME_S: f64 = 0.07;

/// Light-time refinement passes. Two suffice at navigation-satellite
/// ranges; no convergence check is performed.
const LIGHT_TIME_PASSES: usize = 2;

/// One resolved satellite position.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPosition {
    /// File-local designator
    pub sv: SV,
    /// Geocentric ECEF position (km)
    pub position_km: Vector3<f64>,
}

/// [Resolver] owns all engine state: the position cache, the designator
/// registry and the provider chain. Independent instances share nothing,
/// so tests (or long-running hosts) can run several side by side.
pub struct Resolver {
    /// Resolver parametrization
    pub cfg: Config,
    pub(crate) cache: PositionCache,
    pub(crate) registry: DesignatorRegistry,
    pub(crate) chain: SourceChain,
}

impl Resolver {
    /// Builds a new [Resolver] from [Config].
    pub fn new(cfg: Config) -> Self {
        if let Err(e) = std::fs::create_dir_all(&cfg.cache_dir) {
            error!("could not create {}: {}", cfg.cache_dir.display(), e);
        }
        Self {
            cache: PositionCache::new(cfg.cache_capacity),
            registry: DesignatorRegistry::default(),
            chain: SourceChain::new(&cfg),
            cfg,
        }
    }

    /// Positions of every tracked satellite at `t`.
    ///
    /// When `observer_km` (geocentric ECEF, kilometers) is provided, each
    /// position is antedated for light travel time and for the earth
    /// rotation accrued while the signal was in flight; without it the raw
    /// interpolated geocentric position is returned.
    ///
    /// A satellite missing from any of the ten bracketing steps is
    /// omitted from the result set. The only failure a request can
    /// surface is a step that no provider covers.
    pub fn positions_at(
        &mut self,
        t: Epoch,
        observer_km: Option<Vector3<f64>>,
    ) -> Result<Vec<ResolvedPosition>, Error> {
        let fractional = Step::fractional(t);
        // five samples on either side: the offset lands in [4, 5)
        let base = Step(fractional.floor() as i64 + 1 - INTERPOLATION_ORDER as i64 / 2);
        let offset = fractional - base.0 as f64;

        let tables = self.bracketing_tables(base)?;

        let mut resolved = Vec::new();
        for index in 0..self.registry.len() {
            let Some(samples) = gather_samples(&tables, index) else {
                continue;
            };
            let position_km = match observer_km {
                Some(observer) => light_time_adjusted(&samples, offset, observer).0,
                None => interpolate_position(&samples, offset),
            };
            let Some(sv) = self.registry.designator_of(index) else {
                continue;
            };
            resolved.push(ResolvedPosition { sv, position_km });
        }
        debug!(
            "{} (offset {:.3}): resolved [{}]",
            t,
            offset,
            resolved.iter().map(|p| p.sv).join(", ")
        );
        Ok(resolved)
    }

    /// The ten tables bracketing `base`. Swept cache-only first, then a
    /// network pass over whatever is still missing, so mostly-cached
    /// windows do not trigger redundant downloads.
    fn bracketing_tables(&mut self, base: Step) -> Result<Vec<PositionTable>, Error> {
        let mut tables: Vec<Option<PositionTable>> = Vec::with_capacity(INTERPOLATION_ORDER);
        for k in 0..INTERPOLATION_ORDER as i64 {
            tables.push(
                self.chain
                    .resolve(&mut self.cache, &mut self.registry, base + k, false)
                    .ok(),
            );
        }
        for (k, slot) in tables.iter_mut().enumerate() {
            if slot.is_none() {
                let table =
                    self.chain
                        .resolve(&mut self.cache, &mut self.registry, base + k as i64, true)?;
                *slot = Some(table);
            }
        }
        Ok(tables.into_iter().flatten().collect())
    }

    /// Frees every cached position table. Call at shutdown, or between
    /// unrelated invocations in long-running hosts.
    pub fn flush_cache(&mut self) {
        self.cache.flush();
    }

    /// Designator registered at `index`, valid for any index that has
    /// appeared in a result set.
    pub fn designator_of(&self, index: usize) -> Option<SV> {
        self.registry.designator_of(index)
    }

    /// Number of distinct designators seen so far.
    pub fn satellites_seen(&self) -> usize {
        self.registry.len()
    }
}

type SampleSet = [[f64; INTERPOLATION_ORDER]; 3];

/// Per-axis samples for one satellite, or `None` when any bracketing step
/// lacks data (the satellite is then omitted from the result set).
fn gather_samples(tables: &[PositionTable], index: usize) -> Option<SampleSet> {
    let mut samples = [[0.0; INTERPOLATION_ORDER]; 3];
    for (k, table) in tables.iter().enumerate() {
        let position = table.sample(index)?;
        for (axis, series) in samples.iter_mut().enumerate() {
            series[k] = position[axis];
        }
    }
    Some(samples)
}

fn interpolate_position(samples: &SampleSet, x: f64) -> Vector3<f64> {
    Vector3::new(
        interpolate(&samples[0], x),
        interpolate(&samples[1], x),
        interpolate(&samples[2], x),
    )
}

/// Antedates one satellite position for light travel time.
///
/// Exactly [LIGHT_TIME_PASSES] passes, seeded at [INITIAL_LIGHT_TIME_S]:
/// re-interpolate at the emission time, spin the emission-time frame
/// forward by the rotation the earth accrues during the delay (the
/// orientation matrix belongs to the observation epoch), then refresh the
/// delay from the observer range. Good to far better than
/// optical-astrometry precision at navigation-satellite ranges; no claim
/// is made for exotic geometries.
pub(crate) fn light_time_adjusted(
    samples: &SampleSet,
    x: f64,
    observer_km: Vector3<f64>,
) -> (Vector3<f64>, f64) {
    let mut delay_s = INITIAL_LIGHT_TIME_S;
    let mut position = interpolate_position(samples, x);
    for _ in 0..LIGHT_TIME_PASSES {
        let emission = interpolate_position(samples, x - delay_s / STEP_DURATION_S);
        delay_s = (emission - observer_km).norm() / SPEED_OF_LIGHT_KM_S;
        let spin =
            Rotation3::from_axis_angle(&Vector3::z_axis(), EARTH_ANGULAR_VEL_RAD * delay_s);
        position = spin * emission;
    }
    (position, delay_s)
}
