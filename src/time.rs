use std::fmt;
use std::ops::Add;

use hifitime::Epoch;

use crate::constants::{GPS_SYSTEM_START_MJD, STEPS_PER_DAY};

/// GPST runs a constant 19 seconds behind TAI.
const TAI_GPST_OFFSET_DAYS: f64 = 19.0 / 86_400.0;

/// [Step] is the discrete 15-minute time bucket the tabulations are keyed
/// by: a count of intervals since the GPS system start. It is the sole
/// lookup key for tabulated data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Step(pub i64);

impl Step {
    /// Fractional step count at `t`, on the GPS timescale the files use.
    pub(crate) fn fractional(t: Epoch) -> f64 {
        let mjd_gps = t.to_mjd_tai_days() - TAI_GPST_OFFSET_DAYS;
        (mjd_gps - GPS_SYSTEM_START_MJD) * STEPS_PER_DAY as f64
    }

    /// [Step] containing `t`.
    pub fn containing(t: Epoch) -> Self {
        Self(Self::fractional(t).floor() as i64)
    }

    /// [Epoch] at the start of this [Step].
    pub fn epoch(&self) -> Epoch {
        let mjd_tai =
            GPS_SYSTEM_START_MJD + self.0 as f64 / STEPS_PER_DAY as f64 + TAI_GPST_OFFSET_DAYS;
        Epoch::from_mjd_tai(mjd_tai)
    }

    /// Day number since the GPS system start.
    pub(crate) fn day_number(&self) -> i64 {
        self.0.div_euclid(STEPS_PER_DAY)
    }

    /// GPS week this step falls in.
    pub(crate) fn gps_week(&self) -> i64 {
        self.day_number() / 7
    }

    /// Day of week, 0 = Sunday per the GPS convention.
    pub(crate) fn day_of_week(&self) -> i64 {
        self.day_number() % 7
    }

    /// Hour of day, 0..24.
    pub(crate) fn hour_of_day(&self) -> i64 {
        self.0.rem_euclid(STEPS_PER_DAY) / 4
    }

    /// Calendar (year, day of year) of the day this step falls in.
    /// Sampled at mid-day so timescale offsets cannot straddle a boundary.
    pub(crate) fn year_doy(&self) -> (i32, u16) {
        let noon = Epoch::from_mjd_utc(GPS_SYSTEM_START_MJD + self.day_number() as f64 + 0.5);
        let (year, ..) = noon.to_gregorian_utc();
        (year, noon.day_of_year().floor() as u16)
    }
}

impl Add<i64> for Step {
    type Output = Self;
    fn add(self, rhs: i64) -> Self {
        Self(self.0 + rhs)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
