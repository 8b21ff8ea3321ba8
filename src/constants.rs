/// Speed of light in km.s⁻¹
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// Earth angular velocity, in WGS84 frame rad/s
pub const EARTH_ANGULAR_VEL_RAD: f64 = 7.2921151467E-5;

/// Start of the GPS timing system (1980 Jan 6) as a Modified Julian Date.
/// Tabulated orbit files carry a one-day offset within their headers.
pub const GPS_SYSTEM_START_MJD: f64 = 44244.0;

/// Orbit products are tabulated at fifteen-minute intervals: 96 steps a day.
pub const STEPS_PER_DAY: i64 = 24 * 4;

/// Seconds covered by one tabulated step.
pub const STEP_DURATION_S: f64 = 86_400.0 / STEPS_PER_DAY as f64;

/// Upper bound on distinct designators over one process lifetime.
pub const MAX_SATELLITES: usize = 200;

/// Evenly spaced samples consumed by the Lagrange evaluator.
pub const INTERPOLATION_ORDER: usize = 10;
