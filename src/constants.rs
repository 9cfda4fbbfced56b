/// Speed of light, as defined by the GPS ICD, in m.s⁻¹
pub const SPEED_OF_LIGHT_M_S: f64 = 2.99792458E8;

/// Earth angular velocity, in WGS84 frame rad/s
pub const EARTH_ANGULAR_VEL_RAD_S: f64 = 7.2921151467E-5;

/// Earth gravitational constant (m^3 s-2)
pub const EARTH_GRAVITATION_MU_M3_S2: f64 = 398600.5E9;

/// Relativistic clock constant F = -2√μ/c², in s/√m
pub const RELATIVISTIC_CLOCK_F_S_SQRT_M: f64 = -4.442807633E-10;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

pub const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Micrometer precision heuristic on computed distances
pub const PRECISION_M: f64 = 1E-6;

/// |TAI - GPST| fixed offset, in seconds
pub const TAI_GPST_OFFSET_S: f64 = 19.0;

/// |TAI - BDT| fixed offset, in seconds
pub const TAI_BDT_OFFSET_S: f64 = 33.0;

/// GLONASST runs 3 hours ahead of UTC
pub const GLONASST_UTC_OFFSET_S: f64 = 3.0 * SECONDS_PER_HOUR;
