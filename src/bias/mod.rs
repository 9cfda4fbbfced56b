use crate::prelude::Epoch;

pub(crate) mod tropo;
pub use tropo::TropoModel;

pub(crate) mod iono;
pub use iono::{IonoModel, KbModel};

/// Runtime context forwarded to atmospheric bias models.
#[derive(Debug, Copy, Clone)]
pub struct BiasRuntime {
    /// Signal reception [Epoch]
    pub t: Epoch,

    /// Signal frequency in Hertz
    pub frequency_hz: f64,

    /// Satellite (elevation, azimuth) seen from the receiver,
    /// in decimal degrees
    pub sv_elevation_azimuth_deg_deg: (f64, f64),

    /// Receiver geodetic coordinates: (latitude [rad], longitude [rad],
    /// altitude above sea level [m])
    pub rx_geo_rad_rad_m: (f64, f64, f64),
}

/// Implemented by all atmospheric delay models.
pub(crate) trait Bias {
    /// Returns the modeled delay, in meters of propagation delay.
    fn bias_m(&self, rtm: &BiasRuntime) -> f64;
}
