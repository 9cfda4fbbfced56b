use nalgebra::Vector3;

use crate::prelude::{Epoch, SV};

/// Satellite state propagated to one specific [Epoch].
/// Derived on demand, never cached by the engine: propagation is a pure
/// function of the ephemeris record and target epoch.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SatelliteState {
    /// [SV] this state describes
    pub sv: SV,

    /// [Epoch] of validity
    pub epoch: Epoch,

    /// ECEF position, in meters
    pub position_ecef_m: Vector3<f64>,

    /// ECEF velocity, in m/s
    pub velocity_ecef_m_s: Vector3<f64>,

    /// Onboard clock offset to the constellation timescale, in seconds.
    /// Does not include the relativistic term, kept separately.
    pub clock_bias_s: f64,

    /// Onboard clock drift, in s/s
    pub clock_drift_s_s: f64,

    /// Relativistic clock term from orbit eccentricity, in seconds
    pub relativistic_clock_s: f64,
}

impl SatelliteState {
    /// Range from this satellite to an ECEF position, in meters.
    pub fn range_m(&self, rx_ecef_m: &Vector3<f64>) -> f64 {
        (self.position_ecef_m - rx_ecef_m).norm()
    }
}
