use crate::{
    error::Error,
    prelude::{Carrier, Epoch, GnssTimeScale, TimeShift, SV},
};

/// One raw signal observation, as supplied by the external parser.
/// Read-only input to the correction engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationRecord {
    /// Observed [SV]
    pub sv: SV,

    /// [Carrier] signal
    pub carrier: Carrier,

    /// Reception [Epoch], as sampled by the receiver clock
    pub epoch: Epoch,

    /// Decoded pseudo range, in meters
    pub pseudo_range_m: Option<f64>,

    /// Carrier phase range, in meters
    pub phase_range_m: Option<f64>,

    /// Doppler shift, in Hz
    pub doppler_hz: Option<f64>,
}

impl ObservationRecord {
    /// Builds a pseudo range [ObservationRecord].
    pub fn pseudo_range(sv: SV, carrier: Carrier, epoch: Epoch, pseudo_range_m: f64) -> Self {
        Self {
            sv,
            carrier,
            epoch,
            pseudo_range_m: Some(pseudo_range_m),
            phase_range_m: None,
            doppler_hz: None,
        }
    }

    /// Builds a pseudo range [ObservationRecord] from a reception instant
    /// tagged in any [GnssTimeScale], normalized through the leap second
    /// table. This is how Glonass timestamps (GLONASST has no native
    /// [hifitime] representation) enter the engine.
    pub fn pseudo_range_tagged_seconds(
        sv: SV,
        carrier: Carrier,
        t_s: f64,
        scale: GnssTimeScale,
        time_shift: &TimeShift,
        pseudo_range_m: f64,
    ) -> Result<Self, Error> {
        let epoch = time_shift.normalize(t_s, scale)?;
        Ok(Self::pseudo_range(sv, carrier, epoch, pseudo_range_m))
    }

    /// Copies and returns [ObservationRecord] with phase range, in meters.
    pub fn with_phase_range_m(&self, phase_range_m: f64) -> Self {
        let mut s = self.clone();
        s.phase_range_m = Some(phase_range_m);
        s
    }

    /// Copies and returns [ObservationRecord] with doppler shift, in Hz.
    pub fn with_doppler_hz(&self, doppler_hz: f64) -> Self {
        let mut s = self.clone();
        s.doppler_hz = Some(doppler_hz);
        s
    }
}
