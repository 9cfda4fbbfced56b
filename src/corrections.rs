use hifitime::Unit;
use log::debug;
use map_3d::{ecef2aer, ecef2geodetic, Ellipsoid};
use nalgebra::Vector3;

use crate::{
    bias::{Bias, BiasRuntime},
    cfg::Config,
    constants::{EARTH_ANGULAR_VEL_RAD_S, SPEED_OF_LIGHT_M_S},
    ephemeris::{kepler, precise, EphemerisRecord, EphemerisStore},
    error::Error,
    observation::ObservationRecord,
    orbit::SatelliteState,
    prelude::{Carrier, Duration, Epoch, TimeShift, SV},
};

/// Individual correction components, in meters, kept separately for
/// auditability. Each component carries the sign it is applied with:
/// `corrected = raw + Σ components`, exactly.
///
/// Sign convention: the corrected pseudo range approximates the geometric
/// range in the ECEF frame at transmission time. Clock terms are added
/// (a satellite clock running early shortens the apparent range), signal
/// delays (group delay, atmosphere) and the Earth rotation advance are
/// subtracted.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CorrectionComponents {
    /// Satellite onboard clock offset, +c·Δt_sv
    pub sv_clock_m: f64,

    /// Relativistic clock term from orbit eccentricity, +c·Δt_rel
    pub relativistic_m: f64,

    /// Earth rotation (Sagnac) term, −ω_e/c·(x_sv·y_rx − y_sv·x_rx)
    pub sagnac_m: f64,

    /// Onboard group delay, −c·TGD·(f_L1/f)²
    pub group_delay_m: f64,

    /// Modeled tropospheric delay, −delay
    pub tropo_m: f64,

    /// Modeled ionospheric delay, −delay
    pub iono_m: f64,
}

impl CorrectionComponents {
    /// Signed sum of all components, in meters.
    pub fn sum_m(&self) -> f64 {
        self.sv_clock_m
            + self.relativistic_m
            + self.sagnac_m
            + self.group_delay_m
            + self.tropo_m
            + self.iono_m
    }
}

/// One fully corrected observable: the output row of the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedObservable {
    /// Reception [Epoch]
    pub epoch: Epoch,

    /// [SV]
    pub sv: SV,

    /// [Carrier] signal
    pub carrier: Carrier,

    /// Raw pseudo range, as observed (meters)
    pub raw_pseudo_range_m: f64,

    /// Corrected pseudo range (meters). Reproduced exactly by
    /// raw + [CorrectionComponents::sum_m].
    pub corrected_pseudo_range_m: f64,

    /// Individual [CorrectionComponents]
    pub components: CorrectionComponents,

    /// Resolved transmission [Epoch]
    pub tx_epoch: Epoch,

    /// Satellite ECEF position at transmission time (meters)
    pub sv_position_ecef_m: Vector3<f64>,

    /// Satellite clock drift diagnostic, in meters per second
    pub sv_clock_drift_mps: f64,

    /// Satellite (elevation, azimuth) in decimal degrees,
    /// when the receiver position is known
    pub sv_elevation_azimuth_deg_deg: Option<(f64, f64)>,
}

/// [CorrectionEngine] applies the standard correction chain to raw
/// observations: transmission time solving, satellite state propagation,
/// clock / relativistic / Sagnac / group delay and optional atmospheric
/// corrections. Construction validates the configuration: any
/// configuration error is fatal here, before processing starts.
#[derive(Debug, Clone)]
pub struct CorrectionEngine {
    /// Configuration
    pub(crate) cfg: Config,

    /// Read-only ephemeris base
    store: EphemerisStore,

    /// Timescale converter
    time_shift: TimeShift,

    /// Receiver apriori position, ECEF meters
    rx_position_ecef_m: Option<Vector3<f64>>,

    /// Receiver geodetic coordinates (lat [rad], long [rad], alt [m])
    rx_geo_rad_rad_m: Option<(f64, f64, f64)>,
}

impl CorrectionEngine {
    /// Builds a new [CorrectionEngine]. The [EphemerisStore] must be fully
    /// populated: it is only read from this point on.
    pub fn new(
        cfg: Config,
        store: EphemerisStore,
        rx_position_ecef_m: Option<Vector3<f64>>,
    ) -> Result<Self, Error> {
        cfg.validate()?;

        let time_shift = cfg.time_shift()?;

        if cfg.needs_rx_position() && rx_position_ecef_m.is_none() {
            return Err(Error::MissingReceiverPosition);
        }

        let rx_geo_rad_rad_m = rx_position_ecef_m
            .map(|p| ecef2geodetic(p[0], p[1], p[2], Ellipsoid::WGS84));

        Ok(Self {
            cfg,
            store,
            time_shift,
            rx_position_ecef_m,
            rx_geo_rad_rad_m,
        })
    }

    /// Access to the [TimeShift] converter built from configuration data.
    pub fn time_shift(&self) -> &TimeShift {
        &self.time_shift
    }

    /// Propagates this record to the target [Epoch].
    fn propagate(
        &self,
        record: &EphemerisRecord,
        sv: SV,
        t: Epoch,
    ) -> Result<SatelliteState, Error> {
        match record {
            EphemerisRecord::Keplerian(eph) => kepler::propagate(eph, t, &self.cfg),
            EphemerisRecord::Precise(_) => precise::interpolate(
                &self.store.precise_samples(sv),
                t,
                self.cfg.interpolation_order,
            ),
        }
    }

    /// Applies the complete correction chain to one [ObservationRecord].
    /// Data availability and convergence failures are recoverable: the
    /// caller excludes the observation and keeps the cause.
    pub fn correct(&self, obs: &ObservationRecord) -> Result<CorrectedObservable, Error> {
        let pr_m = obs.pseudo_range_m.ok_or(Error::MissingPseudoRange)?;

        let record = self.store.lookup(obs.sv, obs.epoch)?;

        let tgd = match record {
            EphemerisRecord::Keplerian(eph) => eph.tgd,
            EphemerisRecord::Precise(_) => Duration::ZERO,
        };

        // transmission time: iterate the implied travel time
        // t_tx = t_rx − pr/c − Δt_sv(t_tx)
        let mut tof_s = pr_m / SPEED_OF_LIGHT_M_S;
        let mut resolved: Option<(Epoch, SatelliteState)> = None;

        for _ in 0..self.cfg.clock_iteration_max_passes {
            let t_tx = obs.epoch - tof_s * Unit::Second;
            let state = self.propagate(record, obs.sv, t_tx)?;

            let mut clock_s = 0.0;
            if self.cfg.modeling.sv_clock_bias {
                clock_s += state.clock_bias_s;
            }
            if self.cfg.modeling.relativistic_clock_bias {
                clock_s += state.relativistic_clock_s;
            }
            if self.cfg.modeling.sv_total_group_delay {
                clock_s += tgd.to_seconds();
            }

            let next_tof_s = pr_m / SPEED_OF_LIGHT_M_S + clock_s;

            if (next_tof_s - tof_s).abs() < self.cfg.clock_iteration_tolerance_s {
                resolved = Some((t_tx, state));
                break;
            }

            tof_s = next_tof_s;
        }

        let (tx_epoch, state) = resolved.ok_or(Error::ClockIterationNonConvergence)?;

        if tx_epoch >= obs.epoch {
            return Err(Error::PhysicalNonSenseRxPriorTx);
        }

        debug!(
            "{}({}) {} - time of flight: {:.1} ms",
            obs.epoch,
            obs.sv,
            obs.carrier,
            (obs.epoch - tx_epoch).to_seconds() * 1.0E3,
        );

        let sv_elevation_azimuth_deg_deg = self.elevation_azimuth_deg(&state);

        let mut components = CorrectionComponents::default();

        if self.cfg.modeling.sv_clock_bias {
            components.sv_clock_m = SPEED_OF_LIGHT_M_S * state.clock_bias_s;
        }

        if self.cfg.modeling.relativistic_clock_bias {
            components.relativistic_m = SPEED_OF_LIGHT_M_S * state.relativistic_clock_s;
        }

        if self.cfg.modeling.sv_total_group_delay {
            let gamma = (Carrier::L1.frequency_hz() / obs.carrier.frequency_hz()).powi(2);
            components.group_delay_m = -SPEED_OF_LIGHT_M_S * tgd.to_seconds() * gamma;
        }

        if self.cfg.modeling.earth_rotation {
            // validated: rx position is known when this effect is modeled
            let rx = self
                .rx_position_ecef_m
                .ok_or(Error::MissingReceiverPosition)?;

            let sv = state.position_ecef_m;
            components.sagnac_m =
                -EARTH_ANGULAR_VEL_RAD_S / SPEED_OF_LIGHT_M_S * (sv[0] * rx[1] - sv[1] * rx[0]);
        }

        if let Some(rtm) = self.bias_runtime(obs, sv_elevation_azimuth_deg_deg)? {
            components.tropo_m = -self.cfg.tropo_model.bias_m(&rtm);
            components.iono_m = -self.cfg.iono_model.bias_m(&rtm);
        }

        Ok(CorrectedObservable {
            epoch: obs.epoch,
            sv: obs.sv,
            carrier: obs.carrier,
            raw_pseudo_range_m: pr_m,
            corrected_pseudo_range_m: pr_m + components.sum_m(),
            components,
            tx_epoch,
            sv_position_ecef_m: state.position_ecef_m,
            sv_clock_drift_mps: SPEED_OF_LIGHT_M_S * state.clock_drift_s_s,
            sv_elevation_azimuth_deg_deg,
        })
    }

    /// Satellite attitude seen from the receiver, when its position is known.
    fn elevation_azimuth_deg(&self, state: &SatelliteState) -> Option<(f64, f64)> {
        let (lat_rad, long_rad, alt_m) = self.rx_geo_rad_rad_m?;

        let (azim_rad, elev_rad, _) = ecef2aer(
            state.position_ecef_m[0],
            state.position_ecef_m[1],
            state.position_ecef_m[2],
            lat_rad,
            long_rad,
            alt_m,
            Ellipsoid::WGS84,
        );

        Some((elev_rad.to_degrees(), azim_rad.to_degrees()))
    }

    /// Builds the atmospheric model context. None when no model is
    /// selected: both components then stay exactly zero.
    fn bias_runtime(
        &self,
        obs: &ObservationRecord,
        sv_elevation_azimuth_deg_deg: Option<(f64, f64)>,
    ) -> Result<Option<BiasRuntime>, Error> {
        if !self.cfg.tropo_model.needs_rx_position() && !self.cfg.iono_model.needs_rx_position() {
            return Ok(None);
        }

        let rx_geo_rad_rad_m = self
            .rx_geo_rad_rad_m
            .ok_or(Error::MissingReceiverPosition)?;

        let sv_elevation_azimuth_deg_deg =
            sv_elevation_azimuth_deg_deg.ok_or(Error::MissingReceiverPosition)?;

        Ok(Some(BiasRuntime {
            t: obs.epoch,
            frequency_hz: obs.carrier.frequency_hz(),
            sv_elevation_azimuth_deg_deg,
            rx_geo_rad_rad_m,
        }))
    }
}
