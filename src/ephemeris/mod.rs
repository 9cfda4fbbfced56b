use std::collections::HashMap;

use hifitime::Unit;
use log::debug;
use nalgebra::Vector3;

use crate::{
    cfg::EphemerisSelectionPolicy,
    constants::EARTH_GRAVITATION_MU_M3_S2,
    error::Error,
    prelude::{Duration, Epoch, SV},
};

pub(crate) mod kepler;
pub(crate) mod precise;

/// Broadcast Keplerian orbit and clock description, one navigation frame.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct KeplerianEphemeris {
    /// [SV]
    pub sv: SV,

    /// Time of issue of ephemeris, expressed in the constellation timescale
    pub toe: Epoch,

    /// Time of clock, expressed in the constellation timescale
    pub toc: Epoch,

    /// Semi-major axis (in meters)
    pub semi_major_axis_m: f64,

    /// Eccentricity
    pub eccentricity: f64,

    /// Mean anomaly at reference time (in radians)
    pub m0_rad: f64,

    /// Inclination at reference time (in radians)
    pub i0_rad: f64,

    /// Inclination rate (in radians/s)
    pub idot_rad_s: f64,

    /// Mean motion difference (in radians/s)
    pub dn_rad_s: f64,

    /// Longitude of ascending node at weekly epoch (in radians)
    pub omega0_rad: f64,

    /// Argument of perigee (in radians)
    pub omega_rad: f64,

    /// Rate of right ascension (in radians/s)
    pub omega_dot_rad_s: f64,

    /// Argument of latitude sine / cosine harmonics (in radians)
    pub cus_cuc_rad: (f64, f64),

    /// Inclination sine / cosine harmonics (in radians)
    pub cis_cic_rad: (f64, f64),

    /// Orbit radius sine / cosine harmonics (in meters)
    pub crs_crc_m: (f64, f64),

    /// Clock polynomial (a0 [s], a1 [s/s], a2 [s/s²]), referenced to toc
    pub clock_poly: (f64, f64, f64),

    /// Total group delay, referenced to the L1 frequency
    pub tgd: Duration,
}

impl KeplerianEphemeris {
    /// Half the orbital period: the validity window
    /// extends this much on both sides of toe.
    pub fn half_period(&self) -> Duration {
        let period_s = 2.0
            * std::f64::consts::PI
            * (self.semi_major_axis_m.powi(3) / EARTH_GRAVITATION_MU_M3_S2).sqrt();
        (period_s / 2.0) * Unit::Second
    }
}

/// One precise orbit / clock sample, from an external analysis center.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PreciseEphemeris {
    /// [SV]
    pub sv: SV,

    /// Sampling [Epoch]
    pub epoch: Epoch,

    /// ECEF position, in meters
    pub position_ecef_m: Vector3<f64>,

    /// Clock offset, in seconds
    pub clock_bias_s: f64,

    /// Clock drift, in s/s, when the product provides it
    pub clock_drift_s_s: Option<f64>,
}

/// Tagged ephemeris variant: broadcast Keplerian frame or precise sample.
/// Records are immutable once inserted in the [EphemerisStore].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum EphemerisRecord {
    /// Broadcast Keplerian navigation frame
    Keplerian(KeplerianEphemeris),
    /// Precise orbit / clock sample
    Precise(PreciseEphemeris),
}

impl EphemerisRecord {
    /// [SV] this record describes.
    pub fn sv(&self) -> SV {
        match self {
            Self::Keplerian(eph) => eph.sv,
            Self::Precise(eph) => eph.sv,
        }
    }

    /// Reference [Epoch]: toe for broadcast frames, sampling instant
    /// for precise samples.
    pub fn reference_epoch(&self) -> Epoch {
        match self {
            Self::Keplerian(eph) => eph.toe,
            Self::Precise(eph) => eph.epoch,
        }
    }

    /// Validity window, inclusive at both ends.
    pub fn validity_window(&self, precise_validity_s: f64) -> (Epoch, Epoch) {
        match self {
            Self::Keplerian(eph) => {
                let half = eph.half_period();
                (eph.toe - half, eph.toe + half)
            },
            Self::Precise(eph) => {
                let half = precise_validity_s * Unit::Second;
                (eph.epoch - half, eph.epoch + half)
            },
        }
    }

    /// True if the target epoch lies within the validity window,
    /// both edges included.
    pub fn is_valid(&self, t: Epoch, precise_validity_s: f64) -> bool {
        let (start, end) = self.validity_window(precise_validity_s);
        t >= start && t <= end
    }
}

/// [EphemerisStore] owns all parsed navigation records for a run.
/// Population strictly precedes the parallel correction phase:
/// from then on the store is only read, which makes concurrent
/// lookups safe without locking.
#[derive(Debug, Default, Clone)]
pub struct EphemerisStore {
    /// Records per [SV], in insertion order
    records: HashMap<SV, Vec<EphemerisRecord>>,
    /// [EphemerisSelectionPolicy] on overlapping windows
    policy: EphemerisSelectionPolicy,
    /// Half width of precise sample validity, in seconds
    precise_validity_s: f64,
}

impl EphemerisStore {
    /// Builds an empty store.
    pub fn new(policy: EphemerisSelectionPolicy, precise_validity_s: f64) -> Self {
        Self {
            records: HashMap::new(),
            policy,
            precise_validity_s,
        }
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.records.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts one record. Duplicate (sv, reference epoch) pairs are
    /// rejected: use [Self::add_overwrite] to replace intentionally.
    pub fn add(&mut self, record: EphemerisRecord) -> Result<(), Error> {
        let sv = record.sv();
        let t_ref = record.reference_epoch();

        let records = self.records.entry(sv).or_default();

        if records.iter().any(|r| r.reference_epoch() == t_ref) {
            debug!("{}({}) - duplicate ephemeris rejected", t_ref, sv);
            return Err(Error::DuplicateEphemeris);
        }

        records.push(record);
        Ok(())
    }

    /// Inserts one record, replacing any existing record with the same
    /// (sv, reference epoch).
    pub fn add_overwrite(&mut self, record: EphemerisRecord) {
        let sv = record.sv();
        let t_ref = record.reference_epoch();

        let records = self.records.entry(sv).or_default();
        records.retain(|r| r.reference_epoch() != t_ref);
        records.push(record);
    }

    /// Selects the applicable record for this [SV] at this [Epoch],
    /// following the configured [EphemerisSelectionPolicy]. Pure read.
    pub fn lookup(&self, sv: SV, t: Epoch) -> Result<&EphemerisRecord, Error> {
        let candidates = self
            .records
            .get(&sv)
            .ok_or(Error::NoApplicableEphemeris)?
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_valid(t, self.precise_validity_s));

        let selected = match self.policy {
            EphemerisSelectionPolicy::Closest => candidates
                .min_by(|(idx_a, a), (idx_b, b)| {
                    let dt_a = (a.reference_epoch() - t).abs();
                    let dt_b = (b.reference_epoch() - t).abs();
                    // favors most recent insertion on perfect ties
                    dt_a.cmp(&dt_b).then(idx_b.cmp(idx_a))
                })
                .map(|(_, r)| r),
            EphemerisSelectionPolicy::MostRecent => candidates
                .filter(|(_, r)| r.reference_epoch() <= t)
                .max_by(|(idx_a, a), (idx_b, b)| {
                    a.reference_epoch()
                        .cmp(&b.reference_epoch())
                        .then(idx_a.cmp(idx_b))
                })
                .map(|(_, r)| r),
        };

        match selected {
            Some(record) => Ok(record),
            None => {
                debug!("{}({}) - no applicable ephemeris", t, sv);
                Err(Error::NoApplicableEphemeris)
            },
        }
    }

    /// All precise samples for this [SV], sorted by sampling epoch.
    /// Interpolation needs the neighborhood, not a single record.
    pub(crate) fn precise_samples(&self, sv: SV) -> Vec<PreciseEphemeris> {
        let mut samples: Vec<_> = self
            .records
            .get(&sv)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| match r {
                        EphemerisRecord::Precise(eph) => Some(*eph),
                        EphemerisRecord::Keplerian(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        samples.sort_by(|a, b| a.epoch.cmp(&b.epoch));
        samples
    }
}
