use hifitime::{Epoch, TimeScale, Unit};
use log::warn;

use crate::{
    constants::{GLONASST_UTC_OFFSET_S, TAI_BDT_OFFSET_S, TAI_GPST_OFFSET_S},
    error::Error,
    prelude::Constellation,
};

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Timescales supported by the correction engine.
/// Each tag describes the clock an epoch was sampled against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum GnssTimeScale {
    /// GPS Time, |TAI - GPST| = 19 s
    GPST,
    /// Galileo System Time, steered on GPST
    GST,
    /// BeiDou Time, |TAI - BDT| = 33 s
    BDT,
    /// Glonass Time, UTC + 3 h, subject to leap seconds
    GLONASST,
    /// Temps Atomique International
    TAI,
    /// Universal Coordinated Time
    UTC,
}

impl std::fmt::Display for GnssTimeScale {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Self::GPST => write!(f, "GPST"),
            Self::GST => write!(f, "GST"),
            Self::BDT => write!(f, "BDT"),
            Self::GLONASST => write!(f, "GLONASST"),
            Self::TAI => write!(f, "TAI"),
            Self::UTC => write!(f, "UTC"),
        }
    }
}

impl std::str::FromStr for GnssTimeScale {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_uppercase().as_str() {
            "GPST" => Ok(Self::GPST),
            "GST" => Ok(Self::GST),
            "BDT" => Ok(Self::BDT),
            "GLONASST" => Ok(Self::GLONASST),
            "TAI" => Ok(Self::TAI),
            "UTC" => Ok(Self::UTC),
            _ => Err(Error::UnknownTimeScale(s.to_string())),
        }
    }
}

/// Returns the [GnssTimeScale] broadcast data of this [Constellation] refers to.
pub fn constellation_timescale(constellation: Constellation) -> Result<GnssTimeScale, Error> {
    match constellation {
        Constellation::GPS | Constellation::QZSS => Ok(GnssTimeScale::GPST),
        Constellation::Galileo => Ok(GnssTimeScale::GST),
        Constellation::BeiDou => Ok(GnssTimeScale::BDT),
        Constellation::Glonass => Ok(GnssTimeScale::GLONASST),
        c => {
            if c.is_sbas() {
                Ok(GnssTimeScale::GPST)
            } else {
                Err(Error::UnknownTimeScale(c.to_string()))
            }
        },
    }
}

/// Behavior on epochs past the last tabulated leap second.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum StalenessPolicy {
    /// Proceed with the last tabulated offset, log a warning
    #[default]
    Warn,
    /// Abort with [Error::LeapSecondTableStale]
    Abort,
}

/// One leap second table entry.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct LeapSecond {
    /// Instant of effectivity, expressed as seconds in TAI
    /// since the 1958-01-01 TAI origin
    pub tai_s: f64,
    /// Total |TAI - UTC| offset from that instant onwards, in seconds
    pub tai_utc_s: f64,
}

impl LeapSecond {
    /// Builds a [LeapSecond] from the (UTC) date of effectivity at midnight.
    pub fn from_gregorian_utc(year: i32, month: u8, day: u8, tai_utc_s: f64) -> Self {
        let epoch = Epoch::from_gregorian_utc_at_midnight(year, month, day);
        Self {
            tai_s: epoch.to_tai_seconds() - tai_origin().to_tai_seconds(),
            tai_utc_s,
        }
    }
}

/// Common 1958-01-01 TAI origin of the continuous internal representation.
pub(crate) fn tai_origin() -> Epoch {
    Epoch::from_gregorian_tai_at_midnight(1958, 1, 1)
}

/// IERS leap second history, from the first announced entry
/// to 2017-01-01 (the latest to date). This is plain table data:
/// supply your own (newer) table through [crate::prelude::Config] when one is announced.
pub fn standard_leap_seconds() -> Vec<LeapSecond> {
    [
        (1972, 1, 10.0),
        (1972, 7, 11.0),
        (1973, 1, 12.0),
        (1974, 1, 13.0),
        (1975, 1, 14.0),
        (1976, 1, 15.0),
        (1977, 1, 16.0),
        (1978, 1, 17.0),
        (1979, 1, 18.0),
        (1980, 1, 19.0),
        (1981, 7, 20.0),
        (1982, 7, 21.0),
        (1983, 7, 22.0),
        (1985, 7, 23.0),
        (1988, 1, 24.0),
        (1990, 1, 25.0),
        (1991, 1, 26.0),
        (1992, 7, 27.0),
        (1993, 7, 28.0),
        (1994, 7, 29.0),
        (1996, 1, 30.0),
        (1997, 7, 31.0),
        (1999, 1, 32.0),
        (2006, 1, 33.0),
        (2009, 1, 34.0),
        (2012, 7, 35.0),
        (2015, 7, 36.0),
        (2017, 1, 37.0),
    ]
    .iter()
    .map(|(y, m, dt)| LeapSecond::from_gregorian_utc(*y, *m, 1, *dt))
    .collect()
}

/// [TimeShift] converts epochs between [GnssTimeScale]s, over a continuous
/// internal representation: seconds in TAI since the 1958-01-01 TAI origin.
/// Constellation timescales differ from TAI by fixed constants, UTC and
/// GLONASST go through the leap second table. Truncated week counters are
/// not handled here: the external parser resolves full weeks before
/// anything reaches this engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeShift {
    /// Leap second table, sorted by instant of effectivity
    entries: Vec<LeapSecond>,
    /// [StalenessPolicy] on epochs past the table
    policy: StalenessPolicy,
}

impl TimeShift {
    /// Builds a new [TimeShift] from leap second table data.
    /// An empty table is a configuration error.
    pub fn new(mut entries: Vec<LeapSecond>, policy: StalenessPolicy) -> Result<Self, Error> {
        if entries.is_empty() {
            return Err(Error::EmptyLeapSecondTable);
        }

        entries.sort_by(|a, b| {
            a.tai_s
                .partial_cmp(&b.tai_s)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(Self { entries, policy })
    }

    /// |TAI - UTC| offset applicable at this instant (seconds in TAI since origin).
    /// Instants prior to the first entry use the first tabulated offset.
    fn tai_utc_offset_s(&self, tai_s: f64) -> Result<f64, Error> {
        let last = self.entries[self.entries.len() - 1];

        if tai_s > last.tai_s {
            match self.policy {
                StalenessPolicy::Abort => {
                    return Err(Error::LeapSecondTableStale);
                },
                StalenessPolicy::Warn => {
                    warn!("leap second table is stale: proceeding with last known offset");
                },
            }
        }

        Ok(self
            .entries
            .iter()
            .take_while(|entry| entry.tai_s <= tai_s)
            .last()
            .unwrap_or(&self.entries[0])
            .tai_utc_s)
    }

    /// Converts a tagged reading into the continuous internal representation.
    /// All values are elapsed seconds since the common 1958-01-01 TAI origin,
    /// as counted by the tagged clock.
    pub fn to_tai_seconds(&self, t_s: f64, scale: GnssTimeScale) -> Result<f64, Error> {
        match scale {
            GnssTimeScale::TAI => Ok(t_s),
            GnssTimeScale::GPST | GnssTimeScale::GST => Ok(t_s + TAI_GPST_OFFSET_S),
            GnssTimeScale::BDT => Ok(t_s + TAI_BDT_OFFSET_S),
            GnssTimeScale::UTC => {
                // offset indexed by the (1 s off, at worst, around a
                // discontinuity) UTC reading itself
                let offset = self.tai_utc_offset_s(t_s)?;
                Ok(t_s + offset)
            },
            GnssTimeScale::GLONASST => {
                self.to_tai_seconds(t_s - GLONASST_UTC_OFFSET_S, GnssTimeScale::UTC)
            },
        }
    }

    /// Converts from the continuous internal representation to a tagged reading.
    pub fn from_tai_seconds(&self, tai_s: f64, scale: GnssTimeScale) -> Result<f64, Error> {
        match scale {
            GnssTimeScale::TAI => Ok(tai_s),
            GnssTimeScale::GPST | GnssTimeScale::GST => Ok(tai_s - TAI_GPST_OFFSET_S),
            GnssTimeScale::BDT => Ok(tai_s - TAI_BDT_OFFSET_S),
            GnssTimeScale::UTC => {
                let offset = self.tai_utc_offset_s(tai_s)?;
                Ok(tai_s - offset)
            },
            GnssTimeScale::GLONASST => {
                let utc_s = self.from_tai_seconds(tai_s, GnssTimeScale::UTC)?;
                Ok(utc_s + GLONASST_UTC_OFFSET_S)
            },
        }
    }

    /// Converts a tagged epoch reading from one [GnssTimeScale] to another.
    pub fn convert(&self, t_s: f64, from: GnssTimeScale, to: GnssTimeScale) -> Result<f64, Error> {
        let tai_s = self.to_tai_seconds(t_s, from)?;
        self.from_tai_seconds(tai_s, to)
    }

    /// Normalizes a tagged reading into a TAI [Epoch], the representation
    /// every propagation in this engine runs on.
    pub fn normalize(&self, t_s: f64, scale: GnssTimeScale) -> Result<Epoch, Error> {
        let tai_s = self.to_tai_seconds(t_s, scale)?;
        Ok(tai_origin() + tai_s * Unit::Second)
    }

    /// Returns this [Epoch] as a reading of the requested [GnssTimeScale] clock,
    /// in seconds since the 1958-01-01 TAI origin.
    pub fn scale_seconds(&self, t: Epoch, scale: GnssTimeScale) -> Result<f64, Error> {
        let tai_s = t.to_time_scale(TimeScale::TAI).to_tai_seconds() - tai_origin().to_tai_seconds();
        self.from_tai_seconds(tai_s, scale)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn time_shift(policy: StalenessPolicy) -> TimeShift {
        TimeShift::new(standard_leap_seconds(), policy).unwrap()
    }

    #[test]
    fn empty_table_is_rejected() {
        assert_eq!(
            TimeShift::new(vec![], StalenessPolicy::Warn),
            Err(Error::EmptyLeapSecondTable),
        );
    }

    #[test]
    fn fixed_atomic_offsets() {
        let ts = time_shift(StalenessPolicy::Warn);
        let t_s = 2.0E9;

        assert_eq!(
            ts.convert(t_s, GnssTimeScale::GPST, GnssTimeScale::TAI)
                .unwrap(),
            t_s + 19.0,
        );

        assert_eq!(
            ts.convert(t_s, GnssTimeScale::BDT, GnssTimeScale::TAI)
                .unwrap(),
            t_s + 33.0,
        );

        // GST is steered on GPST
        assert_eq!(
            ts.convert(t_s, GnssTimeScale::GST, GnssTimeScale::GPST)
                .unwrap(),
            t_s,
        );

        // |GPST - BDT| = 14 s
        assert_eq!(
            ts.convert(t_s, GnssTimeScale::BDT, GnssTimeScale::GPST)
                .unwrap(),
            t_s + 14.0,
        );
    }

    #[test]
    fn glonasst_utc_offset() {
        let ts = time_shift(StalenessPolicy::Warn);

        // 2016-01-01 in between leap seconds: |TAI-UTC| = 36 s
        let t = Epoch::from_gregorian_utc_at_midnight(2016, 1, 1);
        let utc_s = ts.scale_seconds(t, GnssTimeScale::UTC).unwrap();

        let glonasst_s = ts
            .convert(utc_s, GnssTimeScale::UTC, GnssTimeScale::GLONASST)
            .unwrap();

        assert!((glonasst_s - utc_s - 10800.0).abs() < 1.0E-9);
    }

    #[test]
    fn round_trip_all_pairs() {
        let ts = time_shift(StalenessPolicy::Warn);

        // 2016-06-30, away from any leap second discontinuity
        let t_s = ts
            .scale_seconds(
                Epoch::from_gregorian_utc_at_midnight(2016, 6, 30),
                GnssTimeScale::TAI,
            )
            .unwrap();

        let scales = [
            GnssTimeScale::GPST,
            GnssTimeScale::GST,
            GnssTimeScale::BDT,
            GnssTimeScale::GLONASST,
            GnssTimeScale::TAI,
            GnssTimeScale::UTC,
        ];

        for from in scales {
            for to in scales {
                let forth = ts.convert(t_s, from, to).unwrap();
                let back = ts.convert(forth, to, from).unwrap();
                assert!(
                    (back - t_s).abs() < 1.0E-9,
                    "{}->{} round trip diverged by {}",
                    from,
                    to,
                    back - t_s,
                );
            }
        }
    }

    #[test]
    fn stale_epoch_policy() {
        // last entry: 2017-01-01
        let future = Epoch::from_gregorian_utc_at_midnight(2030, 1, 1);

        let abort = time_shift(StalenessPolicy::Abort);
        let tai_s = abort
            .scale_seconds(future, GnssTimeScale::TAI)
            .unwrap_or(3.0E9);
        assert_eq!(
            abort.from_tai_seconds(tai_s, GnssTimeScale::UTC),
            Err(Error::LeapSecondTableStale),
        );

        let warn = time_shift(StalenessPolicy::Warn);
        let utc_s = warn.from_tai_seconds(tai_s, GnssTimeScale::UTC).unwrap();
        assert!((tai_s - utc_s - 37.0).abs() < 1.0E-9);
    }

    #[test]
    fn unknown_timescale_tag() {
        assert_eq!(
            GnssTimeScale::from_str("LORAN"),
            Err(Error::UnknownTimeScale("LORAN".to_string())),
        );
        assert_eq!(GnssTimeScale::from_str("gpst"), Ok(GnssTimeScale::GPST));
    }
}
