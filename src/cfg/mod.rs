use crate::{
    bias::{IonoModel, TropoModel},
    error::Error,
    time::{standard_leap_seconds, LeapSecond, StalenessPolicy, TimeShift},
};

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Ephemeris selection policy, when several validity windows
/// contain the target epoch.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum EphemerisSelectionPolicy {
    /// Reference epoch closest to the target epoch wins,
    /// ties broken by most recent insertion
    #[default]
    Closest,
    /// Latest reference epoch at or before the target epoch wins
    MostRecent,
}

impl std::str::FromStr for EphemerisSelectionPolicy {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_lowercase().as_str() {
            "closest" => Ok(Self::Closest),
            "most-recent" | "mostrecent" => Ok(Self::MostRecent),
            _ => Err(Error::InvalidConfig(format!(
                "unknown ephemeris selection policy \"{}\"",
                s
            ))),
        }
    }
}

/// Physical effects this engine models. Disabling one zeroes the
/// matching correction component, it never removes it from the output row.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Modeling {
    /// Satellite onboard clock offset to its constellation timescale
    #[cfg_attr(feature = "serde", serde(default = "default_sv_clock"))]
    pub sv_clock_bias: bool,

    /// Satellite onboard group delay
    #[cfg_attr(feature = "serde", serde(default = "default_sv_tgd"))]
    pub sv_total_group_delay: bool,

    /// Earth rotation during signal propagation (Sagnac)
    #[cfg_attr(feature = "serde", serde(default = "default_earth_rotation"))]
    pub earth_rotation: bool,

    /// Relativistic clock term from orbit eccentricity
    #[cfg_attr(feature = "serde", serde(default = "default_relativistic_clock"))]
    pub relativistic_clock_bias: bool,
}

impl Default for Modeling {
    fn default() -> Self {
        Self {
            sv_clock_bias: default_sv_clock(),
            sv_total_group_delay: default_sv_tgd(),
            earth_rotation: default_earth_rotation(),
            relativistic_clock_bias: default_relativistic_clock(),
        }
    }
}

fn default_sv_clock() -> bool {
    true
}

fn default_sv_tgd() -> bool {
    true
}

fn default_earth_rotation() -> bool {
    true
}

fn default_relativistic_clock() -> bool {
    true
}

fn default_clock_iteration_tolerance_s() -> f64 {
    1.0E-9
}

fn default_clock_iteration_max_passes() -> usize {
    4
}

fn default_kepler_tolerance_rad() -> f64 {
    1.0E-12
}

fn default_kepler_max_iterations() -> usize {
    30
}

fn default_interpolation_order() -> usize {
    10
}

fn default_precise_validity_s() -> f64 {
    900.0
}

fn default_leap_seconds() -> Vec<LeapSecond> {
    standard_leap_seconds()
}

fn default_max_failure_ratio() -> f64 {
    1.0
}

fn default_batch_size() -> usize {
    64
}

/// Engine configuration. All fields come with working defaults,
/// the serde representation may omit any of them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// Physical effects to model
    #[cfg_attr(feature = "serde", serde(default))]
    pub modeling: Modeling,

    /// Transmission time iteration: convergence tolerance
    /// on the implied travel time, in seconds
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_clock_iteration_tolerance_s")
    )]
    pub clock_iteration_tolerance_s: f64,

    /// Transmission time iteration: pass budget. Exceeding it without
    /// convergence raises [Error::ClockIterationNonConvergence].
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_clock_iteration_max_passes")
    )]
    pub clock_iteration_max_passes: usize,

    /// Kepler solver convergence tolerance on eccentric anomaly, in radians
    #[cfg_attr(feature = "serde", serde(default = "default_kepler_tolerance_rad"))]
    pub kepler_tolerance_rad: f64,

    /// Kepler solver iteration budget. Exceeding it without convergence
    /// raises [Error::KeplerNonConvergence].
    #[cfg_attr(feature = "serde", serde(default = "default_kepler_max_iterations"))]
    pub kepler_max_iterations: usize,

    /// Lagrange interpolation order over precise orbit samples
    #[cfg_attr(feature = "serde", serde(default = "default_interpolation_order"))]
    pub interpolation_order: usize,

    /// Half width of a precise sample validity window, in seconds
    #[cfg_attr(feature = "serde", serde(default = "default_precise_validity_s"))]
    pub precise_validity_s: f64,

    /// [EphemerisSelectionPolicy] on overlapping validity windows
    #[cfg_attr(feature = "serde", serde(default))]
    pub ephemeris_selection: EphemerisSelectionPolicy,

    /// Tropospheric delay model
    #[cfg_attr(feature = "serde", serde(default))]
    pub tropo_model: TropoModel,

    /// Ionospheric delay model
    #[cfg_attr(feature = "serde", serde(default))]
    pub iono_model: IonoModel,

    /// Leap second table, as data
    #[cfg_attr(feature = "serde", serde(default = "default_leap_seconds"))]
    pub leap_seconds: Vec<LeapSecond>,

    /// Behavior on epochs past the leap second table
    #[cfg_attr(feature = "serde", serde(default))]
    pub staleness_policy: StalenessPolicy,

    /// Abort threshold on the fraction of rejected observations
    /// over a whole run. 1.0 disables the escalation.
    #[cfg_attr(feature = "serde", serde(default = "default_max_failure_ratio"))]
    pub max_failure_ratio: f64,

    /// Observation batch size of the parallel phase: cancellation
    /// is honored between batches
    #[cfg_attr(feature = "serde", serde(default = "default_batch_size"))]
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modeling: Modeling::default(),
            clock_iteration_tolerance_s: default_clock_iteration_tolerance_s(),
            clock_iteration_max_passes: default_clock_iteration_max_passes(),
            kepler_tolerance_rad: default_kepler_tolerance_rad(),
            kepler_max_iterations: default_kepler_max_iterations(),
            interpolation_order: default_interpolation_order(),
            precise_validity_s: default_precise_validity_s(),
            ephemeris_selection: EphemerisSelectionPolicy::default(),
            tropo_model: TropoModel::default(),
            iono_model: IonoModel::default(),
            leap_seconds: default_leap_seconds(),
            staleness_policy: StalenessPolicy::default(),
            max_failure_ratio: default_max_failure_ratio(),
            batch_size: default_batch_size(),
        }
    }
}

impl Config {
    /// Startup validation: configuration errors are fatal and raised
    /// here, before any observation is processed.
    pub fn validate(&self) -> Result<(), Error> {
        if self.leap_seconds.is_empty() {
            return Err(Error::EmptyLeapSecondTable);
        }

        if self.clock_iteration_max_passes == 0 {
            return Err(Error::InvalidConfig(
                "clock iteration needs at least one pass".to_string(),
            ));
        }

        if self.kepler_max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "kepler solver needs at least one iteration".to_string(),
            ));
        }

        if self.interpolation_order < 1 {
            return Err(Error::InvalidConfig(
                "interpolation order must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.max_failure_ratio) {
            return Err(Error::InvalidConfig(
                "max failure ratio must lie in [0, 1]".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(Error::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Builds the [TimeShift] converter from the tabulated leap seconds.
    pub fn time_shift(&self) -> Result<TimeShift, Error> {
        TimeShift::new(self.leap_seconds.clone(), self.staleness_policy)
    }

    /// Returns true if any enabled model requires the receiver
    /// apriori position.
    pub(crate) fn needs_rx_position(&self) -> bool {
        self.modeling.earth_rotation
            || self.tropo_model.needs_rx_position()
            || self.iono_model.needs_rx_position()
    }
}

#[cfg(test)]
#[cfg(feature = "serde")]
mod test {
    use super::*;
    use crate::bias::KbModel;

    #[test]
    fn empty_json_gives_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json() {
        let cfg: Config = serde_json::from_str(
            r#"{
                "clock_iteration_max_passes": 2,
                "tropo_model": "Saastamoinen",
                "iono_model": {
                    "Klobuchar": {
                        "alpha": [1.0e-8, 0.0, 0.0, 0.0],
                        "beta": [9.0e4, 0.0, 0.0, 0.0],
                        "h_km": 350.0
                    }
                },
                "ephemeris_selection": "MostRecent"
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.clock_iteration_max_passes, 2);
        assert_eq!(cfg.tropo_model, TropoModel::Saastamoinen);
        assert_eq!(
            cfg.ephemeris_selection,
            EphemerisSelectionPolicy::MostRecent
        );
        assert_eq!(
            cfg.iono_model,
            IonoModel::Klobuchar(KbModel {
                alpha: (1.0E-8, 0.0, 0.0, 0.0),
                beta: (9.0E4, 0.0, 0.0, 0.0),
                h_km: 350.0,
            }),
        );
        assert!(cfg.validate().is_ok());

        // defaulted fields
        assert_eq!(cfg.kepler_max_iterations, 30);
        assert!(cfg.modeling.sv_clock_bias);
    }

    #[test]
    fn invalid_settings_are_fatal() {
        let mut cfg = Config::default();
        cfg.leap_seconds.clear();
        assert_eq!(cfg.validate(), Err(Error::EmptyLeapSecondTable));

        let mut cfg = Config::default();
        cfg.max_failure_ratio = 1.5;
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));

        let mut cfg = Config::default();
        cfg.clock_iteration_max_passes = 0;
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }
}
