use crate::{
    bias::{Bias, BiasRuntime},
    error::Error,
};

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Tropospheric delay models.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum TropoModel {
    /// Pass-through: exactly zero contribution
    #[default]
    None,
    /// Simplified Saastamoinen, standard atmosphere at receiver altitude
    Saastamoinen,
}

impl std::str::FromStr for TropoModel {
    type Err = Error;
    fn from_str(s: &str) -> Result<TropoModel, Error> {
        let c = s.trim().to_lowercase();
        match c.as_str() {
            "none" => Ok(TropoModel::None),
            "saastamoinen" => Ok(TropoModel::Saastamoinen),
            _ => Err(Error::UnknownCorrectionModel(c)),
        }
    }
}

impl TropoModel {
    pub(crate) fn needs_rx_position(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Bias for TropoModel {
    fn bias_m(&self, rtm: &BiasRuntime) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Saastamoinen => saastamoinen_model(rtm),
        }
    }
}

/// Simplified Saastamoinen zenith delay, mapped by 1/cos(z).
/// Meteorological inputs come from a standard atmosphere evaluated
/// at the receiver altitude, with 70% relative humidity.
fn saastamoinen_model(rtm: &BiasRuntime) -> f64 {
    const HUMIDITY: f64 = 0.7;

    let (lat_rad, _, h_m) = rtm.rx_geo_rad_rad_m;
    let h_m = h_m.max(0.0);

    let elev_rad = rtm.sv_elevation_azimuth_deg_deg.0.to_radians();
    let z_rad = std::f64::consts::FRAC_PI_2 - elev_rad;

    // standard atmosphere
    let p_mbar = 1013.25 * (1.0 - 2.2557E-5 * h_m).powf(5.2568);
    let t_k = 288.15 - 6.5E-3 * h_m;
    let e_mbar = 6.108 * HUMIDITY * ((17.15 * t_k - 4684.0) / (t_k - 38.45)).exp();

    let dry = 0.0022768 * p_mbar / (1.0 - 0.00266 * (2.0 * lat_rad).cos() - 0.00028 * h_m / 1.0E3)
        / z_rad.cos();
    let wet = 0.002277 * (1255.0 / t_k + 0.05) * e_mbar / z_rad.cos();

    dry + wet
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::Epoch;
    use std::str::FromStr;

    fn runtime(elev_deg: f64) -> BiasRuntime {
        BiasRuntime {
            t: Epoch::default(),
            frequency_hz: 1575.42E6,
            sv_elevation_azimuth_deg_deg: (elev_deg, 120.0),
            rx_geo_rad_rad_m: (0.76, 0.025, 150.0),
        }
    }

    #[test]
    fn model_parsing() {
        assert_eq!(TropoModel::from_str("none"), Ok(TropoModel::None));
        assert_eq!(
            TropoModel::from_str("Saastamoinen"),
            Ok(TropoModel::Saastamoinen)
        );
        assert_eq!(
            TropoModel::from_str("unb3"),
            Err(Error::UnknownCorrectionModel("unb3".to_string())),
        );
    }

    #[test]
    fn none_is_pass_through() {
        assert_eq!(TropoModel::None.bias_m(&runtime(30.0)), 0.0);
    }

    #[test]
    fn saastamoinen_magnitude() {
        // zenith total delay at mid latitude is ~2.3-2.6 m
        let zenith = TropoModel::Saastamoinen.bias_m(&runtime(90.0));
        assert!(zenith > 2.0 && zenith < 3.0, "zenith delay {}", zenith);

        // low elevation delay is larger
        let low = TropoModel::Saastamoinen.bias_m(&runtime(15.0));
        assert!(low > zenith);
    }
}
