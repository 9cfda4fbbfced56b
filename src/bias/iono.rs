use hifitime::TimeScale;

use crate::{
    bias::{Bias, BiasRuntime},
    constants::{SECONDS_PER_DAY, SPEED_OF_LIGHT_M_S},
    error::Error,
};

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Ionospheric delay models.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum IonoModel {
    /// Pass-through: exactly zero contribution
    #[default]
    None,
    /// Klobuchar single layer model, from broadcast coefficients
    Klobuchar(KbModel),
}

impl std::str::FromStr for IonoModel {
    type Err = Error;
    /// Parses the model name. "klobuchar" builds a [KbModel] with
    /// zeroed coefficients: supply broadcast alpha/beta through
    /// [crate::prelude::Config] for an actual delay.
    fn from_str(s: &str) -> Result<IonoModel, Error> {
        let c = s.trim().to_lowercase();
        match c.as_str() {
            "none" => Ok(IonoModel::None),
            "klobuchar" => Ok(IonoModel::Klobuchar(KbModel::default())),
            _ => Err(Error::UnknownCorrectionModel(c)),
        }
    }
}

impl IonoModel {
    pub(crate) fn needs_rx_position(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Bias for IonoModel {
    fn bias_m(&self, rtm: &BiasRuntime) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Klobuchar(kb) => kb.bias_m(rtm),
        }
    }
}

/// Klobuchar model coefficients, broadcast in the navigation message.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct KbModel {
    /// Amplitude coefficients (s, s/sc, s/sc², s/sc³)
    pub alpha: (f64, f64, f64, f64),
    /// Period coefficients (s, s/sc, s/sc², s/sc³)
    pub beta: (f64, f64, f64, f64),
    /// Ionosphere layer height, in km
    pub h_km: f64,
}

impl Bias for KbModel {
    /// ICD-GPS-200 single frequency algorithm, angles in semicircles,
    /// pierce point on a thin layer at `h_km`.
    /// The L1 delay is rescaled by (f_L1/f)² for other frequencies.
    fn bias_m(&self, rtm: &BiasRuntime) -> f64 {
        const L1_FREQ_HZ: f64 = 1575.42E6;
        const EARTH_RADIUS_KM: f64 = 6378.0;

        let elev_rad = rtm.sv_elevation_azimuth_deg_deg.0.to_radians();
        let azim_rad = rtm.sv_elevation_azimuth_deg_deg.1.to_radians();

        let (lat_rad, long_rad, _) = rtm.rx_geo_rad_rad_m;
        let (phi_u, lambda_u) = (lat_rad / std::f64::consts::PI, long_rad / std::f64::consts::PI);

        // earth centered angle to the layer pierce point
        let fract = EARTH_RADIUS_KM / (EARTH_RADIUS_KM + self.h_km);
        let psi = (std::f64::consts::FRAC_PI_2
            - elev_rad
            - (fract * elev_rad.cos()).asin())
            / std::f64::consts::PI;

        // ionospheric pierce point
        let mut phi_i = phi_u + psi * azim_rad.cos();
        phi_i = phi_i.clamp(-0.416, 0.416);
        let lambda_i = lambda_u + psi * azim_rad.sin() / (phi_i * std::f64::consts::PI).cos();

        // geomagnetic latitude
        let phi_m = phi_i + 0.064 * ((lambda_i - 1.617) * std::f64::consts::PI).cos();

        let tow_s = {
            let (_, tow_nanos) = rtm.t.to_time_scale(TimeScale::GPST).to_time_of_week();
            tow_nanos as f64 / 1.0E9
        };

        let mut t_s = 4.32E4 * lambda_i + tow_s;
        t_s = t_s.rem_euclid(SECONDS_PER_DAY);

        // obliquity through the thin layer
        let slant = 1.0 / (1.0 - (fract * elev_rad.cos()).powi(2)).sqrt();

        let mut amp_s = self.alpha.0
            + self.alpha.1 * phi_m
            + self.alpha.2 * phi_m.powi(2)
            + self.alpha.3 * phi_m.powi(3);
        if amp_s < 0.0 {
            amp_s = 0.0;
        }

        let mut per_s = self.beta.0
            + self.beta.1 * phi_m
            + self.beta.2 * phi_m.powi(2)
            + self.beta.3 * phi_m.powi(3);
        if per_s < 72_000.0 {
            per_s = 72_000.0;
        }

        let x = 2.0 * std::f64::consts::PI * (t_s - 50_400.0) / per_s;

        let delay_s = if x.abs() < 1.57 {
            slant * (5.0E-9 + amp_s * (1.0 - x.powi(2) / 2.0 + x.powi(4) / 24.0))
        } else {
            slant * 5.0E-9
        };

        delay_s * SPEED_OF_LIGHT_M_S * (L1_FREQ_HZ / rtm.frequency_hz).powi(2)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::{Carrier, Epoch};
    use std::str::FromStr;

    fn runtime(frequency_hz: f64) -> BiasRuntime {
        BiasRuntime {
            t: Epoch::from_gregorian_utc(2022, 1, 1, 12, 0, 0, 0),
            frequency_hz,
            sv_elevation_azimuth_deg_deg: (40.0, 210.0),
            rx_geo_rad_rad_m: (0.76, 0.025, 150.0),
        }
    }

    fn kb_model() -> KbModel {
        KbModel {
            alpha: (7.4506E-9, -1.4901E-8, -5.9605E-8, 1.1921E-7),
            beta: (9.0112E4, -6.5536E4, -1.3107E5, 4.5875E5),
            h_km: 350.0,
        }
    }

    #[test]
    fn model_parsing() {
        assert_eq!(IonoModel::from_str("none"), Ok(IonoModel::None));
        assert_eq!(
            IonoModel::from_str("Klobuchar"),
            Ok(IonoModel::Klobuchar(KbModel::default())),
        );
        assert_eq!(
            IonoModel::from_str("nequick-g"),
            Err(Error::UnknownCorrectionModel("nequick-g".to_string())),
        );
    }

    #[test]
    fn none_is_pass_through() {
        assert_eq!(IonoModel::None.bias_m(&runtime(1575.42E6)), 0.0);
    }

    #[test]
    fn klobuchar_l1_magnitude() {
        // daytime mid latitude L1 delay lies within a few meters
        let delay = IonoModel::Klobuchar(kb_model()).bias_m(&runtime(1575.42E6));
        assert!(delay > 0.5 && delay < 30.0, "L1 delay {}", delay);
    }

    #[test]
    fn layer_height_shapes_geometry() {
        let rtm = runtime(1575.42E6);

        let low = IonoModel::Klobuchar(KbModel {
            h_km: 250.0,
            ..kb_model()
        })
        .bias_m(&rtm);

        let high = IonoModel::Klobuchar(KbModel {
            h_km: 450.0,
            ..kb_model()
        })
        .bias_m(&rtm);

        // pierce point and obliquity both follow the layer height
        assert!(low > 0.0 && high > 0.0);
        assert!(low != high);
    }

    #[test]
    fn frequency_rescaling() {
        let model = IonoModel::Klobuchar(kb_model());
        let l1 = model.bias_m(&runtime(Carrier::L1.frequency_hz()));
        let l5 = model.bias_m(&runtime(Carrier::L5.frequency_hz()));

        let gamma = (Carrier::L1.frequency_hz() / Carrier::L5.frequency_hz()).powi(2);
        assert!((l5 - gamma * l1).abs() < 1.0E-9);
    }
}
