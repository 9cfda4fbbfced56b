use crate::constants::SPEED_OF_LIGHT_M_S;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Carrier signal, with frequencies from RINEX v3.05.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Carrier {
    /// L1 (GPS/QZSS/SBAS) same frequency as E1 and B1aB1c
    #[default]
    L1,
    /// L2 (GPS/QZSS)
    L2,
    /// L5 (GPS/QZSS/SBAS) same frequency as E5A and B2A
    L5,
    /// L6 (GPS/QZSS) same frequency as E6
    L6,
    /// E1 (Galileo)
    E1,
    /// E5 (Galileo) same frequency as B2
    E5,
    /// E5A (Galileo) same frequency as L5
    E5A,
    /// E5B (Galileo) same frequency as B2iB2b
    E5B,
    /// E6 (Galileo) same frequency as L6
    E6,
    /// B1aB1c (BDS) same frequency as L1
    B1aB1c,
    /// B1I (BDS)
    B1I,
    /// B2I/B2B (BDS) same frequency as E5b
    B2iB2b,
    /// B2 (BDS) same frequency as E5
    B2,
    /// B2A (BDS) same frequency as L5 and E5A
    B2A,
    /// B3 (BDS)
    B3,
    /// G1 (Glonass FDMA), one frequency per channel slot in [-7, +12]
    G1(i8),
    /// G2 (Glonass FDMA), one frequency per channel slot in [-7, +12]
    G2(i8),
    /// G3 (Glonass CDMA)
    G3,
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        match self {
            Self::L1 => write!(f, "L1"),
            Self::L2 => write!(f, "L2"),
            Self::L5 => write!(f, "L5"),
            Self::L6 => write!(f, "L6"),
            Self::E1 => write!(f, "E1"),
            Self::E5 => write!(f, "E5"),
            Self::E5A => write!(f, "E5A"),
            Self::E5B => write!(f, "E5B"),
            Self::E6 => write!(f, "E6"),
            Self::B1I => write!(f, "B1I"),
            Self::B1aB1c => write!(f, "B1A/B1C"),
            Self::B2iB2b => write!(f, "B2I/B2B"),
            Self::B2 => write!(f, "B2"),
            Self::B3 => write!(f, "B3"),
            Self::B2A => write!(f, "B2A"),
            Self::G1(slot) => write!(f, "G1({})", slot),
            Self::G2(slot) => write!(f, "G2({})", slot),
            Self::G3 => write!(f, "G3"),
        }
    }
}

impl Carrier {
    /// Returns carrier frequency in Hertz.
    /// Glonass FDMA signals depend on the vehicle frequency channel.
    pub fn frequency_hz(&self) -> f64 {
        match self {
            Self::L1 | Self::E1 | Self::B1aB1c => 1575.42E6_f64,
            Self::L2 => 1227.60E6_f64,
            Self::L5 | Self::E5A | Self::B2A => 1176.45E6_f64,
            Self::E5 | Self::B2 => 1191.795E6_f64,
            Self::L6 | Self::E6 => 1278.750E6_f64,
            Self::B3 => 1268.52E6_f64,
            Self::E5B | Self::B2iB2b => 1207.14E6_f64,
            Self::B1I => 1561.098E6_f64,
            Self::G1(slot) => (1602.0 + (*slot as f64) * 9.0 / 16.0) * 1.0E6,
            Self::G2(slot) => (1246.0 + (*slot as f64) * 7.0 / 16.0) * 1.0E6,
            Self::G3 => 1202.025E6_f64,
        }
    }

    /// Returns carrier wavelength in meters.
    pub fn wavelength_m(&self) -> f64 {
        SPEED_OF_LIGHT_M_S / self.frequency_hz()
    }
}

#[cfg(test)]
mod test {
    use super::Carrier;
    use rstest::*;

    #[rstest]
    #[case(Carrier::G1(0), 1602.0E6)]
    #[case(Carrier::G1(-7), 1598.0625E6)]
    #[case(Carrier::G2(0), 1246.0E6)]
    #[case(Carrier::G2(12), 1251.25E6)]
    fn glonass_fdma_channels(#[case] carrier: Carrier, #[case] freq_hz: f64) {
        assert!((carrier.frequency_hz() - freq_hz).abs() < 1.0E-3);
    }

    #[rstest]
    #[case(Carrier::L1, 0.190293672)]
    #[case(Carrier::L2, 0.244210213)]
    #[case(Carrier::L5, 0.254828049)]
    fn wavelengths(#[case] carrier: Carrier, #[case] lambda_m: f64) {
        assert!((carrier.wavelength_m() - lambda_m).abs() < 1.0E-8);
    }

    #[test]
    fn shared_frequencies() {
        assert_eq!(Carrier::E1.frequency_hz(), Carrier::L1.frequency_hz());
        assert_eq!(Carrier::B2A.frequency_hz(), Carrier::L5.frequency_hz());
        assert_eq!(Carrier::E6.frequency_hz(), Carrier::L6.frequency_hz());
    }
}
