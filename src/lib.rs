#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod bias;
mod carrier;
mod cfg;
mod constants;
mod corrections;
mod ephemeris;
mod error;
mod observation;
mod orbit;
mod pool;
mod time;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::bias::{IonoModel, KbModel, TropoModel};
    pub use crate::carrier::Carrier;
    pub use crate::cfg::{Config, EphemerisSelectionPolicy, Modeling};
    pub use crate::corrections::{CorrectedObservable, CorrectionComponents, CorrectionEngine};
    pub use crate::ephemeris::{
        EphemerisRecord, EphemerisStore, KeplerianEphemeris, PreciseEphemeris,
    };
    pub use crate::observation::ObservationRecord;
    pub use crate::orbit::SatelliteState;
    pub use crate::pool::{Rejection, Run};
    pub use crate::time::{
        constellation_timescale, standard_leap_seconds, GnssTimeScale, LeapSecond,
        StalenessPolicy, TimeShift,
    };
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale, Unit};
    pub use nalgebra::Vector3;
}

// pub export
pub use error::Error;
