//! Shared fixtures and end to end pipeline tests. The G01 frame and its
//! reference orbit come from a 2022-01-01 broadcast navigation message.
use std::sync::Once;

use crate::prelude::*;

static INIT: Once = Once::new();

pub(crate) fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub(crate) fn gps_sv(prn: u8) -> SV {
    SV::new(Constellation::GPS, prn)
}

/// G01 navigation frame, 2022-01-01 00:00:00 GPST (week 2190, tow 518400).
pub(crate) fn g01_keplerian() -> KeplerianEphemeris {
    let toe = Epoch::from_time_of_week(2190, 518_400_000_000_000, TimeScale::GPST);

    KeplerianEphemeris {
        sv: gps_sv(1),
        toe,
        toc: toe,
        semi_major_axis_m: 5153.674995422_f64.powi(2),
        eccentricity: 1.121813920327E-2,
        m0_rad: -6.242942382352E-1,
        i0_rad: 9.864187694897E-1,
        idot_rad_s: -3.778728827795E-10,
        dn_rad_s: 3.988380417768E-9,
        omega0_rad: -1.036611240093,
        omega_rad: 8.840876015687E-1,
        omega_dot_rad_s: -8.133553080847E-9,
        cus_cuc_rad: (4.695728421211E-6, -7.363036274910E-6),
        cis_cic_rad: (1.955777406693E-7, -3.166496753693E-8),
        crs_crc_m: (-141.125, 299.75),
        clock_poly: (4.691267386079E-4, -1.000444171950E-11, 0.0),
        tgd: 5.122274160385E-9 * Unit::Second,
    }
}

pub(crate) fn g01_store() -> EphemerisStore {
    let mut store = EphemerisStore::new(EphemerisSelectionPolicy::Closest, 900.0);
    store
        .add(EphemerisRecord::Keplerian(g01_keplerian()))
        .unwrap();
    store
}

/// Toulouse (TLSE) station, ECEF meters.
pub(crate) fn tlse_rx_ecef_m() -> Vector3<f64> {
    Vector3::new(4627852.0, 119640.0, 4372994.0)
}

mod pipeline {
    use super::*;
    use crate::constants::SPEED_OF_LIGHT_M_S;
    use std::sync::atomic::AtomicBool;

    fn engine() -> CorrectionEngine {
        CorrectionEngine::new(Config::default(), g01_store(), Some(tlse_rx_ecef_m())).unwrap()
    }

    #[test]
    fn full_pipeline() {
        init_logger();

        let engine = engine();
        let cancel = AtomicBool::new(false);

        let t0 = Epoch::from_gregorian(2022, 1, 1, 0, 30, 0, 0, TimeScale::GPST);
        let mut observations = Vec::new();

        for minutes in [0.0, 1.0, 2.0] {
            let t = t0 + minutes * Unit::Minute;
            observations.push(ObservationRecord::pseudo_range(
                gps_sv(1),
                Carrier::L1,
                t,
                23.0E6,
            ));
            observations.push(ObservationRecord::pseudo_range(
                gps_sv(1),
                Carrier::L2,
                t,
                23.0E6,
            ));
        }

        let run = engine.run(observations, &cancel).unwrap();

        assert!(run.complete);
        assert!(run.rejections.is_empty());
        assert_eq!(run.observables.len(), 6);

        for corrected in &run.observables {
            // G01 a0 is +469 µs: the clock term dominates at roughly +140 km
            let total_m = corrected.corrected_pseudo_range_m - corrected.raw_pseudo_range_m;
            assert!(
                (total_m - 140.0E3).abs() < 1.0E3,
                "unexpected total correction {:.1} m",
                total_m,
            );

            // MEO geometry from a mid latitude station
            assert!(corrected.components.sagnac_m.abs() < 50.0);
            assert!(corrected.sv_elevation_azimuth_deg_deg.is_some());
            assert!(corrected.tx_epoch < corrected.epoch);

            // no atmosphere model selected
            assert_eq!(corrected.components.tropo_m, 0.0);
            assert_eq!(corrected.components.iono_m, 0.0);
        }
    }

    #[test]
    fn tagged_seconds_entry() {
        init_logger();

        let engine = engine();
        let t = Epoch::from_gregorian(2022, 1, 1, 1, 0, 0, 0, TimeScale::GPST);

        // same instant, entered as a raw clock reading in the
        // constellation timescale
        let scale = constellation_timescale(Constellation::GPS).unwrap();
        assert_eq!(scale, GnssTimeScale::GPST);

        let t_gpst_s = engine.time_shift().scale_seconds(t, scale).unwrap();

        let tagged = ObservationRecord::pseudo_range_tagged_seconds(
            gps_sv(1),
            Carrier::L1,
            t_gpst_s,
            scale,
            engine.time_shift(),
            23.0E6,
        )
        .unwrap();

        assert!((tagged.epoch - t).abs() < 1.0 * Unit::Microsecond);

        let direct = ObservationRecord::pseudo_range(gps_sv(1), Carrier::L1, t, 23.0E6);

        let from_tagged = engine.correct(&tagged).unwrap();
        let from_direct = engine.correct(&direct).unwrap();

        assert!(
            (from_tagged.corrected_pseudo_range_m - from_direct.corrected_pseudo_range_m).abs()
                < 1.0E-3,
        );
    }

    #[test]
    fn glonass_precise_entry() {
        init_logger();

        // R01 broadcast clock convention is -TauN + GammaN·dt: here a
        // constant offset over the arc, zero rate
        const R01_CLOCK_OFFSET_S: f64 = 7.305294275284E-6;

        let r01 = SV::new(Constellation::Glonass, 1);
        let t0 = Epoch::from_gregorian(2022, 1, 1, 0, 0, 0, 0, TimeScale::UTC);

        // circular MEO track at the Glonass radius, sampled every 15'
        let radius_m = 25_508.0E3;
        let rate_rad_s = 2.0 * std::f64::consts::PI / 40_544.0;

        let mut store = EphemerisStore::new(EphemerisSelectionPolicy::Closest, 900.0);

        for i in 0..16 {
            let dt_s = (i as f64) * 900.0;
            let theta = rate_rad_s * dt_s;

            store
                .add(EphemerisRecord::Precise(PreciseEphemeris {
                    sv: r01,
                    epoch: t0 + dt_s * Unit::Second,
                    position_ecef_m: Vector3::new(
                        radius_m * theta.cos(),
                        radius_m * theta.sin(),
                        0.0,
                    ),
                    clock_bias_s: R01_CLOCK_OFFSET_S,
                    clock_drift_s_s: None,
                }))
                .unwrap();
        }

        let engine =
            CorrectionEngine::new(Config::default(), store, Some(tlse_rx_ecef_m())).unwrap();

        // mid arc, in between two samples
        let t = t0 + (7.0 * 900.0 + 450.0) * Unit::Second;
        let observations = vec![ObservationRecord::pseudo_range(
            r01,
            Carrier::G1(1),
            t,
            21.0E6,
        )];

        let cancel = AtomicBool::new(false);
        let run = engine.run(observations, &cancel).unwrap();

        assert!(run.complete);
        assert!(run.rejections.is_empty(), "{:?}", run.rejections);
        assert_eq!(run.observables.len(), 1);

        let corrected = &run.observables[0];

        // clock component reproduces the broadcast offset, in meters
        let expected_m = SPEED_OF_LIGHT_M_S * R01_CLOCK_OFFSET_S;
        assert!(
            (corrected.components.sv_clock_m - expected_m).abs() < 1.0E-6,
            "sv clock {} m vs {} m",
            corrected.components.sv_clock_m,
            expected_m,
        );

        // constant offset: zero rate
        assert_eq!(corrected.sv_clock_drift_mps, 0.0);

        // no broadcast group delay on the precise path
        assert_eq!(corrected.components.group_delay_m, 0.0);
        assert!(corrected.tx_epoch < corrected.epoch);
    }

    #[test]
    fn relativistic_term_magnitude() {
        init_logger();

        let engine = engine();
        let t = Epoch::from_gregorian(2022, 1, 1, 1, 0, 0, 0, TimeScale::GPST);
        let obs = ObservationRecord::pseudo_range(gps_sv(1), Carrier::L1, t, 23.0E6);

        let corrected = engine.correct(&obs).unwrap();

        // |dtr| <= 2·F·e·√a bound, in meters
        let bound_m = SPEED_OF_LIGHT_M_S
            * 2.0
            * 4.442807633E-10
            * 1.121813920327E-2
            * 5153.674995422;
        assert!(corrected.components.relativistic_m.abs() <= bound_m);
        assert!(corrected.components.relativistic_m != 0.0);
    }
}
