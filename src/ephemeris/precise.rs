use log::debug;
use nalgebra::Vector3;

use crate::{
    constants::SPEED_OF_LIGHT_M_S,
    ephemeris::PreciseEphemeris,
    error::Error,
    orbit::SatelliteState,
    prelude::Epoch,
};

/// Interpolates precise orbit samples at target [Epoch] with a fixed-order
/// Lagrange polynomial, clock offset with a linear fit between the two
/// bracketing samples. Samples must be sorted by sampling epoch.
/// Fails with [Error::InsufficientSamples] when fewer than (order + 1)
/// position samples surround the target, or when the target is not
/// bracketed by two clock samples.
pub(crate) fn interpolate(
    samples: &[PreciseEphemeris],
    t: Epoch,
    order: usize,
) -> Result<SatelliteState, Error> {
    if samples.len() < order + 1 {
        return Err(Error::InsufficientSamples);
    }

    let sv = samples[0].sv;

    // centered time window around the closest sample
    let center = samples
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            let dt_a = (a.epoch - t).abs();
            let dt_b = (b.epoch - t).abs();
            dt_a.cmp(&dt_b)
        })
        .map(|(idx, _)| idx)
        .ok_or(Error::InsufficientSamples)?;

    let (min_before, min_after) = if order % 2 > 0 {
        ((order + 1) / 2, (order + 1) / 2)
    } else {
        (order / 2, order / 2 + 1)
    };

    if center < min_before || samples.len() - center < min_after {
        debug!("{}({}) - not enough samples around target", t, sv);
        return Err(Error::InsufficientSamples);
    }

    let offset = center - min_before;
    let window = &samples[offset..offset + order + 1];

    // Lagrange basis, value and first derivative
    let mut position_ecef_m = Vector3::<f64>::zeros();
    let mut velocity_ecef_m_s = Vector3::<f64>::zeros();

    for (i, sample_i) in window.iter().enumerate() {
        let mut l_i = 1.0_f64;

        for (j, sample_j) in window.iter().enumerate() {
            if j != i {
                l_i *= (t - sample_j.epoch).to_seconds();
                l_i /= (sample_i.epoch - sample_j.epoch).to_seconds();
            }
        }

        // dL_i/dt = L_i summed over one removed root at a time
        let mut fd_l_i = 0.0_f64;

        for (k, sample_k) in window.iter().enumerate() {
            if k == i {
                continue;
            }

            let mut term = 1.0 / (sample_i.epoch - sample_k.epoch).to_seconds();

            for (j, sample_j) in window.iter().enumerate() {
                if j != i && j != k {
                    term *= (t - sample_j.epoch).to_seconds();
                    term /= (sample_i.epoch - sample_j.epoch).to_seconds();
                }
            }

            fd_l_i += term;
        }

        position_ecef_m += sample_i.position_ecef_m * l_i;
        velocity_ecef_m_s += sample_i.position_ecef_m * fd_l_i;
    }

    // clock: linear between the two bracketing samples
    let before = samples
        .iter()
        .filter(|s| s.epoch <= t)
        .last()
        .ok_or(Error::InsufficientSamples)?;

    let after = samples
        .iter()
        .find(|s| s.epoch > t)
        .or({
            // exact hit on the last sample still brackets
            if before.epoch == t {
                Some(before)
            } else {
                None
            }
        })
        .ok_or(Error::InsufficientSamples)?;

    let (clock_bias_s, clock_drift_s_s) = if before.epoch == after.epoch {
        (
            before.clock_bias_s,
            before.clock_drift_s_s.unwrap_or(0.0),
        )
    } else {
        let dt_s = (after.epoch - before.epoch).to_seconds();
        let w_after = (t - before.epoch).to_seconds() / dt_s;
        let w_before = (after.epoch - t).to_seconds() / dt_s;

        let bias = w_before * before.clock_bias_s + w_after * after.clock_bias_s;
        let drift = match (before.clock_drift_s_s, after.clock_drift_s_s) {
            (Some(b), Some(a)) => w_before * b + w_after * a,
            _ => (after.clock_bias_s - before.clock_bias_s) / dt_s,
        };

        (bias, drift)
    };

    // relativistic clock term from the precise state itself
    let relativistic_clock_s = -2.0 * position_ecef_m.dot(&velocity_ecef_m_s)
        / SPEED_OF_LIGHT_M_S
        / SPEED_OF_LIGHT_M_S;

    Ok(SatelliteState {
        sv,
        epoch: t,
        position_ecef_m,
        velocity_ecef_m_s,
        clock_bias_s,
        clock_drift_s_s,
        relativistic_clock_s,
    })
}
