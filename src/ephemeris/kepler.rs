use log::{debug, error};
use nalgebra::{Rotation3, SMatrix, Vector3, Vector4};

use crate::{
    cfg::Config,
    constants::{
        EARTH_ANGULAR_VEL_RAD_S, EARTH_GRAVITATION_MU_M3_S2, RELATIVISTIC_CLOCK_F_S_SQRT_M,
    },
    ephemeris::KeplerianEphemeris,
    error::Error,
    orbit::SatelliteState,
    prelude::Epoch,
};

impl KeplerianEphemeris {
    /// Returns toe in seconds of week, in the constellation timescale.
    pub(crate) fn weekly_toe_seconds(&self) -> f64 {
        (self.toe.to_time_of_week().1 as f64) / 1.0E9
    }
}

/// Propagates a broadcast Keplerian frame to the target [Epoch]:
/// ECEF position and velocity, onboard clock offset and drift, and the
/// relativistic clock term, evaluated separately.
/// Pure function of its inputs: identical inputs reproduce the exact
/// same state.
pub(crate) fn propagate(
    eph: &KeplerianEphemeris,
    t: Epoch,
    cfg: &Config,
) -> Result<SatelliteState, Error> {
    let timescale = eph
        .sv
        .constellation
        .timescale()
        .ok_or_else(|| Error::UnknownTimeScale(eph.sv.constellation.to_string()))?;

    let t = t.to_time_scale(timescale);
    let t_k = (t - eph.toe).to_seconds();

    let e = eph.eccentricity;
    let a = eph.semi_major_axis_m;
    let sqrt_a = a.sqrt();

    let (cus, cuc) = eph.cus_cuc_rad;
    let (cis, cic) = eph.cis_cic_rad;
    let (crs, crc) = eph.crs_crc_m;
    let (i0, idot) = (eph.i0_rad, eph.idot_rad_s);
    let (omega0, omega, omega_dot) = (eph.omega0_rad, eph.omega_rad, eph.omega_dot_rad_s);

    let n0 = (EARTH_GRAVITATION_MU_M3_S2 / a.powi(3)).sqrt();
    let n = n0 + eph.dn_rad_s;
    let m_k = eph.m0_rad + n * t_k;

    // eccentric anomaly, fixed point iteration
    let mut e_k = m_k;
    let mut iter = 0;

    loop {
        let next = m_k + e * e_k.sin();

        if (next - e_k).abs() < cfg.kepler_tolerance_rad {
            e_k = next;
            break;
        }

        e_k = next;
        iter += 1;

        if iter >= cfg.kepler_max_iterations {
            error!("{}({}) - kepler solver non convergence", t, eph.sv);
            return Err(Error::KeplerNonConvergence);
        }
    }

    let (sin_e_k, cos_e_k) = e_k.sin_cos();

    // true anomaly
    let v_k = ((1.0 - e.powi(2)).sqrt() * sin_e_k).atan2(cos_e_k - e);

    let phi_k = v_k + omega;
    let (sin_2phi_k, cos_2phi_k) = (2.0 * phi_k).sin_cos();

    // corrected argument of latitude, radius and inclination
    let u_k = phi_k + cus * sin_2phi_k + cuc * cos_2phi_k;
    let r_k = a * (1.0 - e * cos_e_k) + crs * sin_2phi_k + crc * cos_2phi_k;
    let i_k = i0 + idot * t_k + cis * sin_2phi_k + cic * cos_2phi_k;

    // ascending node longitude, with Earth rotation secular term
    let omega_k = omega0 + (omega_dot - EARTH_ANGULAR_VEL_RAD_S) * t_k
        - EARTH_ANGULAR_VEL_RAD_S * eph.weekly_toe_seconds();

    // orbital plane position
    let (x, y) = (r_k * u_k.cos(), r_k * u_k.sin());

    let rot_x = Rotation3::from_axis_angle(&Vector3::x_axis(), i_k);
    let rot_z = Rotation3::from_axis_angle(&Vector3::z_axis(), omega_k);
    let position_ecef_m = (rot_z * rot_x) * Vector3::new(x, y, 0.0);

    // first derivatives
    let fd_e_k = n / (1.0 - e * cos_e_k);
    let fd_phi_k = ((1.0 + e) / (1.0 - e)).sqrt()
        * ((v_k / 2.0).cos() / (e_k / 2.0).cos()).powi(2)
        * fd_e_k;

    let fd_u_k = 2.0 * (cus * cos_2phi_k - cuc * sin_2phi_k) * fd_phi_k + fd_phi_k;
    let fd_r_k =
        a * e * sin_e_k * fd_e_k + 2.0 * (crs * cos_2phi_k - crc * sin_2phi_k) * fd_phi_k;
    let fd_i_k = idot + 2.0 * (cis * cos_2phi_k - cic * sin_2phi_k) * fd_phi_k;
    let fd_omega_k = omega_dot - EARTH_ANGULAR_VEL_RAD_S;

    let (sin_u_k, cos_u_k) = u_k.sin_cos();
    let fd_x = fd_r_k * cos_u_k - r_k * fd_u_k * sin_u_k;
    let fd_y = fd_r_k * sin_u_k + r_k * fd_u_k * cos_u_k;

    let (sin_omega_k, cos_omega_k) = omega_k.sin_cos();
    let (sin_i_k, cos_i_k) = i_k.sin_cos();

    // velocity: derivative of the in-plane state through the
    // (node, inclination) rotation
    let mut fd_rot = SMatrix::<f64, 3, 4>::zeros();
    fd_rot[(0, 0)] = cos_omega_k;
    fd_rot[(0, 1)] = -sin_omega_k * cos_i_k;
    fd_rot[(0, 2)] = -(x * sin_omega_k + y * cos_omega_k * cos_i_k);
    fd_rot[(0, 3)] = y * sin_omega_k * sin_i_k;
    fd_rot[(1, 0)] = sin_omega_k;
    fd_rot[(1, 1)] = cos_omega_k * cos_i_k;
    fd_rot[(1, 2)] = x * cos_omega_k - y * sin_omega_k * cos_i_k;
    fd_rot[(1, 3)] = -y * cos_omega_k * sin_i_k;
    fd_rot[(2, 1)] = sin_i_k;
    fd_rot[(2, 3)] = y * cos_i_k;

    let velocity_ecef_m_s = fd_rot * Vector4::new(fd_x, fd_y, fd_omega_k, fd_i_k);

    // onboard clock polynomial, referenced to toc
    let dt_s = (t - eph.toc).to_seconds();
    let (a0, a1, a2) = eph.clock_poly;
    let clock_bias_s = a0 + a1 * dt_s + a2 * dt_s.powi(2);
    let clock_drift_s_s = a1 + 2.0 * a2 * dt_s;

    // relativistic clock term from orbit eccentricity
    let relativistic_clock_s = RELATIVISTIC_CLOCK_F_S_SQRT_M * e * sqrt_a * sin_e_k;

    debug!(
        "{}({}) - kepler propagation x={:.3}m y={:.3}m z={:.3}m t_k={:.1}s",
        t, eph.sv, position_ecef_m[0], position_ecef_m[1], position_ecef_m[2], t_k,
    );

    Ok(SatelliteState {
        sv: eph.sv,
        epoch: t,
        position_ecef_m,
        velocity_ecef_m_s,
        clock_bias_s,
        clock_drift_s_s,
        relativistic_clock_s,
    })
}
