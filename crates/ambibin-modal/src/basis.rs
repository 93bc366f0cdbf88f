//! Real spherical-harmonic basis values — SN3D normalization, ACN ordering.
//!
//! Ambisonic signals index their channels by the Ambisonic Channel Number:
//! degree-major, with the harmonic index m running from −n to +n within each
//! degree n. Channel `acn = n² + n + m`, and a truncation at order `N` gives
//! `(N + 1)²` channels. SN3D normalization means the omnidirectional channel
//! carries the plain signal (no √2 factor on W).
//!
//! The functions here are pure: identical inputs always produce bit-identical
//! outputs. Both the filter builder and any upstream encoder must agree on
//! this ordering and sign convention, so it is fixed by the tests below.

use nalgebra::DMatrix;

/// Number of harmonic channels at the given Ambisonic order: `(order + 1)²`.
pub fn channel_count(order: usize) -> usize {
    (order + 1) * (order + 1)
}

/// Compute the real SN3D spherical-harmonic basis matrix for a direction set.
///
/// Returns an `N × C` matrix where `N = azimuths.len()` and
/// `C = (order + 1)²`: one row per direction, one column per ACN channel.
/// Azimuths and elevations are in radians; elevation is measured upward from
/// the horizontal plane (colatitude = π/2 − elevation).
///
/// # Panics
///
/// Panics if `azimuths` and `elevations` differ in length.
pub fn compute_basis(order: usize, azimuths: &[f64], elevations: &[f64]) -> DMatrix<f64> {
    assert_eq!(
        azimuths.len(),
        elevations.len(),
        "direction sets must pair one azimuth with one elevation"
    );

    let channels = channel_count(order);
    let mut basis = DMatrix::<f64>::zeros(azimuths.len(), channels);

    for (row, (&azimuth, &elevation)) in azimuths.iter().zip(elevations.iter()).enumerate() {
        // cos(colatitude) = cos(π/2 − elevation) = sin(elevation)
        let x = elevation.sin();
        let mut acn = 0;
        for n in 0..=order {
            for m in -(n as i64)..=(n as i64) {
                basis[(row, acn)] = real_sh(n, m, x, azimuth);
                acn += 1;
            }
        }
    }

    basis
}

/// One real SN3D spherical-harmonic value.
///
/// `x` is the cosine of the colatitude. For m = 0 this is the Legendre
/// polynomial P_n(x); for m ≠ 0 it is the associated Legendre function
/// (without Condon–Shortley phase) scaled by √(2·(n−|m|)!/(n+|m|)!) and a
/// cos(|m|·azimuth) / sin(|m|·azimuth) longitude factor.
fn real_sh(n: usize, m: i64, x: f64, azimuth: f64) -> f64 {
    let m_abs = m.unsigned_abs() as usize;
    let p = assoc_legendre(n, m_abs, x);
    if m == 0 {
        return p;
    }

    let norm = (2.0 * factorial_ratio(n, m_abs)).sqrt();
    let angle = m_abs as f64 * azimuth;
    if m > 0 {
        norm * p * angle.cos()
    } else {
        norm * p * angle.sin()
    }
}

/// Associated Legendre function P_n^m(x) without the Condon–Shortley phase.
///
/// Standard three-step recurrence: seed P_m^m, lift to P_{m+1}^m, then
/// recur upward in degree. Numerically stable for the orders used in
/// Ambisonic work (single digits).
fn assoc_legendre(n: usize, m: usize, x: f64) -> f64 {
    debug_assert!(m <= n);

    // P_m^m(x) = (2m − 1)!! · (1 − x²)^{m/2}
    let mut p_prev = 1.0;
    if m > 0 {
        let sin_theta = ((1.0 - x) * (1.0 + x)).max(0.0).sqrt();
        let mut odd = 1.0;
        for _ in 0..m {
            p_prev *= odd * sin_theta;
            odd += 2.0;
        }
    }
    if n == m {
        return p_prev;
    }

    // P_{m+1}^m(x) = x · (2m + 1) · P_m^m(x)
    let mut p_curr = x * (2.0 * m as f64 + 1.0) * p_prev;
    if n == m + 1 {
        return p_curr;
    }

    // (k − m) · P_k^m = (2k − 1) · x · P_{k−1}^m − (k + m − 1) · P_{k−2}^m
    for k in (m + 2)..=n {
        let kf = k as f64;
        let mf = m as f64;
        let next = ((2.0 * kf - 1.0) * x * p_curr - (kf + mf - 1.0) * p_prev) / (kf - mf);
        p_prev = p_curr;
        p_curr = next;
    }
    p_curr
}

/// (n − m)! / (n + m)! computed as a running product to avoid overflow.
fn factorial_ratio(n: usize, m: usize) -> f64 {
    let mut ratio = 1.0;
    for k in (n - m + 1)..=(n + m) {
        ratio /= k as f64;
    }
    ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const TOL: f64 = 1e-4;

    fn basis_row(order: usize, azimuth: f64, elevation: f64) -> Vec<f64> {
        let basis = compute_basis(order, &[azimuth], &[elevation]);
        basis.row(0).iter().copied().collect()
    }

    #[test]
    fn test_channel_count() {
        assert_eq!(channel_count(0), 1);
        assert_eq!(channel_count(1), 4);
        assert_eq!(channel_count(3), 16);
        assert_eq!(channel_count(7), 64);
    }

    #[test]
    fn test_first_order_front() {
        // Front: W = 1, Y = 0, Z = 0, X = 1 (ACN order W, Y, Z, X).
        let row = basis_row(1, 0.0, 0.0);
        let expected = [1.0, 0.0, 0.0, 1.0];
        for (got, want) in row.iter().zip(expected.iter()) {
            assert!((got - want).abs() < TOL, "got {:?}", row);
        }
    }

    #[test]
    fn test_first_order_left() {
        // Hard left (azimuth +π/2): W = 1, Y = 1, Z = 0, X = 0.
        let row = basis_row(1, FRAC_PI_2, 0.0);
        let expected = [1.0, 1.0, 0.0, 0.0];
        for (got, want) in row.iter().zip(expected.iter()) {
            assert!((got - want).abs() < TOL, "got {:?}", row);
        }
    }

    #[test]
    fn test_first_order_up() {
        // Zenith: W = 1, Y = 0, Z = 1, X = 0.
        let row = basis_row(1, 0.0, FRAC_PI_2);
        let expected = [1.0, 0.0, 1.0, 0.0];
        for (got, want) in row.iter().zip(expected.iter()) {
            assert!((got - want).abs() < TOL, "got {:?}", row);
        }
    }

    #[test]
    fn test_second_order_closed_forms() {
        // Spot-check degree 2 against the closed-form SN3D expressions
        // at a direction away from every axis.
        let az = 0.7;
        let el = 0.3;
        let row = basis_row(2, az, el);

        let s34 = (3.0f64 / 4.0).sqrt();
        assert!((row[4] - s34 * (2.0 * az).sin() * el.cos().powi(2)).abs() < TOL);
        assert!((row[5] - s34 * az.sin() * (2.0 * el).sin()).abs() < TOL);
        assert!((row[6] - 0.5 * (3.0 * el.sin().powi(2) - 1.0)).abs() < TOL);
        assert!((row[7] - s34 * az.cos() * (2.0 * el).sin()).abs() < TOL);
        assert!((row[8] - s34 * (2.0 * az).cos() * el.cos().powi(2)).abs() < TOL);
    }

    #[test]
    fn test_basis_shape() {
        let az = [0.0, 1.0, 2.0, -1.0, PI];
        let el = [0.0, 0.5, -0.5, 1.2, 0.0];
        let basis = compute_basis(3, &az, &el);
        assert_eq!(basis.nrows(), 5);
        assert_eq!(basis.ncols(), 16);
    }

    #[test]
    fn test_determinism_bit_identical() {
        let az = [0.3, -1.7, 2.9];
        let el = [0.1, 0.8, -0.4];
        let a = compute_basis(4, &az, &el);
        let b = compute_basis(4, &az, &el);
        assert_eq!(a, b);
    }

    #[test]
    fn test_legendre_polynomials() {
        // P_2(x) = (3x² − 1) / 2, P_3(x) = (5x³ − 3x) / 2
        for &x in &[-0.9, -0.3, 0.0, 0.4, 1.0] {
            assert!((assoc_legendre(2, 0, x) - 0.5 * (3.0 * x * x - 1.0)).abs() < 1e-12);
            assert!((assoc_legendre(3, 0, x) - 0.5 * (5.0 * x * x * x - 3.0 * x)).abs() < 1e-12);
        }
    }
}
