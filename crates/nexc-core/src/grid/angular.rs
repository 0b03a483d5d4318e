//! Angular sphere rule.
//!
//! Product quadrature on the unit sphere: Gauss-Legendre in cos(theta)
//! crossed with a uniform trapezoid rule in phi. An order-n rule uses n
//! polar points and 2n azimuthal points and integrates spherical harmonics
//! exactly up to degree 2n - 1. Weights sum to 4*pi.

use nalgebra::Vector3;
use std::f64::consts::PI;

/// Unit directions and weights of the order-`n` sphere rule.
pub fn sphere_rule(order: usize) -> Vec<(Vector3<f64>, f64)> {
    let n_phi = 2 * order;
    let (u, wu) = gauss_legendre(order);
    let phi_weight = 2.0 * PI / n_phi as f64;

    let mut points = Vec::with_capacity(order * n_phi);
    for (cos_theta, w_theta) in u.into_iter().zip(wu) {
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        for k in 0..n_phi {
            let phi = phi_weight * k as f64;
            let dir = Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
            points.push((dir, w_theta * phi_weight));
        }
    }
    points
}

/// Gauss-Legendre nodes and weights on [-1, 1].
///
/// Newton iteration on the Legendre recurrence, numerical-recipes style.
fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let m = n.div_ceil(2);
    let mut x = vec![0.0_f64; n];
    let mut w = vec![0.0_f64; n];

    let eps = 1e-14;
    let nn = n as f64;
    for i in 0..m {
        let mut z = (PI * (i as f64 + 0.75) / (nn + 0.5)).cos();
        loop {
            let (p1, p2) = legendre_pn(n, z);
            let pp = nn * (z * p1 - p2) / (z * z - 1.0);
            let z1 = z;
            z -= p1 / pp;
            if (z - z1).abs() < eps {
                x[i] = -z;
                x[n - 1 - i] = z;
                let wi = 2.0 / ((1.0 - z * z) * pp * pp);
                w[i] = wi;
                w[n - 1 - i] = wi;
                break;
            }
        }
    }
    (x, w)
}

/// Returns (P_n(z), P_{n-1}(z)).
fn legendre_pn(n: usize, z: f64) -> (f64, f64) {
    let mut p1 = 1.0;
    let mut p2 = 0.0;
    for j in 1..=n {
        let p3 = p2;
        p2 = p1;
        p1 = ((2.0 * j as f64 - 1.0) * z * p2 - (j as f64 - 1.0) * p3) / j as f64;
    }
    (p1, p2)
}
