//! Radial quadrature maps.
//!
//! Each family maps a finite base rule onto (0, inf) and folds the map
//! Jacobian into the returned weights. The r^2 volume Jacobian is applied
//! later, at grid assembly.

use super::spec::RadialQuad;
use std::f64::consts::PI;

/// Nodes and weights of an `n`-point rule for `int_0^inf f(r) dr`,
/// scaled by the atom size parameter `r_m` (Bohr).
pub fn radial_rule(quad: RadialQuad, n: usize, r_m: f64) -> (Vec<f64>, Vec<f64>) {
    match quad {
        RadialQuad::Becke => becke(n, r_m),
        RadialQuad::MuraKnowles => mura_knowles(n, r_m),
        RadialQuad::TreutlerAhlrichs => treutler_ahlrichs(n, r_m),
        RadialQuad::MurrayHandyLaming => murray_handy_laming(n, r_m),
    }
}

/// Chebyshev (second kind) base nodes on (-1, 1), ascending in x.
fn chebyshev2(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut x = Vec::with_capacity(n);
    let mut w = Vec::with_capacity(n);
    for i in (1..=n).rev() {
        let theta = PI * i as f64 / (n + 1) as f64;
        x.push(theta.cos());
        w.push(PI / (n + 1) as f64 * theta.sin() * theta.sin());
    }
    (x, w)
}

/// Becke's map r = r_m (1 + x) / (1 - x) over Chebyshev-2 nodes.
fn becke(n: usize, r_m: f64) -> (Vec<f64>, Vec<f64>) {
    let (xs, ws) = chebyshev2(n);
    let mut r = Vec::with_capacity(n);
    let mut w = Vec::with_capacity(n);
    for (x, wx) in xs.into_iter().zip(ws) {
        let one_minus = 1.0 - x;
        r.push(r_m * (1.0 + x) / one_minus);
        // dr/dx = 2 r_m / (1 - x)^2; the Chebyshev weight already contains
        // the sin^2 measure factor.
        let jac = 2.0 * r_m / (one_minus * one_minus);
        w.push(wx * jac / (1.0 - x * x).sqrt());
    }
    (r, w)
}

/// Mura-Knowles log-cubic map r = -alpha ln(1 - t^3) on uniform t.
fn mura_knowles(n: usize, r_m: f64) -> (Vec<f64>, Vec<f64>) {
    let alpha = 5.2 * r_m.max(0.1);
    let step = 1.0 / (n + 1) as f64;
    let mut r = Vec::with_capacity(n);
    let mut w = Vec::with_capacity(n);
    for i in 1..=n {
        let t = i as f64 * step;
        let t3 = t * t * t;
        r.push(-alpha * (1.0 - t3).ln());
        w.push(alpha * 3.0 * t * t / (1.0 - t3) * step);
    }
    (r, w)
}

/// Treutler-Ahlrichs M4 map over Chebyshev-2 nodes.
fn treutler_ahlrichs(n: usize, r_m: f64) -> (Vec<f64>, Vec<f64>) {
    const EXPONENT: f64 = 0.6;
    let ln2 = std::f64::consts::LN_2;
    let (xs, ws) = chebyshev2(n);
    let mut r = Vec::with_capacity(n);
    let mut w = Vec::with_capacity(n);
    for (x, wx) in xs.into_iter().zip(ws) {
        let one_plus = 1.0 + x;
        let one_minus = 1.0 - x;
        let log_term = (2.0 / one_minus).ln();
        r.push(r_m / ln2 * one_plus.powf(EXPONENT) * log_term);
        let jac = r_m / ln2
            * (EXPONENT * one_plus.powf(EXPONENT - 1.0) * log_term
                + one_plus.powf(EXPONENT) / one_minus);
        w.push(wx * jac / (1.0 - x * x).sqrt());
    }
    (r, w)
}

/// Murray-Handy-Laming map r = r_m (t / (1 - t))^2 on uniform t.
fn murray_handy_laming(n: usize, r_m: f64) -> (Vec<f64>, Vec<f64>) {
    let step = 1.0 / (n + 1) as f64;
    let mut r = Vec::with_capacity(n);
    let mut w = Vec::with_capacity(n);
    for i in 1..=n {
        let t = i as f64 * step;
        let one_minus = 1.0 - t;
        let ratio = t / one_minus;
        r.push(r_m * ratio * ratio);
        w.push(r_m * 2.0 * t / (one_minus * one_minus * one_minus) * step);
    }
    (r, w)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RadialQuad; 4] = [
        RadialQuad::Becke,
        RadialQuad::MuraKnowles,
        RadialQuad::TreutlerAhlrichs,
        RadialQuad::MurrayHandyLaming,
    ];

    #[test]
    fn nodes_are_positive_and_ascending() {
        for quad in ALL {
            let (r, w) = radial_rule(quad, 40, 1.0);
            assert_eq!(r.len(), 40);
            assert_eq!(w.len(), 40);
            assert!(r[0] > 0.0, "{quad:?}");
            for pair in r.windows(2) {
                assert!(pair[1] > pair[0], "{quad:?} nodes not ascending");
            }
            assert!(w.iter().all(|&wi| wi > 0.0), "{quad:?}");
        }
    }

    #[test]
    fn every_family_integrates_a_gaussian_shell() {
        // int_0^inf r^2 exp(-r^2) dr = sqrt(pi) / 4
        let exact = std::f64::consts::PI.sqrt() / 4.0;
        for quad in ALL {
            let (r, w) = radial_rule(quad, 80, 1.0);
            let approx: f64 = r
                .iter()
                .zip(&w)
                .map(|(&ri, &wi)| wi * ri * ri * (-ri * ri).exp())
                .sum();
            assert!(
                (approx - exact).abs() < 1e-4,
                "{quad:?}: {approx} vs {exact}"
            );
        }
    }
}
