//! Basis-function values and gradients on grid points.
//!
//! Evaluates contracted Gaussians for s, p, and d shells (cartesian and
//! pure d) with per-shell distance screening. Rows are basis functions in
//! shell order, columns are points in batch order.

use crate::core::models::basis::{BasisSet, Shell};
use crate::grid::molgrid::GridPoint;
use ndarray::Array2;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollocationError {
    #[error("shells with angular momentum {l} are not supported (max: 2)")]
    UnsupportedShell { l: u32 },
}

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// AO values and Cartesian derivatives for one batch of points.
#[derive(Debug, Clone)]
pub struct Collocation {
    /// phi[(i, g)] = phi_i(r_g), shape (n_basis, n_points).
    pub phi: Array2<f64>,
    /// grad[d][(i, g)] = d phi_i / d r_d at r_g.
    pub grad: [Array2<f64>; 3],
}

pub fn evaluate(basis: &BasisSet, points: &[GridPoint]) -> Result<Collocation, CollocationError> {
    for shell in basis.shells() {
        if shell.l > 2 {
            return Err(CollocationError::UnsupportedShell { l: shell.l });
        }
    }

    let n_basis = basis.num_functions();
    let n_points = points.len();
    let mut phi = Array2::zeros((n_basis, n_points));
    let mut grad = [
        Array2::zeros((n_basis, n_points)),
        Array2::zeros((n_basis, n_points)),
        Array2::zeros((n_basis, n_points)),
    ];

    let mut row = 0;
    for shell in basis.shells() {
        for (col, point) in points.iter().enumerate() {
            let d = point.position - shell.origin;
            let r2 = d.norm_squared();
            if r2.sqrt() > shell.cutoff_radius() {
                continue;
            }

            // Contracted radial part and its exponent-weighted companion:
            // grad(c e^(-a r^2)) = -2 a c e^(-a r^2) * d.
            let mut radial = 0.0;
            let mut radial1 = 0.0;
            for (&alpha, &coeff) in shell.exponents.iter().zip(&shell.coefficients) {
                let g = coeff * (-alpha * r2).exp();
                radial += g;
                radial1 += -2.0 * alpha * g;
            }

            write_shell(shell, row, col, d.into(), radial, radial1, &mut phi, &mut grad);
        }
        row += shell.num_functions();
    }

    Ok(Collocation { phi, grad })
}

#[allow(clippy::too_many_arguments)]
fn write_shell(
    shell: &Shell,
    row: usize,
    col: usize,
    d: [f64; 3],
    radial: f64,
    radial1: f64,
    phi: &mut Array2<f64>,
    grad: &mut [Array2<f64>; 3],
) {
    let mut emit = |offset: usize, poly: f64, dpoly: [f64; 3]| {
        phi[(row + offset, col)] = poly * radial;
        for k in 0..3 {
            grad[k][(row + offset, col)] = dpoly[k] * radial + poly * radial1 * d[k];
        }
    };

    let [x, y, z] = d;
    match (shell.l, shell.pure) {
        (0, _) => emit(0, 1.0, [0.0, 0.0, 0.0]),
        (1, _) => {
            emit(0, x, [1.0, 0.0, 0.0]);
            emit(1, y, [0.0, 1.0, 0.0]);
            emit(2, z, [0.0, 0.0, 1.0]);
        }
        (2, false) => {
            // Cartesian order: xx, xy, xz, yy, yz, zz.
            emit(0, x * x, [2.0 * x, 0.0, 0.0]);
            emit(1, x * y, [y, x, 0.0]);
            emit(2, x * z, [z, 0.0, x]);
            emit(3, y * y, [0.0, 2.0 * y, 0.0]);
            emit(4, y * z, [0.0, z, y]);
            emit(5, z * z, [0.0, 0.0, 2.0 * z]);
        }
        (2, true) => {
            // Real solid harmonics, m = -2..2.
            emit(0, SQRT_3 * x * y, [SQRT_3 * y, SQRT_3 * x, 0.0]);
            emit(1, SQRT_3 * y * z, [0.0, SQRT_3 * z, SQRT_3 * y]);
            emit(
                2,
                z * z - 0.5 * (x * x + y * y),
                [-x, -y, 2.0 * z],
            );
            emit(3, SQRT_3 * x * z, [SQRT_3 * z, 0.0, SQRT_3 * x]);
            emit(
                4,
                0.5 * SQRT_3 * (x * x - y * y),
                [SQRT_3 * x, -SQRT_3 * y, 0.0],
            );
        }
        // Guarded by the scan in `evaluate`.
        _ => unreachable!("unsupported shell reached evaluation"),
    }
}
