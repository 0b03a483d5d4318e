//! Becke partition weights.
//!
//! Converts per-atom quadrature weights into molecular weights by scaling
//! each point with its atom's normalized cell function, so overlapping
//! atomic grids do not double count.

use super::molgrid::MolGrid;
use crate::core::models::Molecule;
use nalgebra::Point3;
use tracing::debug;

/// Scale every grid-point weight by its owning atom's Becke cell function.
pub fn apply(molecule: &Molecule, grid: &mut MolGrid) {
    let centers = molecule.positions();
    if centers.len() < 2 {
        return;
    }
    debug!(
        atoms = centers.len(),
        points = grid.n_points(),
        "applying Becke partition weights"
    );
    for point in grid.points_mut() {
        point.weight *= cell_weight(point.atom, &point.position, &centers);
    }
}

/// Normalized Becke cell function of atom `a` at point `r`:
/// w_a = P_a / sum_b P_b with P_i = prod_{j != i} s(mu_ij).
pub fn cell_weight(a: usize, r: &Point3<f64>, centers: &[Point3<f64>]) -> f64 {
    let n = centers.len();
    if n == 1 {
        return 1.0;
    }

    let mut raw = vec![1.0_f64; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                raw[i] *= pair_step(i, j, r, centers);
            }
        }
    }
    let denom: f64 = raw.iter().sum();
    if denom <= 0.0 || !denom.is_finite() {
        return 0.0;
    }
    raw[a] / denom
}

fn pair_step(i: usize, j: usize, r: &Point3<f64>, centers: &[Point3<f64>]) -> f64 {
    let ri = (r - centers[i]).norm();
    let rj = (r - centers[j]).norm();
    let rij = (centers[i] - centers[j]).norm();
    if rij < 1e-12 {
        return 0.5;
    }
    let mut mu = (ri - rj) / rij;
    // Becke's smoothing polynomial, iterated three times.
    for _ in 0..3 {
        mu = 0.5 * mu * (3.0 - mu * mu);
    }
    0.5 * (1.0 - mu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Atom;
    use crate::grid::spec::{GridSize, PruningScheme, RadialQuad};

    fn dimer() -> Molecule {
        Molecule::new(vec![
            Atom {
                atomic_number: 1,
                position: Point3::new(0.0, 0.0, 0.0),
            },
            Atom {
                atomic_number: 1,
                position: Point3::new(0.0, 0.0, 1.4),
            },
        ])
    }

    #[test]
    fn cell_weights_sum_to_one_at_any_point() {
        let centers = dimer().positions();
        for probe in [
            Point3::new(0.0, 0.0, 0.1),
            Point3::new(0.3, -0.2, 0.7),
            Point3::new(0.0, 0.0, 1.3),
            Point3::new(2.0, 2.0, 2.0),
        ] {
            let total: f64 = (0..centers.len())
                .map(|a| cell_weight(a, &probe, &centers))
                .sum();
            assert!((total - 1.0).abs() < 1e-12, "at {probe:?}: {total}");
        }
    }

    #[test]
    fn midpoint_splits_evenly_between_identical_atoms() {
        let centers = dimer().positions();
        let mid = Point3::new(0.0, 0.0, 0.7);
        let w0 = cell_weight(0, &mid, &centers);
        let w1 = cell_weight(1, &mid, &centers);
        assert!((w0 - 0.5).abs() < 1e-12);
        assert!((w1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn partitioned_grid_still_integrates_unity_density() {
        // The partition must not change the integral of a smooth function.
        let molecule = dimer();
        let mut grid = MolGrid::build(
            &molecule,
            GridSize::Fine,
            RadialQuad::TreutlerAhlrichs,
            PruningScheme::Unpruned,
            512,
        )
        .unwrap();
        let gaussian_sum = |grid: &MolGrid| -> f64 {
            grid.points()
                .iter()
                .map(|p| {
                    let r2 = (p.position - Point3::new(0.0, 0.0, 0.7)).norm_squared();
                    p.weight * (-r2).exp()
                })
                .sum()
        };
        apply(&molecule, &mut grid);
        let partitioned = gaussian_sum(&grid);
        let exact = std::f64::consts::PI.powf(1.5);
        assert!(
            (partitioned - exact).abs() / exact < 1e-5,
            "{partitioned} vs {exact}"
        );
    }

    #[test]
    fn single_atom_grids_are_untouched() {
        let molecule = Molecule::new(vec![Atom {
            atomic_number: 10,
            position: Point3::origin(),
        }]);
        let mut grid = MolGrid::build(
            &molecule,
            GridSize::Gm3,
            RadialQuad::MuraKnowles,
            PruningScheme::Robust,
            256,
        )
        .unwrap();
        let before: Vec<f64> = grid.points().iter().map(|p| p.weight).collect();
        apply(&molecule, &mut grid);
        let after: Vec<f64> = grid.points().iter().map(|p| p.weight).collect();
        assert_eq!(before, after);
    }
}
