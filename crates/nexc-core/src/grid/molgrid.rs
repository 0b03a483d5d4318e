//! Atom-centered molecular grid.

use super::angular::sphere_rule;
use super::radial::radial_rule;
use super::spec::{GridSize, PruningScheme, RadialQuad};
use crate::core::models::Molecule;
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("cannot build a grid for an empty molecule")]
    EmptyMolecule,

    #[error("batch size must be positive")]
    ZeroBatchSize,
}

/// One quadrature point: owning atom, position (Bohr), combined weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub atom: usize,
    pub position: Point3<f64>,
    pub weight: f64,
}

/// The assembled molecular grid, iterated in fixed-size batches.
#[derive(Debug, Clone)]
pub struct MolGrid {
    points: Vec<GridPoint>,
    batch_size: usize,
}

impl MolGrid {
    /// Build an atom-centered grid: a radial rule scaled by each atom's
    /// Bragg radius, crossed with a (possibly pruned) sphere rule. Weights
    /// carry the full radial x angular x r^2 measure; partition weights are
    /// applied separately.
    pub fn build(
        molecule: &Molecule,
        size: GridSize,
        radial: RadialQuad,
        pruning: PruningScheme,
        batch_size: usize,
    ) -> Result<Self, GridError> {
        if molecule.is_empty() {
            return Err(GridError::EmptyMolecule);
        }
        if batch_size == 0 {
            return Err(GridError::ZeroBatchSize);
        }

        let (n_radial, angular_order) = size.dimensions();
        let mut points = Vec::new();

        for (atom_index, atom) in molecule.atoms().iter().enumerate() {
            let r_m = molecule.bragg_radius(atom_index);
            let (radii, radial_weights) = radial_rule(radial, n_radial, r_m);

            let mut cached_order = usize::MAX;
            let mut sphere = Vec::new();
            for (&r, &w_rad) in radii.iter().zip(&radial_weights) {
                let order = effective_order(pruning, r, r_m, angular_order);
                if order != cached_order {
                    sphere = sphere_rule(order);
                    cached_order = order;
                }
                let shell_weight = w_rad * r * r;
                for &(dir, w_ang) in &sphere {
                    points.push(GridPoint {
                        atom: atom_index,
                        position: atom.position + dir * r,
                        weight: shell_weight * w_ang,
                    });
                }
            }
        }

        Ok(Self { points, batch_size })
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn n_batches(&self) -> usize {
        self.points.len().div_ceil(self.batch_size)
    }

    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [GridPoint] {
        &mut self.points
    }

    /// Batches of at most `batch_size` points, in grid order.
    pub fn batches(&self) -> impl Iterator<Item = &[GridPoint]> {
        self.points.chunks(self.batch_size)
    }
}

/// Angular order after pruning at radius `r` around an atom of size `r_m`.
fn effective_order(scheme: PruningScheme, r: f64, r_m: f64, base: usize) -> usize {
    match scheme {
        PruningScheme::Unpruned => base,
        PruningScheme::Robust => {
            if r < 0.25 * r_m {
                (base / 4).max(4)
            } else if r < 0.5 * r_m {
                (base / 2).max(6)
            } else {
                base
            }
        }
        PruningScheme::Treutler => {
            if r < 0.5 * r_m {
                (base / 2).max(6)
            } else {
                base
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Atom;

    fn helium() -> Molecule {
        Molecule::new(vec![Atom {
            atomic_number: 2,
            position: Point3::new(0.0, 0.0, 0.0),
        }])
    }

    #[test]
    fn empty_molecule_is_rejected() {
        let err = MolGrid::build(
            &Molecule::default(),
            GridSize::Fine,
            RadialQuad::MuraKnowles,
            PruningScheme::Robust,
            512,
        )
        .unwrap_err();
        assert_eq!(err, GridError::EmptyMolecule);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = MolGrid::build(
            &helium(),
            GridSize::Fine,
            RadialQuad::MuraKnowles,
            PruningScheme::Robust,
            0,
        )
        .unwrap_err();
        assert_eq!(err, GridError::ZeroBatchSize);
    }

    #[test]
    fn unpruned_grid_has_expected_point_count() {
        let grid = MolGrid::build(
            &helium(),
            GridSize::Fine,
            RadialQuad::MuraKnowles,
            PruningScheme::Unpruned,
            512,
        )
        .unwrap();
        let (n_radial, order) = GridSize::Fine.dimensions();
        assert_eq!(grid.n_points(), n_radial * order * 2 * order);
    }

    #[test]
    fn pruning_reduces_the_point_count() {
        let build = |scheme| {
            MolGrid::build(
                &helium(),
                GridSize::Fine,
                RadialQuad::MuraKnowles,
                scheme,
                512,
            )
            .unwrap()
            .n_points()
        };
        assert!(build(PruningScheme::Robust) < build(PruningScheme::Unpruned));
        assert!(build(PruningScheme::Treutler) <= build(PruningScheme::Unpruned));
    }

    #[test]
    fn batches_cover_all_points_without_overlap() {
        let grid = MolGrid::build(
            &helium(),
            GridSize::Gm3,
            RadialQuad::Becke,
            PruningScheme::Robust,
            100,
        )
        .unwrap();
        let total: usize = grid.batches().map(<[GridPoint]>::len).sum();
        assert_eq!(total, grid.n_points());
        assert_eq!(grid.n_batches(), grid.n_points().div_ceil(100));
        assert!(grid.batches().all(|b| b.len() <= 100));
    }

    #[test]
    fn grid_integrates_a_gaussian_to_known_volume() {
        // int exp(-|r|^2) d^3r = pi^(3/2)
        let grid = MolGrid::build(
            &helium(),
            GridSize::UltraFine,
            RadialQuad::TreutlerAhlrichs,
            PruningScheme::Unpruned,
            512,
        )
        .unwrap();
        let approx: f64 = grid
            .points()
            .iter()
            .map(|p| {
                let r2 = (p.position - Point3::origin()).norm_squared();
                p.weight * (-r2).exp()
            })
            .sum();
        let exact = std::f64::consts::PI.powf(1.5);
        assert!((approx - exact).abs() / exact < 1e-6, "{approx} vs {exact}");
    }
}
