//! Batch distribution across ranks.
//!
//! Replicated-data load balancing: every rank holds the full grid and takes
//! every `ranks`-th batch. Single-process runs use the default balancer,
//! which owns everything.

use crate::grid::molgrid::{GridPoint, MolGrid};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("rank {rank} is out of range for {ranks} ranks")]
    RankOutOfRange { rank: usize, ranks: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadBalancer {
    rank: usize,
    ranks: usize,
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self { rank: 0, ranks: 1 }
    }
}

impl LoadBalancer {
    pub fn new(rank: usize, ranks: usize) -> Result<Self, BalanceError> {
        if ranks == 0 || rank >= ranks {
            return Err(BalanceError::RankOutOfRange { rank, ranks });
        }
        Ok(Self { rank, ranks })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn ranks(&self) -> usize {
        self.ranks
    }

    /// Whether this rank owns batch `index`.
    pub fn is_local(&self, index: usize) -> bool {
        index % self.ranks == self.rank
    }

    /// This rank's batches, with their global indices.
    pub fn local_batches<'g>(
        &self,
        grid: &'g MolGrid,
    ) -> impl Iterator<Item = (usize, &'g [GridPoint])> {
        let rank = self.rank;
        let ranks = self.ranks;
        grid.batches()
            .enumerate()
            .filter(move |(index, _)| index % ranks == rank)
    }

    /// Number of points owned by this rank.
    pub fn local_points(&self, grid: &MolGrid) -> usize {
        self.local_batches(grid).map(|(_, batch)| batch.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Atom, Molecule};
    use crate::grid::spec::{GridSize, PruningScheme, RadialQuad};
    use nalgebra::Point3;

    fn small_grid() -> MolGrid {
        let molecule = Molecule::new(vec![Atom {
            atomic_number: 1,
            position: Point3::origin(),
        }]);
        MolGrid::build(
            &molecule,
            GridSize::Gm3,
            RadialQuad::MuraKnowles,
            PruningScheme::Robust,
            64,
        )
        .unwrap()
    }

    #[test]
    fn invalid_rank_configurations_are_rejected() {
        assert!(LoadBalancer::new(0, 0).is_err());
        assert!(LoadBalancer::new(2, 2).is_err());
        assert!(LoadBalancer::new(1, 2).is_ok());
    }

    #[test]
    fn default_balancer_owns_every_batch() {
        let grid = small_grid();
        let balancer = LoadBalancer::default();
        assert_eq!(balancer.local_points(&grid), grid.n_points());
    }

    #[test]
    fn ranks_partition_batches_without_overlap() {
        let grid = small_grid();
        let ranks = 3;
        let mut seen = vec![false; grid.n_batches()];
        let mut total = 0;
        for rank in 0..ranks {
            let balancer = LoadBalancer::new(rank, ranks).unwrap();
            for (index, batch) in balancer.local_batches(&grid) {
                assert!(!seen[index], "batch {index} assigned twice");
                seen[index] = true;
                total += batch.len();
            }
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(total, grid.n_points());
    }
}
