//! Coordinated-run plumbing.
//!
//! With the `mpi` feature the driver joins a multi-process run: rank/size
//! come from the world communicator, timing is barrier-synchronized, and
//! per-rank partial results are summed before printing. The default build
//! is a single-process run where all of this degenerates to no-ops.

use crate::error::Result;
use nexc::workflows::IntegrationSummary;

#[cfg(feature = "mpi")]
pub use with_mpi::Runtime;

#[cfg(not(feature = "mpi"))]
pub use without_mpi::Runtime;

#[cfg(feature = "mpi")]
mod with_mpi {
    use super::*;
    use crate::error::CliError;
    use mpi::collective::SystemOperation;
    use mpi::traits::*;

    pub struct Runtime {
        universe: mpi::environment::Universe,
    }

    impl Runtime {
        pub fn init() -> Result<Self> {
            let universe = mpi::initialize()
                .ok_or_else(|| CliError::Runtime("MPI is already initialized".to_string()))?;
            Ok(Self { universe })
        }

        pub fn rank(&self) -> usize {
            self.universe.world().rank() as usize
        }

        pub fn ranks(&self) -> usize {
            self.universe.world().size() as usize
        }

        pub fn barrier(&self) {
            self.universe.world().barrier();
        }

        /// Sum the per-rank partial energy and potential matrices in place.
        pub fn reduce(&self, summary: &mut IntegrationSummary) {
            let world = self.universe.world();

            let mut exc = 0.0;
            world.all_reduce_into(&summary.exc, &mut exc, SystemOperation::sum());
            summary.exc = exc;

            for matrix in [&mut summary.vxc_scalar, &mut summary.vxc_z] {
                let local: Vec<f64> = matrix.iter().copied().collect();
                let mut global = vec![0.0; local.len()];
                world.all_reduce_into(&local[..], &mut global[..], SystemOperation::sum());
                for (target, value) in matrix.iter_mut().zip(global) {
                    *target = value;
                }
            }
        }
    }
}

#[cfg(not(feature = "mpi"))]
mod without_mpi {
    use super::*;

    pub struct Runtime;

    impl Runtime {
        pub fn init() -> Result<Self> {
            Ok(Self)
        }

        pub fn rank(&self) -> usize {
            0
        }

        pub fn ranks(&self) -> usize {
            1
        }

        pub fn barrier(&self) {}

        pub fn reduce(&self, _summary: &mut IntegrationSummary) {}
    }
}
