//! The complete driver sequence behind one call.

use crate::core::io::{self, IoError};
use crate::core::models::{BasisSet, DensityPair, Molecule};
use crate::functional::hashes;
use crate::functional::model::{ExcModel, Functional, ModelError};
use crate::grid::molgrid::{GridError, MolGrid};
use crate::grid::spec::{ExecutionSpace, GridSize, PruningScheme, RadialQuad};
use crate::grid::weights;
use crate::integrator::balance::{BalanceError, LoadBalancer};
use crate::integrator::xc::{IntegrateError, XcIntegrator};
use ndarray::Array2;
use std::path::PathBuf;
use tch::Device;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Integrate(#[from] IntegrateError),
}

/// Everything the driver needs for one integration.
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub input: PathBuf,
    pub model: PathBuf,
    pub model_hash: Option<String>,
    pub grid_size: GridSize,
    pub radial_quad: RadialQuad,
    pub pruning: PruningScheme,
    pub lb_exec_space: ExecutionSpace,
    pub int_exec_space: ExecutionSpace,
    pub batch_size: usize,
    pub basis_tolerance: f64,
    pub rank: usize,
    pub ranks: usize,
}

impl IntegrationConfig {
    pub fn new(input: PathBuf, model: PathBuf) -> Self {
        Self {
            input,
            model,
            model_hash: None,
            grid_size: GridSize::Fine,
            radial_quad: RadialQuad::MuraKnowles,
            pruning: PruningScheme::Robust,
            lb_exec_space: ExecutionSpace::Host,
            int_exec_space: ExecutionSpace::Host,
            batch_size: 512,
            basis_tolerance: 1e-10,
            rank: 0,
            ranks: 1,
        }
    }
}

/// Result of one integration on this rank. In multi-rank runs the energy
/// and matrices are partial sums awaiting reduction.
#[derive(Debug)]
pub struct IntegrationSummary {
    pub exc: f64,
    pub vxc_scalar: Array2<f64>,
    pub vxc_z: Array2<f64>,
    pub n_points: usize,
    pub n_basis: usize,
}

impl IntegrationSummary {
    pub fn vxc_scalar_norm(&self) -> f64 {
        frobenius_norm(&self.vxc_scalar)
    }

    pub fn vxc_z_norm(&self) -> f64 {
        frobenius_norm(&self.vxc_z)
    }
}

pub fn frobenius_norm(matrix: &Array2<f64>) -> f64 {
    matrix.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Map the requested execution space onto an actually available device.
///
/// `device` silently degrades to host when no CUDA runtime is present,
/// matching a host-only build of the integration stack.
pub fn resolve_device(space: ExecutionSpace) -> Device {
    match space {
        ExecutionSpace::Host => Device::Cpu,
        ExecutionSpace::Device => {
            if tch::Cuda::is_available() {
                Device::Cuda(0)
            } else {
                Device::Cpu
            }
        }
    }
}

/// Read the reference file, build grid and weights, load the functional,
/// and integrate.
pub fn run(config: &IntegrationConfig) -> Result<IntegrationSummary, WorkflowError> {
    let molecule = io::read_molecule(&config.input)?;
    let basis = io::read_basis(&config.input, config.basis_tolerance)?;
    let density = io::read_density(&config.input)?;
    info!(
        atoms = molecule.len(),
        shells = basis.len(),
        n_basis = basis.num_functions(),
        "loaded reference data"
    );

    let mut grid = MolGrid::build(
        &molecule,
        config.grid_size,
        config.radial_quad,
        config.pruning,
        config.batch_size,
    )?;
    weights::apply(&molecule, &mut grid);
    info!(points = grid.n_points(), batches = grid.n_batches(), "built molecular grid");

    let device = resolve_device(config.int_exec_space);
    let expected_hash = config.model_hash.clone().or_else(|| {
        config
            .model
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(hashes::known_hash)
            .map(str::to_string)
    });
    let functional = Functional::load(&config.model, device, expected_hash.as_deref())?;

    let balancer = LoadBalancer::new(config.rank, config.ranks)?;
    integrate_system(
        &molecule,
        &basis,
        &density,
        &grid,
        &functional,
        device,
        balancer,
    )
}

/// Integration over an already-assembled system; the seam used by tests
/// and by callers that supply their own model.
pub fn integrate_system<M: ExcModel>(
    molecule: &Molecule,
    basis: &BasisSet,
    density: &DensityPair,
    grid: &MolGrid,
    model: &M,
    device: Device,
    balancer: LoadBalancer,
) -> Result<IntegrationSummary, WorkflowError> {
    let integrator = XcIntegrator::new(molecule, basis, grid, model, device, balancer);
    let output = integrator.eval_exc_vxc(density)?;
    Ok(IntegrationSummary {
        exc: output.exc,
        vxc_scalar: output.vxc_scalar,
        vxc_z: output.vxc_z,
        n_points: grid.n_points(),
        n_basis: basis.num_functions(),
    })
}
