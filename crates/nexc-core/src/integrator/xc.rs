//! Exchange-correlation integration.
//!
//! Per batch: collocate the basis, derive the density features the model
//! declares, evaluate the model, and (for potentials) backpropagate the
//! weighted energy sum to the features and contract the gradients back to
//! AO matrices. All differentiation happens inside libtorch; this module
//! only assembles inputs and contracts outputs.

use super::balance::{BalanceError, LoadBalancer};
use super::collocation::{self, Collocation, CollocationError};
use crate::core::models::{BasisSet, DensityPair, Molecule};
use crate::functional::features::Feature;
use crate::functional::model::{ExcModel, ModelError};
use crate::grid::molgrid::{GridPoint, MolGrid};
use ndarray::{Array1, Array2};
use tch::{Device, Kind, Tensor};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IntegrateError {
    #[error("density dimension {density} does not match basis dimension {basis}")]
    DimensionMismatch { density: usize, basis: usize },

    #[error(transparent)]
    Collocation(#[from] CollocationError),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("torch error: {0}")]
    Torch(#[from] tch::TchError),
}

/// Result of one exchange-correlation integration.
#[derive(Debug)]
pub struct XcOutput {
    pub exc: f64,
    pub vxc_scalar: Array2<f64>,
    pub vxc_z: Array2<f64>,
}

pub struct XcIntegrator<'a, M: ExcModel> {
    molecule: &'a Molecule,
    basis: &'a BasisSet,
    grid: &'a MolGrid,
    model: &'a M,
    device: Device,
    balancer: LoadBalancer,
}

impl<'a, M: ExcModel> XcIntegrator<'a, M> {
    pub fn new(
        molecule: &'a Molecule,
        basis: &'a BasisSet,
        grid: &'a MolGrid,
        model: &'a M,
        device: Device,
        balancer: LoadBalancer,
    ) -> Self {
        Self {
            molecule,
            basis,
            grid,
            model,
            device,
            balancer,
        }
    }

    /// Per-point energy density over this rank's grid points, in grid order.
    pub fn eval_exc(&self, density: &DensityPair) -> Result<Tensor, IntegrateError> {
        self.check_dimensions(density)?;
        let (p_alpha, p_beta) = density.spin_channels();

        let mut outputs = Vec::new();
        for (_, batch) in self.balancer.local_batches(self.grid) {
            let colloc = collocation::evaluate(self.basis, batch)?;
            let features = self.assemble(batch, &colloc, &p_alpha, &p_beta, false);
            let exc = self.model.exc_density(&features.inputs)?;
            outputs.push(exc.reshape([-1]));
        }
        if outputs.is_empty() {
            // A rank can own zero batches when there are more ranks than batches.
            return Ok(Tensor::from_slice::<f64>(&[]).to_device(self.device));
        }
        Ok(Tensor::cat(&outputs, 0))
    }

    /// Integrated energy and both potential matrices.
    ///
    /// In multi-rank runs each rank returns partial sums over its batches;
    /// reduction across ranks is the caller's responsibility.
    pub fn eval_exc_vxc(&self, density: &DensityPair) -> Result<XcOutput, IntegrateError> {
        self.check_dimensions(density)?;
        let n_basis = self.basis.num_functions();
        let (p_alpha, p_beta) = density.spin_channels();

        let mut exc_total = 0.0;
        let mut vxc_alpha: Array2<f64> = Array2::zeros((n_basis, n_basis));
        let mut vxc_beta: Array2<f64> = Array2::zeros((n_basis, n_basis));

        for (index, batch) in self.balancer.local_batches(self.grid) {
            let colloc = collocation::evaluate(self.basis, batch)?;
            let features = self.assemble(batch, &colloc, &p_alpha, &p_beta, true);

            let exc_on_grid = self.model.exc_density(&features.inputs)?.reshape([-1]);
            let weights: Vec<f64> = batch.iter().map(|p| p.weight).collect();
            let weight_tensor = Tensor::from_slice(&weights).to_device(self.device);
            let exc_batch = (&exc_on_grid * &weight_tensor).sum(None::<Kind>);
            exc_total += exc_batch.double_value(&[]);

            if features.diff.is_empty() {
                continue;
            }
            let leaves: Vec<Tensor> = features
                .diff
                .iter()
                .map(|(_, t)| t.shallow_clone())
                .collect();
            let grads = Tensor::run_backward(&[&exc_batch], &leaves, false, false);

            for ((feature, leaf), grad) in features.diff.iter().zip(grads) {
                let grad = if grad.defined() {
                    grad
                } else {
                    leaf.zeros_like()
                };
                self.contract(
                    *feature,
                    &grad,
                    &colloc,
                    batch.len(),
                    &mut vxc_alpha,
                    &mut vxc_beta,
                )?;
            }
            debug!(batch = index, points = batch.len(), "integrated batch");
        }

        // Back from spin channels to the (scalar, z) convention:
        // P_sigma = (P_s +/- P_z) / 2.
        let vxc_scalar = (&vxc_alpha + &vxc_beta) * 0.5;
        let vxc_z = (&vxc_alpha - &vxc_beta) * 0.5;
        Ok(XcOutput {
            exc: exc_total,
            vxc_scalar,
            vxc_z,
        })
    }

    fn check_dimensions(&self, density: &DensityPair) -> Result<(), IntegrateError> {
        let n_basis = self.basis.num_functions();
        if density.dim() != n_basis {
            return Err(IntegrateError::DimensionMismatch {
                density: density.dim(),
                basis: n_basis,
            });
        }
        Ok(())
    }

    /// Build the model's declared feature tensors for one batch.
    fn assemble(
        &self,
        batch: &[GridPoint],
        colloc: &Collocation,
        p_alpha: &Array2<f64>,
        p_beta: &Array2<f64>,
        with_grad: bool,
    ) -> BatchFeatures {
        let n = batch.len() as i64;
        let mut features = BatchFeatures::default();

        for &feature in self.model.features() {
            let tensor = match feature {
                Feature::Density => {
                    let mut data = density_on_grid(p_alpha, colloc);
                    data.extend(density_on_grid(p_beta, colloc));
                    Tensor::from_slice(&data).reshape([2, n])
                }
                Feature::Grad => {
                    let mut data = Vec::with_capacity(6 * batch.len());
                    for p in [p_alpha, p_beta] {
                        let t = p.dot(&colloc.phi);
                        for d in 0..3 {
                            let component = (&colloc.grad[d] * &t).sum_axis(ndarray::Axis(0)) * 2.0;
                            data.extend(component.iter());
                        }
                    }
                    Tensor::from_slice(&data).reshape([2, 3, n])
                }
                Feature::Kin => {
                    let mut data = Vec::with_capacity(2 * batch.len());
                    for p in [p_alpha, p_beta] {
                        let mut tau = Array1::<f64>::zeros(batch.len());
                        for d in 0..3 {
                            let u = p.dot(&colloc.grad[d]);
                            tau = tau + (&colloc.grad[d] * &u).sum_axis(ndarray::Axis(0)) * 0.5;
                        }
                        data.extend(tau.iter());
                    }
                    Tensor::from_slice(&data).reshape([2, n])
                }
                Feature::GridCoords => {
                    let mut data = Vec::with_capacity(3 * batch.len());
                    for p in batch {
                        data.extend([p.position.x, p.position.y, p.position.z]);
                    }
                    Tensor::from_slice(&data).reshape([n, 3])
                }
                Feature::GridWeights => {
                    let data: Vec<f64> = batch.iter().map(|p| p.weight).collect();
                    Tensor::from_slice(&data)
                }
                Feature::Coarse0AtomicCoords => {
                    let mut data = Vec::with_capacity(3 * self.molecule.len());
                    for atom in self.molecule.atoms() {
                        data.extend([atom.position.x, atom.position.y, atom.position.z]);
                    }
                    Tensor::from_slice(&data).reshape([self.molecule.len() as i64, 3])
                }
            };
            let mut tensor = tensor.to_device(self.device);

            let differentiable = matches!(feature, Feature::Density | Feature::Grad | Feature::Kin);
            if with_grad && differentiable {
                tensor = tensor.set_requires_grad(true);
                features.diff.push((feature, tensor.shallow_clone()));
            }
            features
                .inputs
                .push((feature.name().to_string(), tensor));
        }
        features
    }

    /// Fold one feature gradient into the spin-channel AO accumulators.
    fn contract(
        &self,
        feature: Feature,
        grad: &Tensor,
        colloc: &Collocation,
        n_points: usize,
        vxc_alpha: &mut Array2<f64>,
        vxc_beta: &mut Array2<f64>,
    ) -> Result<(), IntegrateError> {
        let values = tensor_to_vec(grad)?;
        match feature {
            Feature::Density => {
                // d rho / d P_ij = phi_i phi_j
                for (spin, vxc) in [(0, &mut *vxc_alpha), (1, &mut *vxc_beta)] {
                    let row = Array1::from(values[spin * n_points..(spin + 1) * n_points].to_vec());
                    let scaled = &colloc.phi * &row;
                    *vxc += &scaled.dot(&colloc.phi.t());
                }
            }
            Feature::Grad => {
                // d (grad rho)_d / d P_ij = phi_i dphi_j + dphi_i phi_j
                for (spin, vxc) in [(0, &mut *vxc_alpha), (1, &mut *vxc_beta)] {
                    for d in 0..3 {
                        let offset = (spin * 3 + d) * n_points;
                        let row = Array1::from(values[offset..offset + n_points].to_vec());
                        let half = (&colloc.phi * &row).dot(&colloc.grad[d].t());
                        *vxc += &half;
                        *vxc += &half.t();
                    }
                }
            }
            Feature::Kin => {
                // d tau / d P_ij = (dphi_i . dphi_j) / 2
                for (spin, vxc) in [(0, &mut *vxc_alpha), (1, &mut *vxc_beta)] {
                    let row = Array1::from(values[spin * n_points..(spin + 1) * n_points].to_vec());
                    for d in 0..3 {
                        let term = (&colloc.grad[d] * &row).dot(&colloc.grad[d].t()) * 0.5;
                        *vxc += &term;
                    }
                }
            }
            // Geometry features carry no density dependence.
            Feature::GridCoords | Feature::GridWeights | Feature::Coarse0AtomicCoords => {}
        }
        Ok(())
    }
}

#[derive(Default)]
struct BatchFeatures {
    inputs: Vec<(String, Tensor)>,
    diff: Vec<(Feature, Tensor)>,
}

/// rho(g) = sum_ij P_ij phi_i(g) phi_j(g).
fn density_on_grid(p: &Array2<f64>, colloc: &Collocation) -> Vec<f64> {
    let t = p.dot(&colloc.phi);
    (&colloc.phi * &t)
        .sum_axis(ndarray::Axis(0))
        .to_vec()
}

fn tensor_to_vec(t: &Tensor) -> Result<Vec<f64>, IntegrateError> {
    let flat = t
        .to_device(Device::Cpu)
        .to_kind(Kind::Double)
        .contiguous()
        .view([-1]);
    Ok(Vec::<f64>::try_from(&flat)?)
}
