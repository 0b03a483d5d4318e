//! Closed-form functionals for validating the evaluation pipeline.

use super::features::Feature;
use super::model::{ExcModel, ModelError};
use std::f64::consts::PI;
use tch::Tensor;

/// Spin-resolved Slater exchange, written with differentiable tensor ops:
/// e_x = -(3/4) (6/pi)^(1/3) (rho_a^(4/3) + rho_b^(4/3)).
pub struct SlaterExchange {
    features: Vec<Feature>,
}

impl SlaterExchange {
    pub fn new() -> Self {
        Self {
            features: vec![Feature::Density],
        }
    }

    pub fn prefactor() -> f64 {
        -(3.0 / 4.0) * (6.0 / PI).powf(1.0 / 3.0)
    }
}

impl ExcModel for SlaterExchange {
    fn features(&self) -> &[Feature] {
        &self.features
    }

    fn exc_density(&self, inputs: &[(String, Tensor)]) -> Result<Tensor, ModelError> {
        let (_, density) = inputs
            .iter()
            .find(|(key, _)| key == "density")
            .expect("test functional requires a density input");
        let density = density.reshape([2, -1]);
        let rho_a = density.get(0).clamp_min(0.0);
        let rho_b = density.get(1).clamp_min(0.0);
        let exc = (rho_a.pow_tensor_scalar(4.0 / 3.0) + rho_b.pow_tensor_scalar(4.0 / 3.0))
            * Self::prefactor();
        Ok(exc)
    }
}
