//! Dictionary-level forward and gradient evaluation.
//!
//! These are the semantics exposed to foreign callers: the inputs arrive as
//! an ordered dictionary of tensor lists, and gradients leave regrouped
//! under the same keys. Kept in the core crate so the behavior is testable
//! without a serialized model.

use super::features::{FeatureDict, FeatureError};
use super::model::{ExcModel, ModelError};
use tch::{Kind, Tensor};

const GRID_WEIGHTS_KEY: &str = "grid_weights";

/// Forward evaluation: stack each key's tensor list into a single tensor
/// and run the model once.
pub fn get_exc(model: &dyn ExcModel, dict: &FeatureDict) -> Result<Tensor, ModelError> {
    let mut inputs = Vec::with_capacity(dict.len());
    for (key, _) in dict.iter() {
        let values = dict.values(key)?;
        inputs.push((key.to_string(), Tensor::stack(values, 0)));
    }
    model.exc_density(&inputs)
}

/// Forward plus gradient evaluation.
///
/// Every input tensor becomes a differentiable leaf; per-key lists are
/// concatenated for the forward pass; the scalar objective is the
/// grid-weighted sum of the energy density. Gradients are regrouped under
/// their original keys, with zero tensors for inputs the model never used.
pub fn get_exc_and_vxc(
    model: &dyn ExcModel,
    dict: &FeatureDict,
) -> Result<(Tensor, FeatureDict), ModelError> {
    let mut leaves: Vec<Tensor> = Vec::new();
    let mut leaf_keys: Vec<String> = Vec::new();
    let mut inputs = Vec::with_capacity(dict.len());
    let mut weights: Option<Tensor> = None;

    for (key, _) in dict.iter() {
        let values = dict.values(key)?;
        let mut with_grad = Vec::with_capacity(values.len());
        for value in values {
            let leaf = value.detach().set_requires_grad(true);
            leaves.push(leaf.shallow_clone());
            leaf_keys.push(key.to_string());
            with_grad.push(leaf);
        }
        let concatenated = Tensor::cat(&with_grad, 0);
        if key == GRID_WEIGHTS_KEY {
            weights = Some(concatenated.shallow_clone());
        }
        inputs.push((key.to_string(), concatenated));
    }

    let exc_on_grid = model.exc_density(&inputs)?;
    let weights = weights
        .ok_or_else(|| FeatureError::MissingKey(GRID_WEIGHTS_KEY.to_string()))?;
    let exc = (&exc_on_grid * &weights).sum(None::<Kind>);

    let grads = Tensor::run_backward(&[&exc], &leaves, false, false);

    let mut gradients = FeatureDict::new();
    let mut grouped: Vec<(String, Vec<Tensor>)> = Vec::new();
    for ((key, leaf), grad) in leaf_keys.iter().zip(&leaves).zip(grads) {
        let grad = if grad.defined() {
            grad
        } else {
            leaf.zeros_like()
        };
        match grouped.iter_mut().find(|(k, _)| k == key) {
            Some((_, list)) => list.push(grad),
            None => grouped.push((key.clone(), vec![grad])),
        }
    }
    for (key, list) in grouped {
        gradients.insert(&key, list);
    }

    Ok((exc_on_grid, gradients))
}
