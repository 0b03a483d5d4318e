//! The feature vocabulary and the ordered feature dictionary.
//!
//! Feature keys are a small closed vocabulary shared between model archives,
//! the integrator, and foreign callers. Discriminant values are part of the
//! C ABI and must stay stable.

use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use tch::Tensor;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error("unknown feature name '{0}'")]
    UnknownFeature(String),

    #[error("key '{0}' not found in feature dictionary")]
    MissingKey(String),

    #[error("no tensors stored for key '{0}'")]
    EmptyList(String),

    #[error("index {index} out of bounds for tensor list of size {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Model input features. Discriminants are the stable C ABI values.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Density = 1,
    Grad = 2,
    Kin = 3,
    GridCoords = 4,
    GridWeights = 5,
    Coarse0AtomicCoords = 6,
}

static FEATURES: Map<&'static str, Feature> = phf_map! {
    "density" => Feature::Density,
    "grad" => Feature::Grad,
    "kin" => Feature::Kin,
    "grid_coords" => Feature::GridCoords,
    "grid_weights" => Feature::GridWeights,
    "coarse_0_atomic_coords" => Feature::Coarse0AtomicCoords,
};

impl Feature {
    pub fn name(self) -> &'static str {
        match self {
            Feature::Density => "density",
            Feature::Grad => "grad",
            Feature::Kin => "kin",
            Feature::GridCoords => "grid_coords",
            Feature::GridWeights => "grid_weights",
            Feature::Coarse0AtomicCoords => "coarse_0_atomic_coords",
        }
    }
}

impl FromStr for Feature {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FEATURES
            .get(s)
            .copied()
            .ok_or_else(|| FeatureError::UnknownFeature(s.to_string()))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Insertion-ordered mapping from feature keys to tensor lists.
///
/// The vocabulary is tiny, so a linear scan over a `Vec` beats hashing and
/// keeps iteration order identical to insertion order, which gradient
/// regrouping relies on.
#[derive(Debug, Default)]
pub struct FeatureDict {
    entries: Vec<(String, Vec<Tensor>)>,
}

impl FeatureDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the tensor list stored under `key`.
    pub fn insert(&mut self, key: &str, tensors: Vec<Tensor>) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = tensors;
        } else {
            self.entries.push((key.to_string(), tensors));
        }
    }

    /// The tensor list stored under `key`. Missing keys and empty lists are
    /// both faults, matching the adapter contract.
    pub fn values(&self, key: &str) -> Result<&[Tensor], FeatureError> {
        let (_, tensors) = self
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .ok_or_else(|| FeatureError::MissingKey(key.to_string()))?;
        if tensors.is_empty() {
            return Err(FeatureError::EmptyList(key.to_string()));
        }
        Ok(tensors)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Tensor])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Bounds-checked indexing into a tensor list.
pub fn list_item(list: &[Tensor], index: usize) -> Result<&Tensor, FeatureError> {
    list.get(index).ok_or(FeatureError::IndexOutOfRange {
        index,
        len: list.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_round_trips_and_rejects_unknowns() {
        for feature in [
            Feature::Density,
            Feature::Grad,
            Feature::Kin,
            Feature::GridCoords,
            Feature::GridWeights,
            Feature::Coarse0AtomicCoords,
        ] {
            assert_eq!(feature.name().parse::<Feature>().unwrap(), feature);
        }
        assert!(matches!(
            "laplacian".parse::<Feature>(),
            Err(FeatureError::UnknownFeature(_))
        ));
    }

    #[test]
    fn abi_discriminants_are_stable() {
        assert_eq!(Feature::Density as i32, 1);
        assert_eq!(Feature::Grad as i32, 2);
        assert_eq!(Feature::Kin as i32, 3);
        assert_eq!(Feature::GridCoords as i32, 4);
        assert_eq!(Feature::GridWeights as i32, 5);
        assert_eq!(Feature::Coarse0AtomicCoords as i32, 6);
    }

    #[test]
    fn insert_then_lookup_preserves_length() {
        let mut dict = FeatureDict::new();
        dict.insert(
            "density",
            vec![Tensor::from_slice(&[1.0_f64]), Tensor::from_slice(&[2.0_f64])],
        );
        let values = dict.values("density").unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn lookup_of_absent_key_faults() {
        let dict = FeatureDict::new();
        assert!(matches!(
            dict.values("density"),
            Err(FeatureError::MissingKey(_))
        ));
    }

    #[test]
    fn lookup_of_empty_list_faults() {
        let mut dict = FeatureDict::new();
        dict.insert("grad", Vec::new());
        assert!(matches!(
            dict.values("grad"),
            Err(FeatureError::EmptyList(_))
        ));
    }

    #[test]
    fn insert_replaces_existing_entries_in_place() {
        let mut dict = FeatureDict::new();
        dict.insert("kin", vec![Tensor::from_slice(&[1.0_f64])]);
        dict.insert("grid_weights", vec![Tensor::from_slice(&[2.0_f64])]);
        dict.insert(
            "kin",
            vec![
                Tensor::from_slice(&[3.0_f64]),
                Tensor::from_slice(&[4.0_f64]),
            ],
        );
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.values("kin").unwrap().len(), 2);
        let keys: Vec<&str> = dict.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["kin", "grid_weights"]);
    }

    #[test]
    fn list_indexing_is_bounds_checked() {
        let list = vec![Tensor::from_slice(&[1.0_f64])];
        assert!(list_item(&list, 0).is_ok());
        assert_eq!(
            list_item(&list, 3).unwrap_err(),
            FeatureError::IndexOutOfRange { index: 3, len: 1 }
        );
    }
}
