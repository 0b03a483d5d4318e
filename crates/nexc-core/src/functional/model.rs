//! The TorchScript model boundary.

use super::features::{Feature, FeatureError};
use super::hashes;
use super::metadata::ModelMetadata;
use std::path::Path;
use tch::{CModule, Device, IValue, TchError, Tensor};
use thiserror::Error;
use tracing::info;

/// Name of the scripted method every functional archive exports.
const EXC_DENSITY_METHOD: &str = "get_exc_density";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("model archive is missing the '{entry}' entry")]
    MissingEntry { entry: &'static str },

    #[error("malformed '{entry}' metadata: {source}")]
    Metadata {
        entry: &'static str,
        source: serde_json::Error,
    },

    #[error("unsupported protocol version {found} (required: {required})")]
    ProtocolVersion { found: i64, required: i64 },

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("hash mismatch: expected {expected}, file has {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("torch error: {0}")]
    Torch(#[from] TchError),

    #[error("method '{method}' returned {returned} instead of a tensor")]
    UnexpectedReturn {
        method: &'static str,
        returned: &'static str,
    },
}

/// Anything that can evaluate a per-point XC energy density from named
/// feature tensors. The integrator is written against this seam so the
/// quadrature contraction can be validated with closed-form functionals.
pub trait ExcModel {
    /// Features the model expects, in archive order.
    fn features(&self) -> &[Feature];

    /// Per-point energy density for the given named inputs.
    fn exc_density(&self, inputs: &[(String, Tensor)]) -> Result<Tensor, ModelError>;
}

/// A loaded TorchScript functional.
pub struct Functional {
    module: CModule,
    metadata: ModelMetadata,
    device: Device,
}

impl Functional {
    /// Verify, validate, and load a functional archive.
    ///
    /// Order matters: the optional hash check runs before anything touches
    /// the archive contents, metadata validation runs before libtorch
    /// deserializes any code.
    pub fn load(
        path: &Path,
        device: Device,
        expected_hash: Option<&str>,
    ) -> Result<Self, ModelError> {
        if let Some(expected) = expected_hash {
            hashes::verify(path, expected)?;
        }
        let metadata = ModelMetadata::from_archive(path)?;
        let module = CModule::load_on_device(path, device)?;
        info!(
            path = %path.display(),
            features = metadata.features.len(),
            "loaded functional"
        );
        Ok(Self {
            module,
            metadata,
            device,
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn device(&self) -> Device {
        self.device
    }
}

impl ExcModel for Functional {
    fn features(&self) -> &[Feature] {
        &self.metadata.features
    }

    fn exc_density(&self, inputs: &[(String, Tensor)]) -> Result<Tensor, ModelError> {
        let entries: Vec<(IValue, IValue)> = inputs
            .iter()
            .map(|(key, tensor)| {
                (
                    IValue::String(key.clone()),
                    IValue::Tensor(tensor.shallow_clone()),
                )
            })
            .collect();
        let output = self
            .module
            .method_is(EXC_DENSITY_METHOD, &[IValue::GenericDict(entries)])?;
        match output {
            IValue::Tensor(tensor) => Ok(tensor),
            other => Err(ModelError::UnexpectedReturn {
                method: EXC_DENSITY_METHOD,
                returned: ivalue_kind(&other),
            }),
        }
    }
}

fn ivalue_kind(value: &IValue) -> &'static str {
    match value {
        IValue::None => "none",
        IValue::Tensor(_) => "tensor",
        IValue::Double(_) => "double",
        IValue::Int(_) => "int",
        IValue::Bool(_) => "bool",
        IValue::String(_) => "string",
        IValue::Tuple(_) => "tuple",
        IValue::GenericList(_) => "list",
        IValue::GenericDict(_) => "dict",
        _ => "other",
    }
}
