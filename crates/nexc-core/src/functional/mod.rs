pub mod features;
pub mod hashes;
pub mod inference;
pub mod metadata;
pub mod model;

#[cfg(test)]
pub(crate) mod testing;

pub use features::{Feature, FeatureDict, FeatureError};
pub use inference::{get_exc, get_exc_and_vxc};
pub use metadata::{ModelMetadata, PROTOCOL_VERSION};
pub use model::{ExcModel, Functional, ModelError};
