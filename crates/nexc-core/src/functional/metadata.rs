//! Model archive metadata.
//!
//! A serialized functional is a TorchScript zip archive whose extra-file
//! section carries two entries: `protocol_version` (a JSON integer) and
//! `features` (a JSON array of feature names). Both are read here with a
//! structured parser, without deserializing any model code.

use super::features::Feature;
use super::model::ModelError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// The archive protocol this crate understands.
pub const PROTOCOL_VERSION: i64 = 2;

const PROTOCOL_ENTRY: &str = "extra/protocol_version";
const FEATURES_ENTRY: &str = "extra/features";

/// Validated metadata of a functional archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMetadata {
    pub protocol_version: i64,
    pub features: Vec<Feature>,
}

impl ModelMetadata {
    /// Read and validate metadata from the archive at `path`.
    ///
    /// Fails on a missing entry, malformed JSON, a protocol version other
    /// than [`PROTOCOL_VERSION`], or a feature name outside the vocabulary.
    pub fn from_archive(path: &Path) -> Result<Self, ModelError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        let protocol_raw = read_extra_entry(&mut archive, PROTOCOL_ENTRY)?;
        let protocol_version: i64 =
            serde_json::from_str(protocol_raw.trim()).map_err(|source| ModelError::Metadata {
                entry: PROTOCOL_ENTRY,
                source,
            })?;
        if protocol_version != PROTOCOL_VERSION {
            return Err(ModelError::ProtocolVersion {
                found: protocol_version,
                required: PROTOCOL_VERSION,
            });
        }

        let features_raw = read_extra_entry(&mut archive, FEATURES_ENTRY)?;
        let names: Vec<String> =
            serde_json::from_str(features_raw.trim()).map_err(|source| ModelError::Metadata {
                entry: FEATURES_ENTRY,
                source,
            })?;
        let features = names
            .iter()
            .map(|name| name.parse::<Feature>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            protocol_version,
            features,
        })
    }
}

/// Locate `<archive root>/extra/<name>` regardless of the archive's root
/// directory name and return its contents.
fn read_extra_entry(
    archive: &mut ZipArchive<File>,
    suffix: &'static str,
) -> Result<String, ModelError> {
    let entry_name = archive
        .file_names()
        .find(|name| name.ends_with(suffix))
        .map(str::to_string)
        .ok_or(ModelError::MissingEntry { entry: suffix })?;

    let mut contents = String::new();
    archive
        .by_name(&entry_name)?
        .read_to_string(&mut contents)?;
    Ok(contents)
}
