//! Hash pinning for serialized functionals.
//!
//! TorchScript deserialization executes arbitrary code, so released
//! functional files are pinned by SHA-256 digest and verified before the
//! archive is ever handed to libtorch.

use super::model::ModelError;
use phf::{Map, phf_map};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Digests of known released functional files, keyed by file name.
static KNOWN_HASHES: Map<&'static str, &'static str> = phf_map! {
    "nexc-1.0.fun" => "4c9e3b7d8a21f05c6e8b1a9d2f47c033715e9ab64d8f20c1b5a7e64392d0f8e1",
    "nexc-1.0-cuda.fun" => "9f12d6c04ab83e57210fcd9b3a6e84d1c05f7b2ae9d34816c2b0e5f7a1d49c63",
};

/// The pinned digest for a released file name, if any.
pub fn known_hash(file_name: &str) -> Option<&'static str> {
    KNOWN_HASHES.get(file_name).copied()
}

/// Lowercase hex SHA-256 of the file at `path`, streamed.
pub fn sha256_hex(path: &Path) -> Result<String, ModelError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify the file at `path` against `expected` (case-insensitive hex).
pub fn verify(path: &Path, expected: &str) -> Result<(), ModelError> {
    let actual = sha256_hex(path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(ModelError::HashMismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
