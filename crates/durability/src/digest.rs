//! SHA-256 digests of archive files
//!
//! The digest certifies the archive bytes only: "the bytes you received are
//! the bytes that were packaged". It says nothing about the unpacked tree.

use modelstore_core::{StoreError, StoreResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Lowercase hex SHA-256 of a file's bytes, streamed.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Lowercase hex SHA-256 of an in-memory slice.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Check a file against an expected digest.
///
/// Returns the actual digest on success and `IntegrityMismatch` otherwise.
/// Hex case is ignored.
pub fn verify_file(path: &Path, expected: &str) -> StoreResult<String> {
    let actual = sha256_file(path)?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(StoreError::IntegrityMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(actual)
}
