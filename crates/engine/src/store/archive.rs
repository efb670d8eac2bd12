//! Packaging, unpacking and import configuration
//!
//! `package_model` turns the model version directory into one archive file in
//! the shared temp directory and returns its SHA-256. `unpack_model` is the
//! receiving side: the digest is checked before anything under the target is
//! created, so a corrupted transfer never leaves a half-populated model.

use super::ArtifactStore;
use modelstore_core::{BufferCodec, StoreError, StoreResult};
use modelstore_durability::{
    sha256_file, verify_file, write_atomic, ArchiveFormat, ArchiveReader, ArchiveWriter,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Content of `import_model.json`, consumed by the model import command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Party role
    pub role: String,
    /// Numeric party id
    pub party_id: u64,
    /// Model id without role or party
    pub model_id: String,
    /// Model version
    pub model_version: String,
    /// Archive produced by `package_model`
    pub file: PathBuf,
}

impl<C: BufferCodec> ArtifactStore<C> {
    /// Deterministic archive location: `<temp_dir>/<partyModelId>_<version>.<ext>`
    pub fn archive_path(&self) -> PathBuf {
        self.config.temp_dir.join(format!(
            "{}_{}.{}",
            self.identity.party_model_id(),
            self.identity.model_version(),
            self.config.archive_format.extension()
        ))
    }

    /// Archive the model version directory and return the archive's hex SHA-256.
    ///
    /// # Errors
    ///
    /// `NotFound` unless the store exists.
    pub fn package_model(&self) -> StoreResult<String> {
        self.require_local_cache()?;

        let archive_path = self.archive_path();
        let _guard = self.lock.acquire()?;
        let written = ArchiveWriter::new(self.config.archive_format)
            .with_compression_level(self.config.compression_level)
            .write_dir(self.paths.root(), &archive_path)?;
        let digest = sha256_file(&written.path)?;

        info!(
            target: "modelstore::archive",
            model = %self.identity,
            path = %written.path.display(),
            entries = written.entry_count,
            size_bytes = written.size_bytes,
            hash = %digest,
            "Model archive created"
        );
        Ok(digest)
    }

    /// Extract `archive` into this model version directory.
    ///
    /// The format comes from the archive file name, falling back to the
    /// configured one.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the store exists and `force_update` is false
    /// - `NotFound` if `archive` is not a file
    /// - `IntegrityMismatch` if `expected_digest` does not match; the target
    ///   directory is not created
    pub fn unpack_model(
        &self,
        archive: &Path,
        force_update: bool,
        expected_digest: Option<&str>,
    ) -> StoreResult<()> {
        if self.exists()? && !force_update {
            return Err(self.already_exists());
        }
        if !archive.is_file() {
            return Err(StoreError::not_found(format!(
                "model archive {}",
                archive.display()
            )));
        }
        if let Some(expected) = expected_digest {
            verify_file(archive, expected)?;
        }
        let format = ArchiveFormat::from_path(archive).unwrap_or(self.config.archive_format);

        let _guard = self.lock.acquire()?;
        if self.exists()? && !force_update {
            return Err(self.already_exists());
        }
        ArchiveReader::extract(archive, format, self.paths.root())?;

        info!(
            target: "modelstore::archive",
            model = %self.identity,
            archive = %archive.display(),
            path = %self.paths.root().display(),
            "Model archive unpacked"
        );
        Ok(())
    }

    /// Write `import_model.json` describing this model's archive.
    ///
    /// # Errors
    ///
    /// `InvalidIdentity` if the party id is not numeric; `NotFound` unless the
    /// store exists.
    pub fn gen_model_import_config(&self) -> StoreResult<PathBuf> {
        let config = ImportConfig {
            role: self.identity.role().to_string(),
            party_id: self.identity.numeric_party_id()?,
            model_id: self.identity.model_id().to_string(),
            model_version: self.identity.model_version().to_string(),
            file: self.archive_path(),
        };
        self.require_local_cache()?;

        let path = self.paths.import_config();
        let _guard = self.lock.acquire()?;
        write_atomic(&path, &serde_json::to_vec_pretty(&config)?)?;
        Ok(path)
    }
}
