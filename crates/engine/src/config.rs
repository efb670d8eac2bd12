//! Store configuration via `modelstore.toml`
//!
//! All implicit settings of the store (where models live, where archives are
//! written, which schema snapshot is copied into new models) are injected
//! through this config instead of process globals.

use modelstore_core::{StoreError, StoreResult};
use modelstore_durability::ArchiveFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name placed in the store base directory.
pub const CONFIG_FILE_NAME: &str = "modelstore.toml";

/// Default directory (under the base) holding model versions
pub const DEFAULT_MODEL_ROOT: &str = "model_local_cache";

/// Default directory (under the base) receiving archives
pub const DEFAULT_TEMP_DIR: &str = "temp";

/// Store configuration loaded from `modelstore.toml`.
///
/// # Example
///
/// ```toml
/// model_root = "model_local_cache"
/// temp_dir = "temp"
/// archive_format = "zip"
/// # schema_dir = "proto"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root under which `<partyModelId>/<version>/` directories live.
    #[serde(default = "default_model_root")]
    pub model_root: PathBuf,
    /// Shared directory receiving packaged archives.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Schema snapshot copied into `define/proto` when a model is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_dir: Option<PathBuf>,
    /// Container used by `package_model`.
    #[serde(default)]
    pub archive_format: ArchiveFormat,
    /// zstd level for `tar.zst` archives.
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

fn default_model_root() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_ROOT)
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TEMP_DIR)
}

fn default_compression_level() -> i32 {
    3
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            model_root: default_model_root(),
            temp_dir: default_temp_dir(),
            schema_dir: None,
            archive_format: ArchiveFormat::default(),
            compression_level: default_compression_level(),
        }
    }
}

impl StoreConfig {
    /// Default layout rooted at `base`.
    pub fn with_base(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            model_root: base.join(DEFAULT_MODEL_ROOT),
            temp_dir: base.join(DEFAULT_TEMP_DIR),
            ..Self::default()
        }
    }

    /// Use `schema_dir` as the snapshot copied into new models.
    pub fn with_schema_dir(mut self, schema_dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(schema_dir.into());
        self
    }

    /// Package with `format`.
    pub fn with_archive_format(mut self, format: ArchiveFormat) -> Self {
        self.archive_format = format;
        self
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns an error for empty roots or a zstd level outside `1..=22`.
    pub fn validate(&self) -> StoreResult<()> {
        if self.model_root.as_os_str().is_empty() {
            return Err(StoreError::config("model_root must not be empty"));
        }
        if self.temp_dir.as_os_str().is_empty() {
            return Err(StoreError::config("temp_dir must not be empty"));
        }
        if !(1..=22).contains(&self.compression_level) {
            return Err(StoreError::config(format!(
                "compression_level {} out of range 1..=22",
                self.compression_level
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# modelstore configuration
#
# Relative paths are resolved against the directory holding this file.

# Root holding <role#partyId#modelId>/<version>/ model directories
model_root = "model_local_cache"

# Shared directory receiving packaged model archives
temp_dir = "temp"

# Archive container: "zip" (default) or "tar.zst"
archive_format = "zip"

# zstd level used for "tar.zst" archives (1-22)
compression_level = 3

# Schema snapshot copied into define/proto of every new model (optional)
# schema_dir = "proto"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// Relative paths in the file are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let mut config: StoreConfig = toml::from_str(&content).map_err(|e| {
            StoreError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        if let Some(base) = path.parent() {
            config.model_root = resolve(base, &config.model_root);
            config.temp_dir = resolve(base, &config.temp_dir);
            config.schema_dir = config.schema_dir.as_deref().map(|dir| resolve(base, dir));
        }
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> StoreResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                StoreError::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> StoreResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StoreError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = StoreConfig::default();
        assert_eq!(config.archive_format, ArchiveFormat::Zip);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_tar_zst() {
        let config: StoreConfig = toml::from_str("archive_format = \"tar.zst\"").unwrap();
        assert_eq!(config.archive_format, ArchiveFormat::TarZst);
        assert_eq!(config.model_root, PathBuf::from(DEFAULT_MODEL_ROOT));
    }

    #[test]
    fn parse_invalid_format_returns_error() {
        let result: Result<StoreConfig, _> = toml::from_str("archive_format = \"rar\"");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_level_fails_validation() {
        let config = StoreConfig {
            compression_level: 40,
            ..StoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn default_toml_parses_correctly() {
        let config: StoreConfig = toml::from_str(StoreConfig::default_toml()).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn write_default_creates_file_with_resolved_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        StoreConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.model_root, dir.path().join(DEFAULT_MODEL_ROOT));
        assert_eq!(config.temp_dir, dir.path().join(DEFAULT_TEMP_DIR));
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "archive_format = \"tar.zst\"\n").unwrap();
        StoreConfig::write_default_if_missing(&path).unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.archive_format, ArchiveFormat::TarZst);
    }

    #[test]
    fn write_to_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = StoreConfig::with_base(dir.path())
            .with_schema_dir(dir.path().join("proto"))
            .with_archive_format(ArchiveFormat::TarZst);

        config.write_to_file(&path).unwrap();
        assert_eq!(StoreConfig::from_file(&path).unwrap(), config);
    }
}
