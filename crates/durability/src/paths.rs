//! Model version directory structure
//!
//! A model version is a portable directory containing all of its state.
//! The layout is shared with existing stores and must not change:
//!
//! ```text
//! <model_root>/<role#partyId#id>/<version>/
//! ├── .lock                          # lock marker, never content
//! ├── define/
//! │   ├── proto/                     # schema snapshot copied at creation
//! │   └── define_meta.yaml           # metadata index
//! ├── variables/
//! │   ├── index/
//! │   └── data/<component>/<alias>/<buffer>[.json]
//! ├── run_parameters/<component>/run_parameters.json
//! ├── pipeline.pb                    # optional
//! └── import_model.json              # optional import descriptor
//! ```

use modelstore_core::ModelIdentity;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the lock marker inside a model version directory
pub const LOCK_FILE_NAME: &str = ".lock";

/// Name of the metadata index file inside `define/`
pub const DEFINE_META_FILE_NAME: &str = "define_meta.yaml";

/// Name of each component's run-parameters file
pub const RUN_PARAMETERS_FILE_NAME: &str = "run_parameters.json";

/// Name of the import descriptor
pub const IMPORT_CONFIG_FILE_NAME: &str = "import_model.json";

/// Model version directory paths
///
/// Provides access to all paths within one model version directory.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    root: PathBuf,
}

impl ModelPaths {
    /// Create paths from the model version directory itself
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        ModelPaths {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Derive the model version directory from the store root and an identity
    pub fn for_identity(model_root: impl AsRef<Path>, identity: &ModelIdentity) -> Self {
        Self::from_root(
            model_root
                .as_ref()
                .join(identity.party_model_id())
                .join(identity.model_version()),
        )
    }

    /// Model version directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lock marker file
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    /// `define/`
    pub fn define_dir(&self) -> PathBuf {
        self.root.join("define")
    }

    /// Schema snapshot directory
    pub fn define_proto_dir(&self) -> PathBuf {
        self.define_dir().join("proto")
    }

    /// Metadata index file
    pub fn define_meta(&self) -> PathBuf {
        self.define_dir().join(DEFINE_META_FILE_NAME)
    }

    /// `variables/index/`
    pub fn variables_index_dir(&self) -> PathBuf {
        self.root.join("variables").join("index")
    }

    /// `variables/data/`
    pub fn variables_data_dir(&self) -> PathBuf {
        self.root.join("variables").join("data")
    }

    /// All artifacts of one component
    pub fn component_data_dir(&self, component: &str) -> PathBuf {
        self.variables_data_dir().join(component)
    }

    /// All buffers of one `(component, alias)` pair
    pub fn alias_data_dir(&self, component: &str, alias: &str) -> PathBuf {
        self.component_data_dir(component).join(alias)
    }

    /// Serialized bytes of one buffer
    pub fn buffer_file(&self, component: &str, alias: &str, buffer_name: &str) -> PathBuf {
        self.alias_data_dir(component, alias).join(buffer_name)
    }

    /// Structured mirror of one buffer (`<buffer>.json`)
    pub fn buffer_json_file(&self, component: &str, alias: &str, buffer_name: &str) -> PathBuf {
        let mut name = OsString::from(buffer_name);
        name.push(".json");
        self.alias_data_dir(component, alias).join(name)
    }

    /// `run_parameters/`
    pub fn run_parameters_dir(&self) -> PathBuf {
        self.root.join("run_parameters")
    }

    /// Run parameters of one component
    pub fn component_run_parameters(&self, component: &str) -> PathBuf {
        self.run_parameters_dir()
            .join(component)
            .join(RUN_PARAMETERS_FILE_NAME)
    }

    /// Standalone pipeline buffer
    pub fn pipeline_file(&self) -> PathBuf {
        self.root.join("pipeline.pb")
    }

    /// Import descriptor
    pub fn import_config(&self) -> PathBuf {
        self.root.join(IMPORT_CONFIG_FILE_NAME)
    }

    /// Whether the directory exists and holds anything besides the lock marker
    ///
    /// A directory left behind by an interrupted creation, holding only
    /// `.lock`, is not a model yet.
    pub fn has_content(&self) -> io::Result<bool> {
        if !self.root.is_dir() {
            return Ok(false);
        }
        for entry in std::fs::read_dir(&self.root)? {
            if entry?.file_name() != LOCK_FILE_NAME {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Create the directory skeleton (`variables/data`, `variables/index`, `define/`)
    pub fn create_skeleton(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.variables_index_dir())?;
        std::fs::create_dir_all(self.variables_data_dir())?;
        std::fs::create_dir_all(self.define_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_for_identity() {
        let identity = ModelIdentity::parse("guest#9999#m1", "v1").unwrap();
        let paths = ModelPaths::for_identity("/models", &identity);
        assert_eq!(paths.root(), Path::new("/models/guest#9999#m1/v1"));
        assert_eq!(
            paths.define_meta(),
            Path::new("/models/guest#9999#m1/v1/define/define_meta.yaml")
        );
        assert_eq!(
            paths.buffer_file("lr", "model", "param"),
            Path::new("/models/guest#9999#m1/v1/variables/data/lr/model/param")
        );
        assert_eq!(
            paths.buffer_json_file("lr", "model", "param"),
            Path::new("/models/guest#9999#m1/v1/variables/data/lr/model/param.json")
        );
        assert_eq!(
            paths.component_run_parameters("lr"),
            Path::new("/models/guest#9999#m1/v1/run_parameters/lr/run_parameters.json")
        );
    }

    #[test]
    fn test_has_content_ignores_lock_marker() {
        let dir = tempdir().unwrap();
        let paths = ModelPaths::from_root(dir.path().join("model"));
        assert!(!paths.has_content().unwrap());

        std::fs::create_dir_all(paths.root()).unwrap();
        assert!(!paths.has_content().unwrap());

        std::fs::write(paths.lock_file(), b"").unwrap();
        assert!(!paths.has_content().unwrap());

        paths.create_skeleton().unwrap();
        assert!(paths.has_content().unwrap());
    }

    #[test]
    fn test_create_skeleton() {
        let dir = tempdir().unwrap();
        let paths = ModelPaths::from_root(dir.path().join("model"));
        paths.create_skeleton().unwrap();
        assert!(paths.variables_data_dir().is_dir());
        assert!(paths.variables_index_dir().is_dir());
        assert!(paths.define_dir().is_dir());
    }
}
