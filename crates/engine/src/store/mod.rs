//! Artifact store for one model version directory
//!
//! An [`ArtifactStore`] owns the path computation of one
//! `(partyModelId, version)` pair and every mutation under it. Mutations run
//! under the directory's [`DirLock`]; reads of already durable state
//! (index queries, size) run lock-free.
//!
//! ## Lifecycle
//!
//! ```text
//! create() ──► save_component_model()* ──► package_model() ──► unpack_model() elsewhere
//! ```
//!
//! Operations that need a populated directory call `require_local_cache`
//! first and fail fast with `NotFound`.

mod archive;
mod index;
mod read;

pub use archive::ImportConfig;
pub use index::ModelProtoView;

use crate::config::StoreConfig;
use modelstore_core::{
    BufferCodec, BufferEntry, ComponentModel, DefineMeta, ModelIdentity, RawCodec, StoreError,
    StoreResult,
};
use modelstore_durability::{copy_tree, tree_size, write_atomic, DirLock, ModelPaths};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reserved component holding the whole-pipeline summary
pub const PIPELINE_COMPONENT_NAME: &str = "pipeline";
/// Module name recorded for the pipeline component
pub const PIPELINE_COMPONENT_MODULE_NAME: &str = "Pipeline";
/// Alias of the pipeline component
pub const PIPELINE_MODEL_ALIAS: &str = "pipeline";
/// Buffer name of the pipeline summary
pub const PIPELINE_MODEL_NAME: &str = "Pipeline";

/// Directory-backed store for one model version.
pub struct ArtifactStore<C = RawCodec> {
    identity: ModelIdentity,
    config: StoreConfig,
    paths: ModelPaths,
    lock: DirLock,
    codec: C,
}

impl<C> std::fmt::Debug for ArtifactStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("identity", &self.identity)
            .field("path", &self.paths.root())
            .finish()
    }
}

impl ArtifactStore<RawCodec> {
    /// Store treating buffers as opaque bytes.
    pub fn open(config: StoreConfig, identity: ModelIdentity) -> StoreResult<Self> {
        Self::with_codec(config, identity, RawCodec)
    }
}

impl<C: BufferCodec> ArtifactStore<C> {
    /// Store decoding buffers with `codec`.
    ///
    /// Nothing under the model directory is touched; only the shared temp
    /// directory is created.
    pub fn with_codec(config: StoreConfig, identity: ModelIdentity, codec: C) -> StoreResult<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.temp_dir)?;
        let paths = ModelPaths::for_identity(&config.model_root, &identity);
        let lock = DirLock::new(paths.root());
        Ok(Self {
            identity,
            config,
            paths,
            lock,
            codec,
        })
    }

    /// Identity of the model version
    pub fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    /// Configuration the store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Directory layout of the model version
    pub fn paths(&self) -> &ModelPaths {
        &self.paths
    }

    /// Model version directory
    pub fn model_path(&self) -> &Path {
        self.paths.root()
    }

    /// Buffer codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Lock guarding the model version directory
    pub fn lock(&self) -> &DirLock {
        &self.lock
    }

    /// Whether the directory exists and holds anything besides the lock marker.
    pub fn exists(&self) -> StoreResult<bool> {
        Ok(self.paths.has_content()?)
    }

    /// Guard for operations that need a populated model directory.
    pub(crate) fn require_local_cache(&self) -> StoreResult<()> {
        if !self.exists()? {
            return Err(StoreError::not_found(format!(
                "Can not found {} model local cache",
                self.identity
            )));
        }
        Ok(())
    }

    /// Create the directory skeleton and an empty metadata index.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the directory already holds content.
    pub fn create(&self) -> StoreResult<()> {
        if self.exists()? {
            return Err(self.already_exists());
        }

        let _guard = self.lock.acquire()?;
        if self.exists()? {
            return Err(self.already_exists());
        }

        self.paths.create_skeleton()?;
        if let Some(schema_dir) = &self.config.schema_dir {
            let copied = copy_tree(schema_dir, &self.paths.define_proto_dir())?;
            debug!(target: "modelstore::store", schema_dir = %schema_dir.display(), files = copied, "Schema snapshot copied");
        }
        // Index last: an interrupted create never leaves index entries behind.
        self.write_define_meta(&DefineMeta::default())?;

        info!(target: "modelstore::store", model = %self.identity, path = %self.paths.root().display(), "Model created");
        Ok(())
    }

    /// Persist one component's buffers, run parameters and index entry.
    ///
    /// All writes happen under a single lock acquisition. Reads of this
    /// `(component, alias)` see the new buffers once this returns `Ok`.
    pub fn save_component_model(&self, model: ComponentModel) -> StoreResult<()> {
        validate_segment("component name", &model.component_name)?;
        validate_segment("model alias", &model.model_alias)?;
        for buffer_name in model.buffers.keys() {
            validate_buffer_name(buffer_name)?;
        }
        self.require_local_cache()?;

        let _guard = self.lock.acquire()?;
        let component = model.component_name.as_str();
        let alias = model.model_alias.as_str();

        for (buffer_name, entry) in &model.buffers {
            write_atomic(
                &self.paths.buffer_file(component, alias, buffer_name),
                &entry.serialized,
            )?;
            let json_path = self.paths.buffer_json_file(component, alias, buffer_name);
            match &entry.json {
                Some(json) => write_atomic(&json_path, &serde_json::to_vec(json)?)?,
                None => remove_if_exists(&json_path)?,
            }
            info!(target: "modelstore::store", component, alias, buffer = %buffer_name, "Saved buffer");
        }

        let run_parameters = model
            .run_parameters
            .clone()
            .unwrap_or_else(|| serde_json::json!({}));
        write_atomic(
            &self.paths.component_run_parameters(component),
            &serde_json::to_vec(&run_parameters)?,
        )?;

        self.update_component_meta(
            component,
            &model.component_module_name,
            alias,
            &model.proto_index(),
        )?;

        info!(target: "modelstore::store", component, alias, "Saved component model");
        Ok(())
    }

    /// Save the pipeline summary under the reserved component and rewrite the index file.
    pub fn save_pipeline_model(&self, pipeline: &C::Object) -> StoreResult<()> {
        let mut entry = BufferEntry::new(
            self.codec.type_name(pipeline),
            self.codec.serialize(pipeline)?,
        );
        entry.json = self.codec.to_json(pipeline);

        let model = ComponentModel::new(
            PIPELINE_COMPONENT_NAME,
            PIPELINE_COMPONENT_MODULE_NAME,
            PIPELINE_MODEL_ALIAS,
        )
        .with_buffer(PIPELINE_MODEL_NAME, entry);

        let _guard = self.lock.acquire()?;
        self.save_component_model(model)?;
        let define_meta = self.read_define_meta()?;
        self.write_define_meta(&define_meta)
    }

    /// Serialize `object` with the codec and write it to `path` under the lock.
    pub fn save_buffer_object(&self, object: &C::Object, path: &Path) -> StoreResult<PathBuf> {
        let serialized = self.codec.serialize(object)?;
        let _guard = self.lock.acquire()?;
        write_atomic(path, &serialized)?;
        Ok(path.to_path_buf())
    }

    /// Write the serialized pipeline to `pipeline.pb` in the model directory.
    pub fn save_pipeline(&self, pipeline: &C::Object) -> StoreResult<PathBuf> {
        self.save_buffer_object(pipeline, &self.paths.pipeline_file())
    }

    /// Run-parameters file of one component
    pub fn component_run_parameters_path(&self, component: &str) -> PathBuf {
        self.paths.component_run_parameters(component)
    }

    /// Size of every file under the model directory, in KiB rounded to nearest.
    ///
    /// Lock-free; may observe in-flight writes.
    pub fn calculate_storage_size(&self) -> u64 {
        (tree_size(self.paths.root()) + 512) / 1024
    }

    fn already_exists(&self) -> StoreError {
        StoreError::AlreadyExists {
            path: self.paths.root().to_path_buf(),
        }
    }
}

/// Names used as single path segments under the model directory
pub(crate) fn validate_segment(kind: &str, name: &str) -> StoreResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(StoreError::invalid_input(format!(
            "{} '{}' is not a valid path segment",
            kind, name
        )));
    }
    Ok(())
}

/// Suffixes of files the store writes next to buffers (JSON mirror, atomic-write staging)
const RESERVED_BUFFER_SUFFIXES: [&str; 2] = [".json", ".tmp"];

/// Buffer names must also not shadow the store's own sidecar or staging files.
pub(crate) fn validate_buffer_name(name: &str) -> StoreResult<()> {
    validate_segment("buffer name", name)?;
    if let Some(suffix) = RESERVED_BUFFER_SUFFIXES
        .into_iter()
        .find(|suffix| name.ends_with(*suffix))
    {
        return Err(StoreError::invalid_input(format!(
            "buffer name '{}' ends with reserved suffix '{}'",
            name, suffix
        )));
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
