//! Read paths of [`ArtifactStore`]
//!
//! Buffers are resolved through the metadata index: a `(component, alias)`
//! pair the index does not know is `NotFound` even if files exist on disk.

use super::{ArtifactStore, PIPELINE_COMPONENT_NAME, PIPELINE_MODEL_ALIAS, PIPELINE_MODEL_NAME};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use modelstore_core::{
    collect_key, BufferCodec, BufferOutput, CollectFormat, CollectedModels, OutputFormat,
    StoreError, StoreResult,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use tracing::debug;

impl<C: BufferCodec> ArtifactStore<C> {
    /// Read every buffer of `(component, alias)` in the requested shape.
    ///
    /// # Errors
    ///
    /// `NotFound` if the store does not exist or the index has no entry for
    /// the pair. A missing JSON mirror is returned as `Value::Null`.
    pub fn read_component_model(
        &self,
        component: &str,
        alias: &str,
        format: OutputFormat,
    ) -> StoreResult<BTreeMap<String, BufferOutput<C::Object>>> {
        self.require_local_cache()?;

        let define_meta = self.read_define_meta()?;
        let proto_index = define_meta.proto_index(component, alias).ok_or_else(|| {
            StoreError::not_found(format!(
                "component {} alias {} of model {}",
                component, alias, self.identity
            ))
        })?;

        let mut buffers = BTreeMap::new();
        for (buffer_name, type_name) in proto_index {
            let output = self.read_buffer(component, alias, buffer_name, type_name, format)?;
            buffers.insert(buffer_name.clone(), output);
        }
        Ok(buffers)
    }

    /// Read the pipeline summary buffer.
    pub fn read_pipeline_model(&self, format: OutputFormat) -> StoreResult<BufferOutput<C::Object>> {
        self.read_component_model(PIPELINE_COMPONENT_NAME, PIPELINE_MODEL_ALIAS, format)?
            .remove(PIPELINE_MODEL_NAME)
            .ok_or_else(|| {
                StoreError::not_found(format!("pipeline buffer of model {}", self.identity))
            })
    }

    /// Run parameters of every component that recorded them.
    ///
    /// Empty if the run-parameters directory does not exist.
    pub fn read_run_parameters(&self) -> StoreResult<BTreeMap<String, Value>> {
        let mut run_parameters = BTreeMap::new();
        let entries = match fs::read_dir(self.paths.run_parameters_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(run_parameters),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(component) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let path = self.paths.component_run_parameters(&component);
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            run_parameters.insert(component, serde_json::from_slice(&bytes)?);
        }
        Ok(run_parameters)
    }

    /// Every buffer of every `(component, alias)` recorded in the index.
    ///
    /// Parsed objects are keyed by buffer name alone, so a later component
    /// replaces an earlier buffer of the same name. Byte modes are keyed by
    /// `component.alias:bufferName`.
    pub fn collect_models(&self, format: CollectFormat) -> StoreResult<CollectedModels<C::Object>> {
        self.require_local_cache()?;

        let define_meta = self.read_define_meta()?;
        let mut parsed = BTreeMap::new();
        let mut bytes = BTreeMap::new();
        let mut encoded = BTreeMap::new();

        for (component, alias, buffer_name, type_name) in define_meta.buffers() {
            let data = fs::read(self.paths.buffer_file(component, alias, buffer_name))?;
            match format {
                CollectFormat::Parsed => {
                    parsed.insert(buffer_name.to_string(), self.codec.parse(type_name, &data)?);
                }
                CollectFormat::Bytes => {
                    bytes.insert(collect_key(component, alias, buffer_name), data);
                }
                CollectFormat::Base64 => {
                    encoded.insert(
                        collect_key(component, alias, buffer_name),
                        BASE64.encode(&data),
                    );
                }
            }
        }

        Ok(match format {
            CollectFormat::Parsed => CollectedModels::Parsed(parsed),
            CollectFormat::Bytes => CollectedModels::Bytes(bytes),
            CollectFormat::Base64 => CollectedModels::Base64(encoded),
        })
    }

    fn read_buffer(
        &self,
        component: &str,
        alias: &str,
        buffer_name: &str,
        type_name: &str,
        format: OutputFormat,
    ) -> StoreResult<BufferOutput<C::Object>> {
        let data = fs::read(self.paths.buffer_file(component, alias, buffer_name))?;

        Ok(match format {
            OutputFormat::Parsed => BufferOutput::Parsed(self.codec.parse(type_name, &data)?),
            OutputFormat::Encoded => BufferOutput::Encoded {
                type_name: type_name.to_string(),
                data: BASE64.encode(&data),
            },
            OutputFormat::Json => {
                let json_path = self.paths.buffer_json_file(component, alias, buffer_name);
                match fs::read(&json_path) {
                    Ok(json) => BufferOutput::Json(serde_json::from_slice(&json)?),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        debug!(target: "modelstore::store", component, alias, buffer = buffer_name, "No JSON mirror, returning null");
                        BufferOutput::Json(Value::Null)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        })
    }
}
