//! Component reload between model versions
//!
//! Copies selected components' buffer trees from a source model version into
//! a target one and registers them in the target's metadata index with the
//! source's module names.
//!
//! The source is read without taking its lock. Taking two directory locks in
//! caller-chosen order could deadlock two reloads running in opposite
//! directions; a concurrently written source may therefore be copied
//! partially.

use crate::store::ArtifactStore;
use modelstore_core::{BufferCodec, ModelIdentity, StoreError, StoreResult};
use modelstore_durability::copy_tree;
use tracing::{debug, info};

/// Outcome of [`ArtifactStore::reload_component_artifacts`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Components copied into the target
    pub reloaded: Vec<String>,
    /// Components the source has no data for
    pub skipped: Vec<String>,
    /// Files copied across all components
    pub files_copied: u64,
}

impl<C: BufferCodec> ArtifactStore<C> {
    /// Copy `components` from `source` into this model version.
    ///
    /// Components without a data directory in the source are skipped.
    /// Same-named files in the target are overwritten; other aliases and
    /// buffers already in the target are kept.
    ///
    /// # Errors
    ///
    /// `NotFound` unless this store exists; `InvalidInput` if `source` is this
    /// store's own identity or a component name is not a path segment.
    pub fn reload_component_artifacts<S: AsRef<str>>(
        &self,
        source: &ModelIdentity,
        components: &[S],
    ) -> StoreResult<ReloadReport> {
        if source == self.identity() {
            return Err(StoreError::invalid_input(format!(
                "cannot reload model {} from itself",
                source
            )));
        }
        for component in components {
            crate::store::validate_segment("component name", component.as_ref())?;
        }
        self.require_local_cache()?;

        let source_store = ArtifactStore::open(self.config().clone(), source.clone())?;
        let source_meta = source_store.read_define_meta()?;

        let _guard = self.lock().acquire()?;
        let mut report = ReloadReport::default();

        for component in components {
            let component = component.as_ref();
            let source_dir = source_store.paths().component_data_dir(component);
            if !source_dir.is_dir() {
                debug!(target: "modelstore::reload", component, source = %source, "Source has no data, skipped");
                report.skipped.push(component.to_string());
                continue;
            }

            let copied = copy_tree(&source_dir, &self.paths().component_data_dir(component))?;
            report.files_copied += copied;

            let module_name = source_meta.module_name(component).unwrap_or_default();
            if let Some(aliases) = source_meta.component_model_proto(component) {
                for (alias, proto_index) in aliases {
                    self.update_component_meta(component, module_name, alias, proto_index)?;
                }
            }

            debug!(target: "modelstore::reload", component, files = copied, "Component reloaded");
            report.reloaded.push(component.to_string());
        }

        info!(
            target: "modelstore::reload",
            model = %self.identity(),
            source = %source,
            reloaded = report.reloaded.len(),
            skipped = report.skipped.len(),
            files = report.files_copied,
            "Reload finished"
        );
        Ok(report)
    }
}
