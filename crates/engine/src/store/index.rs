//! Metadata index access for [`ArtifactStore`]
//!
//! Queries read `define/define_meta.yaml` lock-free; the file is only ever
//! replaced by an atomic rename, so a reader sees a whole document. The
//! single mutation, `update_component_meta`, is a read-merge-write under the
//! directory lock.

use super::ArtifactStore;
use modelstore_core::meta::ComponentModelProto;
use modelstore_core::{
    BufferCodec, ComponentDefine, DefineMeta, ModelProtoIndex, StoreError, StoreResult,
};
use modelstore_durability::write_atomic;
use std::collections::BTreeMap;
use tracing::debug;

/// Result of [`ArtifactStore::get_model_proto_index`], narrowed by the keys supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelProtoView {
    /// Whole model: `component → alias → buffer name → type`
    Model(BTreeMap<String, ComponentModelProto>),
    /// One component: `alias → buffer name → type`
    Component(ComponentModelProto),
    /// One `(component, alias)`: `buffer name → type`
    Alias(ModelProtoIndex),
}

impl ModelProtoView {
    /// Number of top-level keys in the view
    pub fn len(&self) -> usize {
        match self {
            Self::Model(m) => m.len(),
            Self::Component(m) => m.len(),
            Self::Alias(m) => m.len(),
        }
    }

    /// True if the view has no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: BufferCodec> ArtifactStore<C> {
    /// Load the metadata index. A missing file is an empty index.
    pub fn read_define_meta(&self) -> StoreResult<DefineMeta> {
        match std::fs::read_to_string(self.paths.define_meta()) {
            Ok(text) => Ok(DefineMeta::from_yaml(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DefineMeta::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn write_define_meta(&self, define_meta: &DefineMeta) -> StoreResult<()> {
        let _guard = self.lock.acquire()?;
        write_atomic(&self.paths.define_meta(), define_meta.to_yaml()?.as_bytes())?;
        Ok(())
    }

    /// Merge `component → alias → proto_index` and the module name into the index.
    ///
    /// Other aliases of the component are preserved.
    pub fn update_component_meta(
        &self,
        component: &str,
        module_name: &str,
        alias: &str,
        proto_index: &ModelProtoIndex,
    ) -> StoreResult<()> {
        self.require_local_cache()?;

        let _guard = self.lock.acquire()?;
        let mut define_meta = self.read_define_meta()?;
        define_meta.merge_component(component, module_name, alias, proto_index);
        self.write_define_meta(&define_meta)?;

        debug!(target: "modelstore::store", component, alias, buffers = proto_index.len(), "Metadata index updated");
        Ok(())
    }

    /// `component → alias → buffer name → type` for the whole model
    pub fn model_proto(&self) -> StoreResult<BTreeMap<String, ComponentModelProto>> {
        Ok(self.read_define_meta()?.model_proto)
    }

    /// `alias → buffer name → type` for one component; empty if unknown
    pub fn component_model_proto(&self, component: &str) -> StoreResult<ComponentModelProto> {
        Ok(self
            .read_define_meta()?
            .component_model_proto(component)
            .cloned()
            .unwrap_or_default())
    }

    /// `buffer name → type` for one `(component, alias)`; empty if unknown
    pub fn model_proto_index(&self, component: &str, alias: &str) -> StoreResult<ModelProtoIndex> {
        Ok(self
            .read_define_meta()?
            .proto_index(component, alias)
            .cloned()
            .unwrap_or_default())
    }

    /// Definitions of every component
    pub fn component_defines(&self) -> StoreResult<BTreeMap<String, ComponentDefine>> {
        Ok(self.read_define_meta()?.component_define)
    }

    /// Definition of one component; default (empty) if unknown
    pub fn component_define(&self, component: &str) -> StoreResult<ComponentDefine> {
        Ok(self
            .read_define_meta()?
            .component_define
            .remove(component)
            .unwrap_or_default())
    }

    /// Proto index narrowed by `component` and then `alias`.
    ///
    /// `alias` is ignored without a `component`.
    pub fn get_model_proto_index(
        &self,
        component: Option<&str>,
        alias: Option<&str>,
    ) -> StoreResult<ModelProtoView> {
        Ok(match (component, alias) {
            (None, _) => ModelProtoView::Model(self.model_proto()?),
            (Some(component), None) => {
                ModelProtoView::Component(self.component_model_proto(component)?)
            }
            (Some(component), Some(alias)) => {
                ModelProtoView::Alias(self.model_proto_index(component, alias)?)
            }
        })
    }

    /// Component definitions, optionally narrowed to one component.
    ///
    /// An unknown component yields an empty mapping.
    pub fn get_component_define(
        &self,
        component: Option<&str>,
    ) -> StoreResult<BTreeMap<String, ComponentDefine>> {
        let mut defines = self.component_defines()?;
        Ok(match component {
            None => defines,
            Some(component) => defines
                .remove_entry(component)
                .into_iter()
                .collect(),
        })
    }

    /// The single alias recorded for `component`.
    ///
    /// # Errors
    ///
    /// `AmbiguousAlias` when the component has zero or several aliases.
    pub fn get_model_alias(&self, component: &str) -> StoreResult<String> {
        let aliases = self.component_model_proto(component)?;
        if aliases.len() != 1 {
            return Err(StoreError::AmbiguousAlias {
                component: component.to_string(),
                count: aliases.len(),
            });
        }
        aliases
            .into_keys()
            .next()
            .ok_or_else(|| StoreError::not_found(format!("alias of {}", component)))
    }
}
