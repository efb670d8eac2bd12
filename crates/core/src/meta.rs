//! Metadata index document (`define/define_meta.yaml`)
//!
//! The index is the single source of truth for which buffers exist in a model
//! version:
//!
//! ```yaml
//! component_define:
//!   hetero_lr_0:
//!     module_name: HeteroLR
//! model_proto:
//!   hetero_lr_0:
//!     model:
//!       param: LRModelParam
//!       meta: LRModelMeta
//! ```
//!
//! Updates are merges. Saving a second alias for a component never erases
//! the first, and re-saving a buffer name replaces its type tag in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Buffer name → buffer type tag for one `(component, alias)` pair
pub type ModelProtoIndex = BTreeMap<String, String>;

/// Alias → buffer index for one component
pub type ComponentModelProto = BTreeMap<String, ModelProtoIndex>;

/// Definition of one component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefine {
    /// Module implementing the component
    #[serde(default)]
    pub module_name: String,
    /// Keys written by other tools, preserved on rewrite
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ComponentDefine {
    /// Definition with only a module name
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            extra: BTreeMap::new(),
        }
    }
}

/// The whole metadata index of a model version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefineMeta {
    /// component → definition
    #[serde(default)]
    pub component_define: BTreeMap<String, ComponentDefine>,
    /// component → alias → buffer name → type tag
    #[serde(default)]
    pub model_proto: BTreeMap<String, ComponentModelProto>,
    /// Top-level keys written by other tools, preserved on rewrite
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl DefineMeta {
    /// Parse from YAML text. Empty text is an empty index.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Render as YAML text.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Merge one `(component, alias)` index and the component's module name.
    ///
    /// Other aliases of the component are left untouched; buffer names already
    /// present under this alias are overwritten with the new type tag.
    pub fn merge_component(
        &mut self,
        component: &str,
        module_name: &str,
        alias: &str,
        proto_index: &ModelProtoIndex,
    ) {
        self.component_define
            .entry(component.to_string())
            .or_default()
            .module_name = module_name.to_string();

        let alias_index = self
            .model_proto
            .entry(component.to_string())
            .or_default()
            .entry(alias.to_string())
            .or_default();
        for (buffer_name, type_name) in proto_index {
            alias_index.insert(buffer_name.clone(), type_name.clone());
        }
    }

    /// Every alias recorded for a component
    pub fn component_model_proto(&self, component: &str) -> Option<&ComponentModelProto> {
        self.model_proto.get(component)
    }

    /// Buffer index for one `(component, alias)` pair
    pub fn proto_index(&self, component: &str, alias: &str) -> Option<&ModelProtoIndex> {
        self.model_proto.get(component)?.get(alias)
    }

    /// Module name recorded for a component
    pub fn module_name(&self, component: &str) -> Option<&str> {
        self.component_define
            .get(component)
            .map(|define| define.module_name.as_str())
    }

    /// Iterate every `(component, alias, buffer name, type tag)` recorded
    pub fn buffers(&self) -> impl Iterator<Item = (&str, &str, &str, &str)> {
        self.model_proto.iter().flat_map(|(component, aliases)| {
            aliases.iter().flat_map(move |(alias, index)| {
                index.iter().map(move |(buffer_name, type_name)| {
                    (
                        component.as_str(),
                        alias.as_str(),
                        buffer_name.as_str(),
                        type_name.as_str(),
                    )
                })
            })
        })
    }
}
