//! Component buffers
//!
//! A component run produces a set of named, typed, serialized buffers. The
//! write path consumes them as a [`ComponentModel`]; the read paths hand them
//! back in the shape selected by [`OutputFormat`] or [`CollectFormat`].

use serde_json::Value;
use std::collections::BTreeMap;

/// Free-form parameters recorded for a component at save time.
pub type RunParameters = Value;

/// One serialized buffer as produced by a component.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferEntry {
    /// Type tag resolved by the buffer codec (e.g. a protobuf message name)
    pub type_name: String,
    /// Serialized bytes, written verbatim to disk
    pub serialized: Vec<u8>,
    /// Human-readable mirror written as `<bufferName>.json`, if available
    pub json: Option<Value>,
}

impl BufferEntry {
    /// Buffer without a structured mirror
    pub fn new(type_name: impl Into<String>, serialized: impl Into<Vec<u8>>) -> Self {
        Self {
            type_name: type_name.into(),
            serialized: serialized.into(),
            json: None,
        }
    }

    /// Attach the structured mirror
    pub fn with_json(mut self, json: Value) -> Self {
        self.json = Some(json);
        self
    }
}

/// In-memory unit of work for `save_component_model`.
///
/// Built by the caller, consumed once by the write path.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentModel {
    /// Component (pipeline stage) name
    pub component_name: String,
    /// Module implementing the component
    pub component_module_name: String,
    /// Alias grouping this set of buffers under the component
    pub model_alias: String,
    /// Buffers keyed by buffer name
    pub buffers: BTreeMap<String, BufferEntry>,
    /// Parameters recorded alongside the buffers; `{}` when absent
    pub run_parameters: Option<RunParameters>,
}

impl ComponentModel {
    /// Empty component model
    pub fn new(
        component_name: impl Into<String>,
        component_module_name: impl Into<String>,
        model_alias: impl Into<String>,
    ) -> Self {
        Self {
            component_name: component_name.into(),
            component_module_name: component_module_name.into(),
            model_alias: model_alias.into(),
            buffers: BTreeMap::new(),
            run_parameters: None,
        }
    }

    /// Add (or replace) a named buffer
    pub fn with_buffer(mut self, buffer_name: impl Into<String>, entry: BufferEntry) -> Self {
        self.buffers.insert(buffer_name.into(), entry);
        self
    }

    /// Record run parameters
    pub fn with_run_parameters(mut self, run_parameters: RunParameters) -> Self {
        self.run_parameters = Some(run_parameters);
        self
    }

    /// Buffer name → type tag, as merged into the metadata index
    pub fn proto_index(&self) -> BTreeMap<String, String> {
        self.buffers
            .iter()
            .map(|(name, entry)| (name.clone(), entry.type_name.clone()))
            .collect()
    }
}

/// Shape of buffers returned by `read_component_model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Decode through the buffer codec
    #[default]
    Parsed,
    /// Return the structured JSON mirror
    Json,
    /// Return `[typeTag, base64(bytes)]`
    Encoded,
}

/// One buffer as returned by a read.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferOutput<O> {
    /// Object decoded by the buffer codec
    Parsed(O),
    /// Structured mirror; `Value::Null` when the sidecar is missing
    Json(Value),
    /// Type tag plus standard base64 of the serialized bytes
    Encoded {
        /// Type tag recorded in the metadata index
        type_name: String,
        /// Base64-encoded serialized bytes
        data: String,
    },
}

impl<O> BufferOutput<O> {
    /// The decoded object, if this output was parsed
    pub fn into_parsed(self) -> Option<O> {
        match self {
            Self::Parsed(object) => Some(object),
            _ => None,
        }
    }

    /// `(type_name, base64)` if this output was encoded
    pub fn as_encoded(&self) -> Option<(&str, &str)> {
        match self {
            Self::Encoded { type_name, data } => Some((type_name, data)),
            _ => None,
        }
    }

    /// The structured mirror, if this output was JSON
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Shape of the result of `collect_models`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectFormat {
    /// Decoded objects keyed by buffer name
    #[default]
    Parsed,
    /// Raw bytes keyed by `component.alias:bufferName`
    Bytes,
    /// Base64 strings keyed by `component.alias:bufferName`
    Base64,
}

/// Every buffer recorded in a store.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectedModels<O> {
    /// Decoded objects keyed by buffer name
    Parsed(BTreeMap<String, O>),
    /// Raw bytes keyed by `component.alias:bufferName`
    Bytes(BTreeMap<String, Vec<u8>>),
    /// Base64 strings keyed by `component.alias:bufferName`
    Base64(BTreeMap<String, String>),
}

impl<O> CollectedModels<O> {
    /// Number of collected buffers
    pub fn len(&self) -> usize {
        match self {
            Self::Parsed(m) => m.len(),
            Self::Bytes(m) => m.len(),
            Self::Base64(m) => m.len(),
        }
    }

    /// True if nothing was collected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Composite key used by `collect_models` in byte mode.
///
/// Unique because `(component, alias, bufferName)` triples are unique in the index.
pub fn collect_key(component: &str, alias: &str, buffer_name: &str) -> String {
    format!("{}.{}:{}", component, alias, buffer_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_model_builder() {
        let model = ComponentModel::new("hetero_lr_0", "HeteroLR", "model")
            .with_buffer("param", BufferEntry::new("LRModelParam", vec![1, 2]))
            .with_buffer(
                "meta",
                BufferEntry::new("LRModelMeta", vec![3]).with_json(json!({"penalty": "L2"})),
            )
            .with_run_parameters(json!({"max_iter": 10}));

        assert_eq!(model.buffers.len(), 2);
        assert_eq!(model.buffers["meta"].json, Some(json!({"penalty": "L2"})));

        let index = model.proto_index();
        assert_eq!(index["param"], "LRModelParam");
        assert_eq!(index["meta"], "LRModelMeta");
    }

    #[test]
    fn test_buffer_output_accessors() {
        let out: BufferOutput<Vec<u8>> = BufferOutput::Encoded {
            type_name: "T".to_string(),
            data: "AQI=".to_string(),
        };
        assert_eq!(out.as_encoded(), Some(("T", "AQI=")));
        assert!(out.as_json().is_none());
        assert!(out.into_parsed().is_none());

        let out: BufferOutput<Vec<u8>> = BufferOutput::Parsed(vec![9]);
        assert_eq!(out.into_parsed(), Some(vec![9]));
    }

    #[test]
    fn test_collect_key() {
        assert_eq!(collect_key("lr", "model", "param"), "lr.model:param");
    }

    #[test]
    fn test_collected_len() {
        let mut m = BTreeMap::new();
        m.insert("a".to_string(), "x".to_string());
        let collected: CollectedModels<()> = CollectedModels::Base64(m);
        assert_eq!(collected.len(), 1);
        assert!(!collected.is_empty());
    }
}
