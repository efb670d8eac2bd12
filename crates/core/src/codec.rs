//! Buffer codec seam.
//!
//! The store never interprets buffer bytes. Turning objects into bytes and
//! back, resolved by the type tag recorded in the metadata index, is the job
//! of a [`BufferCodec`] supplied at store construction.

use crate::error::{StoreError, StoreResult};
use serde_json::Value;

/// Serializer for typed component buffers.
///
/// # Thread Safety
///
/// Codecs must be `Send + Sync` so one store can be shared between threads.
pub trait BufferCodec: Send + Sync {
    /// In-memory representation of a decoded buffer
    type Object;

    /// Serialize an object to the bytes written to disk.
    fn serialize(&self, object: &Self::Object) -> StoreResult<Vec<u8>>;

    /// Parse bytes previously produced by `serialize` for `type_name`.
    fn parse(&self, type_name: &str, data: &[u8]) -> StoreResult<Self::Object>;

    /// Type tag recorded in the metadata index for this object.
    fn type_name(&self, object: &Self::Object) -> String;

    /// Structured mirror written next to the buffer, if the codec can produce one.
    fn to_json(&self, _object: &Self::Object) -> Option<Value> {
        None
    }
}

/// Codec that treats buffers as opaque bytes.
///
/// Parsing returns the stored bytes unchanged; used when a store is only
/// moved, copied or packaged and never decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

/// Type tag reported by [`RawCodec`]
pub const RAW_TYPE_NAME: &str = "bytes";

impl BufferCodec for RawCodec {
    type Object = Vec<u8>;

    fn serialize(&self, object: &Vec<u8>) -> StoreResult<Vec<u8>> {
        Ok(object.clone())
    }

    fn parse(&self, _type_name: &str, data: &[u8]) -> StoreResult<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn type_name(&self, _object: &Vec<u8>) -> String {
        RAW_TYPE_NAME.to_string()
    }
}

/// Codec for buffers holding JSON documents.
///
/// Handy for pipeline summaries and tests; the structured mirror is the
/// document itself.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    type_name: String,
}

impl JsonCodec {
    /// Codec reporting `type_name` for every object
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }
}

impl BufferCodec for JsonCodec {
    type Object = Value;

    fn serialize(&self, object: &Value) -> StoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(object)?)
    }

    fn parse(&self, type_name: &str, data: &[u8]) -> StoreResult<Value> {
        serde_json::from_slice(data)
            .map_err(|e| StoreError::codec(format!("parse {}: {}", type_name, e)))
    }

    fn type_name(&self, _object: &Value) -> String {
        self.type_name.clone()
    }

    fn to_json(&self, object: &Value) -> Option<Value> {
        Some(object.clone())
    }
}
