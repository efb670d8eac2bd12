//! Core types for modelstore
//!
//! This crate defines the foundational types shared by every layer:
//! - ModelIdentity: party model id + version, the root of all path derivation
//! - StoreError: error taxonomy for store, archive and reload operations
//! - ComponentModel / BufferEntry: in-memory unit of work for the write path
//! - BufferCodec: seam to the external buffer serializer
//! - DefineMeta: the metadata index document (`define_meta.yaml`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod codec;
pub mod error;
pub mod identity;
pub mod meta;

pub use buffer::{
    collect_key, BufferEntry, BufferOutput, CollectFormat, CollectedModels, ComponentModel,
    OutputFormat, RunParameters,
};
pub use codec::{BufferCodec, JsonCodec, RawCodec, RAW_TYPE_NAME};
pub use error::{StoreError, StoreResult};
pub use identity::ModelIdentity;
pub use meta::{ComponentDefine, ComponentModelProto, DefineMeta, ModelProtoIndex};
