//! Model artifact store engine
//!
//! This crate orchestrates the lower layers:
//! - [`ArtifactStore`]: create, save, read and query one model version
//! - Packaging: archive a model version and unpack it elsewhere with digest checking
//! - Reload: copy component artifacts between model versions
//! - Configuration via `modelstore.toml`
//!
//! The engine is the only component that knows about:
//! - Which operations need the directory lock
//! - The reserved pipeline component
//! - Cross-version copying

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod reload;
pub mod store;

pub use config::{StoreConfig, CONFIG_FILE_NAME};
pub use reload::ReloadReport;
pub use store::{
    ArtifactStore, ImportConfig, ModelProtoView, PIPELINE_COMPONENT_MODULE_NAME,
    PIPELINE_COMPONENT_NAME, PIPELINE_MODEL_ALIAS, PIPELINE_MODEL_NAME,
};
