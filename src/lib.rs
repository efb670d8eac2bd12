//! modelstore - versioned, directory-backed store for ML pipeline artifacts
//!
//! Each model version lives in its own directory under a configured root and
//! holds typed, serialized component buffers, per-component run parameters and
//! a YAML metadata index. Versions can be packaged into a single archive,
//! verified by SHA-256 and unpacked on another host.
//!
//! # Quick Start
//!
//! ```ignore
//! use modelstore::{ArtifactStore, BufferEntry, ComponentModel, ModelIdentity, StoreConfig};
//!
//! let config = StoreConfig::from_file("modelstore.toml".as_ref())?;
//! let identity = ModelIdentity::parse("guest#9999#model_1", "202601010000")?;
//! let store = ArtifactStore::open(config, identity)?;
//!
//! store.create()?;
//! store.save_component_model(
//!     ComponentModel::new("hetero_lr_0", "HeteroLR", "model")
//!         .with_buffer("param", BufferEntry::new("LRModelParam", bytes)),
//! )?;
//! let digest = store.package_model()?;
//! ```
//!
//! # Architecture
//!
//! - `modelstore-core`: identity, buffers, codec trait, metadata index, errors
//! - `modelstore-durability`: paths, directory lock, archives, digests
//! - `modelstore-engine`: the store itself, reload and configuration

pub use modelstore_core::*;
pub use modelstore_durability::{
    sha256_file, ArchiveFormat, ArchiveReader, ArchiveWriter, DirLock, ModelPaths,
};
pub use modelstore_engine::*;
