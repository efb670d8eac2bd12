//! Durability layer for modelstore
//!
//! This crate handles everything that touches disk below the store API:
//!
//! - Paths: the model version directory layout
//! - Lock: reentrant, process-wide, OS-advisory directory lock
//! - Archive: zip / tar.zst packaging and extraction of a model version
//! - Digest: SHA-256 of archive bytes for transport integrity
//! - Fsutil: atomic writes, tree copy and size

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod digest;
pub mod fsutil;
pub mod lock;
pub mod paths;

pub use archive::{ArchiveFormat, ArchiveInfo, ArchiveReader, ArchiveWriter};
pub use digest::{sha256_file, sha256_hex, verify_file};
pub use fsutil::{copy_tree, tree_size, write_atomic};
pub use lock::{DirLock, DirLockGuard};
pub use paths::{
    ModelPaths, DEFINE_META_FILE_NAME, IMPORT_CONFIG_FILE_NAME, LOCK_FILE_NAME,
    RUN_PARAMETERS_FILE_NAME,
};
