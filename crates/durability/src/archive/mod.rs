//! Model archives: a whole model version directory in one file
//!
//! ## Formats
//!
//! ```text
//! <role#partyId#id>_<version>.zip       : zip container, Deflate (default)
//! <role#partyId#id>_<version>.tar.zst   : tar stream compressed with zstd
//! ```
//!
//! Entries are relative to the model version directory, so unpacking into a
//! different version directory relocates the model. The `.lock` marker is
//! never archived.
//!
//! ## Design Principles
//!
//! - **Atomic**: archives are written to a temp file and renamed into place
//! - **Deterministic**: entries sorted by path, timestamps fixed, so the same
//!   tree packaged twice has the same digest
//! - **Verifiable**: the SHA-256 of the archive bytes is the transport token

pub mod format;
pub mod reader;
pub mod writer;

pub use format::ArchiveFormat;
pub use reader::ArchiveReader;
pub use writer::{ArchiveInfo, ArchiveWriter};
