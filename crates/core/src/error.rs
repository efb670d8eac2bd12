//! Error types for modelstore
//!
//! This module defines the error taxonomy used by every layer of the store.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors are surfaced to the immediate caller unchanged. Nothing in the store
//! retries or rolls back, so a failure in the middle of a multi-step workflow
//! leaves the model directory in an inspectable, possibly partial state.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Error types for the model-artifact store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Creating or unpacking over live content without `force_update`
    #[error("Already exists: {}", path.display())]
    AlreadyExists {
        /// Model version directory that already holds content
        path: PathBuf,
    },

    /// Missing store, component, alias or buffer
    #[error("Not found: {0}")]
    NotFound(String),

    /// Alias resolution found zero or several candidates
    #[error("Failed to detect model alias for component '{component}': {count} aliases recorded, please specify it manually")]
    AmbiguousAlias {
        /// Component whose alias was requested
        component: String,
        /// Number of aliases recorded for the component
        count: usize,
    },

    /// Archive digest does not match the expected value
    #[error("Model archive hash mismatch. path: {} expected: {expected} actual: {actual}", path.display())]
    IntegrityMismatch {
        /// Archive that was checked
        path: PathBuf,
        /// Digest supplied by the caller
        expected: String,
        /// Digest computed from the archive bytes
        actual: String,
    },

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error (JSON, YAML)
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Archive container error (zip, tar, zstd)
    #[error("Archive error: {0}")]
    Archive(String),

    /// Buffer codec failed to serialize or parse an object
    #[error("Codec error: {0}")]
    Codec(String),

    /// Malformed party model id or identity field
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Invalid or unreadable configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Caller-supplied name or argument the store cannot use
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an archive error
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Create a codec error
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid identity error
    pub fn invalid_identity(msg: impl Into<String>) -> Self {
        Self::InvalidIdentity(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error means the requested thing does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(e: serde_yaml::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
