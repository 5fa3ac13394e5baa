//! types.rs
//! Crate-wide, user-visible error type.
//!
//! Only failures of the software path surface here. Hardware failures are
//! absorbed by the dispatcher and never reach the storage engine.

use thiserror::Error;

use crate::compression::SoftwareError;

/// Result alias for codec operations exposed to the storage engine.
pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Software compression failed; there is no further fallback.
    #[error("cannot compress: {0}")]
    Compress(#[source] SoftwareError),

    /// Software decompression failed; there is no further fallback.
    #[error("cannot decompress: {0}")]
    Decompress(#[source] SoftwareError),

    /// No codec registered under this method byte.
    #[error("unknown compression method: {0}")]
    UnknownMethod(String),

    /// No codec registered under this name.
    #[error("unknown compression codec name: {0}")]
    UnknownName(String),

    /// Accelerator configuration could not be parsed.
    #[error("invalid accelerator config: {0}")]
    Config(#[from] serde_json::Error),
}
