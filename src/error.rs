//! Unified error types for netrig

use std::io;
use thiserror::Error;

/// Main error type for netrig operations
///
/// Every failed backend invocation is classified at the call site into
/// one of these kinds; "not found" is never an error but a normal
/// `false`/`None` return.
#[derive(Error, Debug)]
pub enum Error {
    // IO errors (tool could not be spawned at all)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Link device errors
    #[error("device already exists: {0}")]
    AlreadyExists(String),

    #[error("illegal device name: {0}")]
    IllegalName(String),

    #[error("illegal operation: {0}")]
    IllegalOperation(String),

    #[error("backend tool failed with exit code {code}: {stderr}")]
    UnknownBackend { code: i32, stderr: String },

    // Sysctl errors (unclassified, raw diagnostic text only)
    #[error("sysctl failed: {0}")]
    SystemControl(String),

    // Platform errors
    #[error("host platform '{0}' is not supported")]
    UnsupportedPlatform(String),
}

/// Result type alias for netrig operations
pub type Result<T> = std::result::Result<T, Error>;
