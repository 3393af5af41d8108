//! Error types for sndp-ps
//!
//! Module-specific error types using thiserror for clear error
//! propagation.

use thiserror::Error;

/// Main error type for the sndp-ps module
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Errors bubbled up from the common library (store, settings)
    #[error(transparent)]
    Common(#[from] sndp_common::Error),

    /// Exact wake-capable alarm registration is not granted
    ///
    /// Surfaced before registration is attempted; the caller is
    /// expected to obtain the capability and retry.
    #[error("Exact alarm capability denied: {0}")]
    CapabilityDenied(String),

    /// Alarm registry errors
    #[error("Alarm error: {0}")]
    Alarm(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the underlying cause is a missing resource
    ///
    /// The trigger handler uses this to turn "profile deleted between
    /// scheduling and firing" into a graceful no-op.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::Common(sndp_common::Error::NotFound(_))
        )
    }
}

/// Convenience Result type using the sndp-ps Error
pub type Result<T> = std::result::Result<T, Error>;
