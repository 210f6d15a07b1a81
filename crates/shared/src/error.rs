//! Error types for hostedge

use thiserror::Error;

/// Parse and validation failures on shared types
#[derive(Debug, Error)]
pub enum HostedgeError {
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors from hosting/membership lookups
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Lookup timed out")]
    Timeout,
}
