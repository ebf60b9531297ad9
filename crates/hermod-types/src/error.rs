//! Shared error types for the Hermod bridge.

use thiserror::Error;

/// Top-level error type for the Hermod bridge.
#[derive(Error, Debug)]
pub enum HermodError {
    /// A configuration error occurred (missing or invalid required values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A local I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The identity store backend failed.
    #[error("Memory error: {0}")]
    Memory(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The chat-network transport reported a failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Reading or writing the persisted session failed.
    #[error("Session error: {0}")]
    Session(String),
}

/// Alias for Hermod results.
pub type HermodResult<T> = Result<T, HermodError>;
