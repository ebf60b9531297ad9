//! Kernel-specific error types.

use hermod_channels::types::TransportError;
use hermod_types::error::HermodError;
use thiserror::Error;

/// Kernel error type wrapping HermodError with lifecycle context.
#[derive(Error, Debug)]
pub enum KernelError {
    /// A wrapped HermodError.
    #[error(transparent)]
    Hermod(#[from] HermodError),

    /// Neither session restore nor interactive login succeeded.
    #[error("Login failed: {0}")]
    Login(TransportError),

    /// The post-login liveness probe failed or answered negatively.
    #[error("Connectivity check failed: {0}")]
    ConnectivityCheck(String),

    /// Restoring the connection after a connection failure did not work.
    #[error("Restore failed: {0}")]
    ReconnectFailed(TransportError),

    /// Disconnecting or persisting the final session failed.
    #[error("Shutdown failed: {0}")]
    Shutdown(String),
}

/// Alias for kernel results.
pub type KernelResult<T> = Result<T, KernelError>;
