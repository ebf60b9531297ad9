//! Runtime for the Hermod group bridge.
//!
//! Loads the configuration, authenticates against the chat network, keeps
//! the connection alive, and runs the inbound dispatcher and the outbound
//! relay pump until shutdown.

pub mod config;
pub mod error;
pub mod kernel;
pub mod lifecycle;
pub mod session;
pub mod supervisor;

pub use kernel::HermodKernel;
