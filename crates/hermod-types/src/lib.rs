//! Core types for the Hermod group bridge.
//!
//! This crate defines the data structures shared across the Hermod crates:
//! the configuration schema, the inbound event union delivered by the chat
//! network, outgoing messages, the opaque session blob, and the shared error.

pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod session;
