//! Bridge engine for the Hermod group bridge.
//!
//! Converts chat-network events into lines on every configured bridge
//! (file-backed bridges plus an optional Telegram channel), and follows the
//! relay infile to send lines written by those bridges back into the group.

pub mod backpressure;
pub mod directive;
pub mod dispatcher;
pub mod fanout;
pub mod pump;
pub mod tail;
pub mod telegram;
pub mod types;
