//! Identity store for the Hermod group bridge.
//!
//! Maps chat-network sender addresses to display nicknames. The mapping is
//! loaded once into memory and every change is written straight through to
//! one of two persistence backends:
//! - **File** (`file`): the whole mapping as a JSON object, rewritten atomically
//! - **SQLite** (`sqlite`): a `nicks` table upserted one row at a time

pub mod file;
pub mod identity;
pub mod migration;
pub mod sqlite;

pub use identity::{anonymize, IdentityBackend, IdentityStore, NickMap};

use file::FileBackend;
use hermod_types::config::{IdentityBackendKind, IdentityConfig};
use hermod_types::error::HermodResult;
use sqlite::SqliteBackend;

/// Open the backend selected by the configuration and load the store from it.
pub fn open_store(config: &IdentityConfig) -> HermodResult<IdentityStore> {
    let backend: Box<dyn IdentityBackend> = match config.backend {
        IdentityBackendKind::File => Box::new(FileBackend::new(&config.path)),
        IdentityBackendKind::Sqlite => Box::new(SqliteBackend::open(&config.path)?),
    };
    IdentityStore::load(backend, &config.anon_prefix)
}
