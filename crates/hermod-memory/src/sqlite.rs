//! SQLite identity backend: one `nicks` row per sender.

use crate::identity::{IdentityBackend, NickMap};
use crate::migration::run_migrations;
use chrono::Utc;
use hermod_types::error::{HermodError, HermodResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Nickname table backed by SQLite.
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open (or create) the database at `path` and migrate it.
    pub fn open(path: &Path) -> HermodResult<Self> {
        let conn = Connection::open(path).map_err(|e| HermodError::Memory(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection, running migrations first.
    pub fn from_connection(conn: Connection) -> HermodResult<Self> {
        run_migrations(&conn).map_err(|e| HermodError::Memory(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl IdentityBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn load(&self) -> HermodResult<NickMap> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| HermodError::Memory(e.to_string()))?;
        let mut stmt = conn
            .prepare("SELECT sender, nick FROM nicks")
            .map_err(|e| HermodError::Memory(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                let sender: String = row.get(0)?;
                let nick: String = row.get(1)?;
                Ok((sender, nick))
            })
            .map_err(|e| HermodError::Memory(e.to_string()))?;

        let mut nicks = NickMap::new();
        for row in rows {
            let (sender, nick) = row.map_err(|e| HermodError::Memory(e.to_string()))?;
            nicks.insert(sender, nick);
        }
        Ok(nicks)
    }

    fn upsert(&self, sender: &str, nick: &str) -> HermodResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| HermodError::Memory(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO nicks (sender, nick, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(sender) DO UPDATE SET nick = ?2, updated_at = ?3",
            rusqlite::params![sender, nick, now],
        )
        .map_err(|e| HermodError::Memory(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityStore;

    fn setup() -> SqliteBackend {
        let conn = Connection::open_in_memory().unwrap();
        SqliteBackend::from_connection(conn).unwrap()
    }

    #[test]
    fn test_upsert_and_load() {
        let backend = setup();
        backend.upsert("a@x", "Alice").unwrap();
        backend.upsert("b@x", "Bob").unwrap();
        let nicks = backend.load().unwrap();
        assert_eq!(nicks.len(), 2);
        assert_eq!(nicks.get("a@x").map(String::as_str), Some("Alice"));
    }

    #[test]
    fn test_upsert_replaces_existing_row() {
        let backend = setup();
        backend.upsert("a@x", "Alice").unwrap();
        backend.upsert("a@x", "Ally").unwrap();
        let nicks = backend.load().unwrap();
        assert_eq!(nicks.len(), 1);
        assert_eq!(nicks.get("a@x").map(String::as_str), Some("Ally"));
    }

    #[test]
    fn test_store_round_trip_through_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nicks.db");

        let store =
            IdentityStore::load(Box::new(SqliteBackend::open(&path).unwrap()), "Anon").unwrap();
        assert_eq!(store.set_name("+155500099", "Al"), Some("Al".to_string()));
        drop(store);

        let reloaded =
            IdentityStore::load(Box::new(SqliteBackend::open(&path).unwrap()), "Anon").unwrap();
        assert_eq!(reloaded.resolve("+155500099"), "Al");
    }
}
