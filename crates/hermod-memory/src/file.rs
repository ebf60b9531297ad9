//! Flat-file identity backend: the whole mapping as one JSON object.

use crate::identity::{IdentityBackend, NickMap};
use hermod_types::error::{HermodError, HermodResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// JSON mapping file. Each write re-reads the file, applies one entry and
/// replaces the file atomically.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl IdentityBackend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self) -> HermodResult<NickMap> {
        let contents = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(NickMap::new()),
            Err(e) => return Err(HermodError::Memory(format!("{}: {e}", self.path.display()))),
        };
        if contents.is_empty() {
            return Ok(NickMap::new());
        }
        serde_json::from_slice(&contents)
            .map_err(|e| HermodError::Serialization(format!("{}: {e}", self.path.display())))
    }

    fn upsert(&self, sender: &str, nick: &str) -> HermodResult<()> {
        // Entries written by other stores since our load must survive.
        let mut mapping = self.load()?;
        mapping.insert(sender.to_string(), nick.to_string());
        let json = serde_json::to_vec_pretty(&mapping)
            .map_err(|e| HermodError::Serialization(e.to_string()))?;
        // Write next to the target and rename so readers never see a partial file.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| HermodError::Memory(format!("{}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityStore;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nicks.json"));
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nicks.json");
        std::fs::write(&path, b"not json").unwrap();
        let backend = FileBackend::new(&path);
        assert!(matches!(
            backend.load(),
            Err(HermodError::Serialization(_))
        ));
    }

    #[test]
    fn test_set_name_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nicks.json");

        let store = IdentityStore::load(Box::new(FileBackend::new(&path)), "Anon").unwrap();
        assert_eq!(store.set_name("+155500099", "Al"), Some("Al".to_string()));
        assert_eq!(store.set_name("+155500100", "Bea"), Some("Bea".to_string()));
        drop(store);

        let reloaded = IdentityStore::load(Box::new(FileBackend::new(&path)), "Anon").unwrap();
        assert_eq!(reloaded.resolve("+155500099"), "Al");
        assert_eq!(reloaded.resolve("+155500100"), "Bea");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_stores_sharing_a_file_keep_each_others_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nicks.json");

        let admin = IdentityStore::load(Box::new(FileBackend::new(&path)), "Anon").unwrap();
        let bridge = IdentityStore::load(Box::new(FileBackend::new(&path)), "Anon").unwrap();
        assert_eq!(admin.set_name("cli-user", "Cli"), Some("Cli".to_string()));
        assert_eq!(bridge.set_name("bridge-user", "Bri"), Some("Bri".to_string()));

        let reloaded = IdentityStore::load(Box::new(FileBackend::new(&path)), "Anon").unwrap();
        assert_eq!(reloaded.get("cli-user"), Some("Cli".to_string()));
        assert_eq!(reloaded.get("bridge-user"), Some("Bri".to_string()));
    }

    #[test]
    fn test_corrupt_file_blocks_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nicks.json");
        let store = IdentityStore::load(Box::new(FileBackend::new(&path)), "Anon").unwrap();
        std::fs::write(&path, b"{ broken").unwrap();

        assert_eq!(store.set_name("+155500099", "Al"), None);
        assert_eq!(std::fs::read(&path).unwrap(), b"{ broken");
    }

    #[test]
    fn test_unwritable_path_fails_without_changing_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("nicks.json");
        let store = IdentityStore::load(Box::new(FileBackend::new(&path)), "Anon").unwrap();
        assert_eq!(store.set_name("+155500099", "Al"), None);
        assert!(store.is_empty());
    }
}
