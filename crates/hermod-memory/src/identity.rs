//! In-memory nickname mapping with write-through persistence.

use hermod_types::error::HermodResult;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, warn};

/// Sender address → display nickname.
pub type NickMap = HashMap<String, String>;

/// Label used when a sender address is too short to anonymize.
const GENERIC_ANON: &str = "Anonymous";

/// Number of leading characters of the local part hidden by anonymization.
const HIDDEN_PREFIX_LEN: usize = 7;

/// Persistence backend for the identity mapping.
pub trait IdentityBackend: Send + Sync {
    /// Backend label for logs.
    fn name(&self) -> &str;

    /// Load the full mapping. A backend with no data yet returns an empty map.
    fn load(&self) -> HermodResult<NickMap>;

    /// Persist `sender → nick`, keeping every other stored entry as it is on
    /// disk. Another store may share the same backing file or database.
    fn upsert(&self, sender: &str, nick: &str) -> HermodResult<()>;
}

/// Anonymized display name for a sender with no nickname.
///
/// Takes the part before `@`, hides its first seven characters and appends
/// the rest to `prefix` (`"31612345678@s.whatsapp.net"` → `"<prefix>-5678"`).
pub fn anonymize(sender: &str, prefix: &str) -> String {
    let local = sender.split('@').next().unwrap_or_default();
    if local.chars().count() > HIDDEN_PREFIX_LEN + 1 {
        let suffix: String = local.chars().skip(HIDDEN_PREFIX_LEN).collect();
        format!("{prefix}-{suffix}")
    } else {
        GENERIC_ANON.to_string()
    }
}

/// Nickname store shared by the inbound dispatcher and the CLI.
pub struct IdentityStore {
    nicks: Mutex<NickMap>,
    backend: Box<dyn IdentityBackend>,
    anon_prefix: String,
}

impl IdentityStore {
    /// Load the whole mapping from `backend` into memory.
    pub fn load(backend: Box<dyn IdentityBackend>, anon_prefix: &str) -> HermodResult<Self> {
        let nicks = backend.load()?;
        info!(
            backend = backend.name(),
            count = nicks.len(),
            "Loaded nicknames"
        );
        Ok(Self {
            nicks: Mutex::new(nicks),
            backend,
            anon_prefix: anon_prefix.to_string(),
        })
    }

    /// Display name for `sender`: the stored nickname, or an anonymized one.
    pub fn resolve(&self, sender: &str) -> String {
        let nicks = self.nicks.lock().unwrap_or_else(|e| e.into_inner());
        match nicks.get(sender) {
            Some(nick) => nick.clone(),
            None => anonymize(sender, &self.anon_prefix),
        }
    }

    /// Set the nickname for `sender`.
    ///
    /// Returns the new nickname once it is persisted. Returns `None` when
    /// either argument is empty or the backend write fails; in both cases the
    /// mapping is left as it was.
    pub fn set_name(&self, sender: &str, nick: &str) -> Option<String> {
        let sender = sender.trim();
        let nick = nick.trim();
        if sender.is_empty() || nick.is_empty() {
            return None;
        }

        let mut nicks = self.nicks.lock().unwrap_or_else(|e| e.into_inner());
        let previous = nicks.insert(sender.to_string(), nick.to_string());
        match self.backend.upsert(sender, nick) {
            Ok(()) => {
                info!(backend = self.backend.name(), %sender, %nick, "Nickname saved");
                Some(nick.to_string())
            }
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "Saving nickname failed");
                match previous {
                    Some(old) => nicks.insert(sender.to_string(), old),
                    None => nicks.remove(sender),
                };
                None
            }
        }
    }

    /// Stored nickname for `sender`, without the anonymous fallback.
    pub fn get(&self, sender: &str) -> Option<String> {
        let nicks = self.nicks.lock().unwrap_or_else(|e| e.into_inner());
        nicks.get(sender).cloned()
    }

    /// All mappings sorted by sender.
    pub fn entries(&self) -> Vec<(String, String)> {
        let nicks = self.nicks.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<_> = nicks
            .iter()
            .map(|(s, n)| (s.clone(), n.clone()))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.nicks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
