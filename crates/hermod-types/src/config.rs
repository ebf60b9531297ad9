//! Configuration schema for the Hermod bridge.
//!
//! Every section is optional except `conversation_id`. Missing sections fall
//! back to the defaults below, which mirror a single-host `/tmp` deployment.

use crate::error::{HermodError, HermodResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/hermod.toml";

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HermodConfig {
    /// Identifier of the single bridged conversation. Required.
    pub conversation_id: String,
    /// Prefix prepended to every fan-out line so recipients can tell the origin.
    pub channel_tag: String,
    /// Where `!help` and `!setnick` notices are appended. Defaults to the relay infile,
    /// which posts them back into the conversation.
    pub notice_file: Option<PathBuf>,
    pub relay: RelayConfig,
    pub attachments: AttachmentConfig,
    pub session: SessionConfig,
    pub identity: IdentityConfig,
    /// File-backed bridge destinations, written in order.
    pub bridges: Vec<BridgeConfig>,
    /// Optional direct HTTP channel.
    pub telegram: Option<TelegramConfig>,
}

impl Default for HermodConfig {
    fn default() -> Self {
        Self {
            conversation_id: String::new(),
            channel_tag: "[WA] ".to_string(),
            notice_file: None,
            relay: RelayConfig::default(),
            attachments: AttachmentConfig::default(),
            session: SessionConfig::default(),
            identity: IdentityConfig::default(),
            bridges: Vec::new(),
            telegram: None,
        }
    }
}

impl HermodConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(contents: &str) -> HermodResult<Self> {
        let config: HermodConfig =
            toml::from_str(contents).map_err(|e| HermodError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check required values.
    pub fn validate(&self) -> HermodResult<()> {
        if self.conversation_id.trim().is_empty() {
            return Err(HermodError::Config(
                "conversation_id undefined, cannot start".to_string(),
            ));
        }
        Ok(())
    }

    /// The sink for local notices.
    pub fn notice_path(&self) -> PathBuf {
        self.notice_file
            .clone()
            .unwrap_or_else(|| self.relay.infile.clone())
    }

    /// Paths of all file-backed bridges, in configuration order.
    pub fn bridge_paths(&self) -> Vec<PathBuf> {
        self.bridges.iter().map(|b| b.path.clone()).collect()
    }

    /// The HTTP channel, if both token and destination are set.
    pub fn active_telegram(&self) -> Option<&TelegramConfig> {
        self.telegram
            .as_ref()
            .filter(|t| !t.token.is_empty() && !t.chat_id.is_empty())
    }
}

/// Outbound relay pump settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Append-only file followed by the relay pump.
    pub infile: PathBuf,
    /// How often the infile is polled for new lines.
    pub poll_interval_ms: u64,
    /// How long to wait after a connection failure before restoring.
    pub reconnect_wait_secs: u64,
    /// Origin tag (e.g. `TEL`) to base URL, used when an attachment upload
    /// fails and a link is sent instead.
    pub link_origins: BTreeMap<String, String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            infile: PathBuf::from("/tmp/towhatsapp.log"),
            poll_interval_ms: 250,
            reconnect_wait_secs: 30,
            link_origins: BTreeMap::new(),
        }
    }
}

/// Where received attachments are stored and served from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentConfig {
    pub dir: PathBuf,
    /// Base URL of the static file server exposing `dir`.
    pub url: String,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/tmp"),
            url: "http://example.org/whatsapp".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/tmp/whatsappsession.bin"),
        }
    }
}

/// Identity store persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityBackendKind {
    /// Flat JSON mapping file, rewritten on every change.
    #[default]
    File,
    /// SQLite database with a `nicks` table.
    Sqlite,
}

impl std::fmt::Display for IdentityBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityBackendKind::File => write!(f, "file"),
            IdentityBackendKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub backend: IdentityBackendKind,
    pub path: PathBuf,
    /// Prefix for synthesized names of senders without a nickname.
    pub anon_prefix: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            backend: IdentityBackendKind::File,
            path: PathBuf::from("/tmp/whatsapp-nicks.json"),
            anon_prefix: "Anonymous".to_string(),
        }
    }
}

/// A file-backed bridge destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Short label used in logs.
    #[serde(default)]
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            chat_id: String::new(),
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_conversation_is_rejected() {
        let err = HermodConfig::from_toml_str("channel_tag = \"[X] \"").unwrap_err();
        assert!(matches!(err, HermodError::Config(_)));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = HermodConfig::from_toml_str("conversation_id = \"group@g.us\"").unwrap();
        assert_eq!(config.conversation_id, "group@g.us");
        assert_eq!(config.channel_tag, "[WA] ");
        assert_eq!(config.relay.reconnect_wait_secs, 30);
        assert_eq!(config.identity.backend, IdentityBackendKind::File);
        assert!(config.bridges.is_empty());
        assert!(config.active_telegram().is_none());
        assert_eq!(config.notice_path(), config.relay.infile);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            conversation_id = "group@g.us"
            notice_file = "/var/log/notices.log"

            [relay]
            infile = "/srv/in.log"

            [relay.link_origins]
            TEL = "http://example.org/telegram"

            [identity]
            backend = "sqlite"
            path = "/srv/nicks.db"

            [[bridges]]
            name = "irc"
            path = "/srv/toirc.log"

            [[bridges]]
            path = "/srv/tomatrix.log"

            [telegram]
            token = "abc"
            chat_id = "-100"
        "#;
        let config = HermodConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.identity.backend, IdentityBackendKind::Sqlite);
        assert_eq!(
            config.bridge_paths(),
            vec![
                PathBuf::from("/srv/toirc.log"),
                PathBuf::from("/srv/tomatrix.log")
            ]
        );
        assert_eq!(
            config.relay.link_origins.get("TEL").map(String::as_str),
            Some("http://example.org/telegram")
        );
        assert_eq!(config.notice_path(), PathBuf::from("/var/log/notices.log"));
        let telegram = config.active_telegram().unwrap();
        assert_eq!(telegram.api_base, "https://api.telegram.org");
    }

    #[test]
    fn test_telegram_requires_token_and_chat() {
        let config =
            HermodConfig::from_toml_str("conversation_id = \"g\"\n[telegram]\ntoken = \"abc\"")
                .unwrap();
        assert!(config.telegram.is_some());
        assert!(config.active_telegram().is_none());
    }
}
