//! Configuration loading from a TOML file (default `/etc/hermod.toml`).

use crate::error::KernelResult;
use hermod_types::config::{HermodConfig, DEFAULT_CONFIG_PATH};
use hermod_types::error::HermodError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Resolve the configuration path: explicit argument or the default.
pub fn config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load and validate the configuration.
///
/// Unlike optional sections, a missing or unreadable file is an error: the
/// bridged conversation has no default.
pub fn load_config(path: Option<&Path>) -> KernelResult<HermodConfig> {
    let config_path = config_path(path);
    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        HermodError::Config(format!("cannot read {}: {e}", config_path.display()))
    })?;
    let config = HermodConfig::from_toml_str(&contents).map_err(|e| match e {
        HermodError::Config(msg) => {
            HermodError::Config(format!("{}: {msg}", config_path.display()))
        }
        other => other,
    })?;

    info!(
        path = %config_path.display(),
        conversation = %config.conversation_id,
        bridges = config.bridges.len(),
        telegram = config.active_telegram().is_some(),
        identity_backend = %config.identity.backend,
        "Loaded configuration"
    );
    if config.bridges.is_empty() {
        info!("No file bridges configured");
    }
    Ok(config)
}
