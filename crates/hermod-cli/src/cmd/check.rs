use crate::ui;
use hermod_types::config::HermodConfig;
use std::path::Path;

/// `hermod check`: load the configuration and print what the bridge would do.
pub fn cmd_check(config_path: Option<&Path>) -> Result<(), String> {
    let config = hermod_kernel::config::load_config(config_path).map_err(|e| e.to_string())?;
    let path = hermod_kernel::config::config_path(config_path);

    ui::section("Configuration");
    ui::kv("File", &path.display().to_string());
    ui::kv("Group", &config.conversation_id);
    ui::kv("Tag", &format!("{:?}", config.channel_tag));
    ui::blank();

    ui::section("Relay");
    ui::kv("Infile", &config.relay.infile.display().to_string());
    ui::kv("Notices", &config.notice_path().display().to_string());
    ui::kv("Poll", &format!("{} ms", config.relay.poll_interval_ms));
    ui::kv(
        "Reconnect",
        &format!("after {} s", config.relay.reconnect_wait_secs),
    );
    for (origin, base) in &config.relay.link_origins {
        ui::kv(&format!("Link {origin}"), base);
    }
    ui::blank();

    ui::section("Outputs");
    report_outputs(&config);
    ui::blank();

    ui::section("Storage");
    ui::kv(
        "Nicknames",
        &format!(
            "{} ({})",
            config.identity.path.display(),
            config.identity.backend
        ),
    );
    ui::kv("Session", &config.session.path.display().to_string());
    ui::kv("Attachments", &config.attachments.dir.display().to_string());
    if config.attachments.url.is_empty() {
        ui::check_warn("attachments.url is empty, media links will be relative");
    }
    Ok(())
}

fn report_outputs(config: &HermodConfig) {
    if config.bridges.is_empty() {
        ui::check_warn("No file bridges configured");
    }
    for bridge in &config.bridges {
        let parent_ok = bridge
            .path
            .parent()
            .map(|p| p.as_os_str().is_empty() || p.is_dir())
            .unwrap_or(true);
        let line = format!("{} -> {}", bridge.name, bridge.path.display());
        if parent_ok {
            ui::check_ok(&line);
        } else {
            ui::check_warn(&format!("{line} (directory missing)"));
        }
    }
    match (config.active_telegram(), &config.telegram) {
        (Some(telegram), _) => ui::check_ok(&format!("telegram -> chat {}", telegram.chat_id)),
        (None, Some(_)) => {
            ui::check_warn("telegram section present but token or chat_id is empty");
            ui::hint("Set both telegram.token and telegram.chat_id to enable it");
        }
        (None, None) => {}
    }
}
