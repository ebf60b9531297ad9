//! Channel fan-out: append a line to every bridge file and post it to Telegram.
//!
//! Every destination is attempted once per call. A failing destination is
//! logged and never keeps the others from being written.

use crate::telegram::TelegramChannel;
use hermod_types::config::HermodConfig;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Writes tagged lines to every configured destination.
pub struct Fanout {
    channel_tag: String,
    bridges: Vec<PathBuf>,
    telegram: Option<TelegramChannel>,
}

impl Fanout {
    pub fn new(channel_tag: &str, bridges: Vec<PathBuf>, telegram: Option<TelegramChannel>) -> Self {
        Self {
            channel_tag: channel_tag.to_string(),
            bridges,
            telegram,
        }
    }

    pub fn from_config(config: &HermodConfig) -> Self {
        Self::new(
            &config.channel_tag,
            config.bridge_paths(),
            config.active_telegram().and_then(TelegramChannel::from_config),
        )
    }

    /// Prefix `body` with the channel tag.
    pub fn format(&self, body: &str) -> String {
        format!("{}{}", self.channel_tag, body)
    }

    /// Tag `body` and deliver it to every bridge file and the HTTP channel.
    pub async fn relay(&self, body: &str) {
        let message = self.format(body);
        to_files(&message, &self.bridges).await;
        self.to_http_channel(&message).await;
    }

    /// Post `message` to the HTTP channel, if one is configured.
    pub async fn to_http_channel(&self, message: &str) {
        let Some(telegram) = &self.telegram else {
            return;
        };
        if let Err(e) = telegram.send_message(message).await {
            warn!(error = %e, chat_id = %telegram.chat_id(), "Telegram relay failed");
        }
    }

    pub fn bridges(&self) -> &[PathBuf] {
        &self.bridges
    }
}

/// Append `message` plus a newline to each path, creating files as needed.
pub async fn to_files(message: &str, paths: &[PathBuf]) {
    for path in paths {
        match append_line(path, message).await {
            Ok(()) => debug!(path = %path.display(), "Relayed line"),
            Err(e) => warn!(path = %path.display(), error = %e, "Write to bridge failed"),
        }
    }
}

/// Open `path` in append mode, write `line` and a newline, and close it.
pub async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    file.write_all(buf.as_bytes()).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn test_to_files_appends_to_every_path() {
        let dir = tempfile::tempdir().unwrap();
        let irc = dir.path().join("toirc.log");
        let matrix = dir.path().join("tomatrix.log");
        std::fs::write(&irc, "earlier\n").unwrap();

        to_files("[WA] Al: hi", &[irc.clone(), matrix.clone()]).await;

        assert_eq!(read(&irc), "earlier\n[WA] Al: hi\n");
        assert_eq!(read(&matrix), "[WA] Al: hi\n");
    }

    #[tokio::test]
    async fn test_to_files_twice_appends_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toirc.log");
        let paths = vec![path.clone()];

        to_files("same", &paths).await;
        to_files("same", &paths).await;

        assert_eq!(read(&path), "same\nsame\n");
    }

    #[tokio::test]
    async fn test_failing_path_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("no-such-dir").join("toirc.log");
        let good = dir.path().join("tosignal.log");

        to_files("msg", &[broken.clone(), good.clone()]).await;

        assert!(!broken.exists());
        assert_eq!(read(&good), "msg\n");
    }

    #[tokio::test]
    async fn test_relay_applies_channel_tag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toirc.log");
        let fanout = Fanout::new("[WA] ", vec![path.clone()], None);

        fanout.relay("Al: hello").await;

        assert_eq!(read(&path), "[WA] Al: hello\n");
        assert_eq!(fanout.bridges().len(), 1);
    }
}
