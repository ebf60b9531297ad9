//! Follow an append-only file from its current end, like `tail -F`.
//!
//! The path is re-opened on every poll, so a rotated file is picked up as
//! soon as it appears. A file that shrank or was replaced is read again from
//! the start.

use std::collections::VecDeque;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

/// Polling line reader over a single path.
pub struct InfileFollower {
    path: PathBuf,
    poll_interval: Duration,
    offset: u64,
    file_id: Option<u64>,
    partial: Vec<u8>,
    pending: VecDeque<String>,
}

impl InfileFollower {
    /// Start following `path` from its current end. Existing content is skipped.
    pub async fn open_at_end(path: impl AsRef<Path>, poll_interval: Duration) -> Self {
        let path = path.as_ref().to_path_buf();
        let (offset, file_id) = match fs::metadata(&path).await {
            Ok(meta) => (meta.len(), file_identity(&meta)),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Cannot stat infile");
                }
                (0, None)
            }
        };
        info!(path = %path.display(), offset, "Following infile");
        Self {
            path,
            poll_interval,
            offset,
            file_id,
            partial: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Wait for the next complete line, without its line terminator.
    ///
    /// Cancel-safe: a line is only handed out once, when this returns.
    pub async fn next_line(&mut self) -> String {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return line;
            }
            if let Err(e) = self.poll().await {
                warn!(path = %self.path.display(), error = %e, "Reading infile failed");
            }
            if self.pending.is_empty() {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }

    /// Read whatever was appended since the last poll.
    async fn poll(&mut self) -> std::io::Result<()> {
        let mut file = match fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let meta = file.metadata().await?;
        let len = meta.len();
        let file_id = file_identity(&meta);

        if file_id != self.file_id || len < self.offset {
            if self.file_id.is_some() || self.offset > 0 {
                debug!(path = %self.path.display(), "Infile truncated or replaced, reading from start");
            }
            self.file_id = file_id;
            self.offset = 0;
            self.partial.clear();
        }

        if len == self.offset {
            return Ok(());
        }

        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut bytes = Vec::with_capacity((len - self.offset) as usize);
        file.read_to_end(&mut bytes).await?;
        self.offset += bytes.len() as u64;

        self.partial.extend_from_slice(&bytes);
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            self.pending
                .push_back(line.trim_end_matches('\r').to_string());
        }
        Ok(())
    }
}

#[cfg(unix)]
fn file_identity(meta: &std::fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.ino())
}

#[cfg(not(unix))]
fn file_identity(_meta: &std::fs::Metadata) -> Option<u64> {
    None
}
