//! Durable storage of the chat-network session blob.

use hermod_types::error::{HermodError, HermodResult};
use hermod_types::session::Session;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Session file, replaced wholesale on every save.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved session. `None` when there is none yet.
    pub async fn load(&self) -> HermodResult<Option<Session>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(Session(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HermodError::Session(format!(
                "reading {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Replace the saved session. Written to a temp file and renamed into place.
    pub async fn save(&self, session: &Session) -> HermodResult<()> {
        let tmp = self.path.with_extension("tmp");
        let result = async {
            tokio::fs::write(&tmp, session.as_bytes()).await?;
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;
        result.map_err(|e| {
            HermodError::Session(format!("writing {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), bytes = session.as_bytes().len(), "Session saved");
        Ok(())
    }
}
