//! Opaque chat-network session state.

/// Credential/state blob produced by login or restore.
///
/// The bridge never looks inside; it only persists and hands it back.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Session(pub Vec<u8>);

impl Session {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for Session {
    fn from(bytes: Vec<u8>) -> Self {
        Session(bytes)
    }
}
