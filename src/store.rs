//! Durable token slot.
//!
//! SYSTEM CONTEXT
//! ==============
//! The controller is the only writer. Stores never validate token contents and
//! never surface I/O failures: a slot that cannot be read is treated as empty,
//! and a failed write or clear is logged and dropped so no flow can fault on
//! storage.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};

use crate::types::Token;

/// Key the token is stored under inside the session document.
pub const TOKEN_KEY: &str = "token";

/// Persistence slot for the session token.
pub trait SessionStore: Send + Sync {
    /// Return the persisted token, if any.
    fn read(&self) -> Option<Token>;

    /// Persist `token`, replacing any previous value.
    fn write(&self, token: &Token);

    /// Remove the persisted token. No-op when nothing is stored.
    fn clear(&self);
}

// =============================================================================
// MEMORY
// =============================================================================

/// In-process slot. Contents do not outlive the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Token>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: Token) -> Self {
        Self { slot: Mutex::new(Some(token)) }
    }
}

impl SessionStore for MemoryStore {
    fn read(&self) -> Option<Token> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write(&self, token: &Token) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
    }

    fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

// =============================================================================
// FILE
// =============================================================================

/// JSON key/value document on disk with the token under [`TOKEN_KEY`].
///
/// Other keys in the document are preserved. Writes land in a sibling temp
/// file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. `Ok(None)` means the file does not exist.
    fn load(&self) -> io::Result<Option<Map<String, Value>>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let doc = serde_json::from_str::<Map<String, Value>>(&raw)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(doc))
    }

    fn persist(&self, doc: &Map<String, Value>) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(doc).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileStore {
    fn read(&self) -> Option<Token> {
        match self.load() {
            Ok(doc) => doc?
                .get(TOKEN_KEY)
                .and_then(Value::as_str)
                .map(Token::new),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "session file unreadable; treating as empty");
                None
            }
        }
    }

    fn write(&self, token: &Token) {
        // Corrupt or unreadable documents are replaced wholesale.
        let mut doc = self.load().ok().flatten().unwrap_or_default();
        doc.insert(TOKEN_KEY.to_owned(), Value::String(token.as_str().to_owned()));
        if let Err(e) = self.persist(&doc) {
            tracing::warn!(error = %e, path = %self.path.display(), "failed to persist session token");
        }
    }

    fn clear(&self) {
        match self.load() {
            Ok(None) => {}
            Ok(Some(mut doc)) => {
                if doc.remove(TOKEN_KEY).is_some() {
                    if let Err(e) = self.persist(&doc) {
                        tracing::warn!(error = %e, path = %self.path.display(), "failed to clear session token");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "session file unreadable; removing");
                if let Err(e) = std::fs::remove_file(&self.path) {
                    tracing::warn!(error = %e, path = %self.path.display(), "failed to remove session file");
                }
            }
        }
    }
}
