//! In-progress state persistence.
//!
//! The store holds a single JSON document under [`PROGRESS_KEY`] describing
//! where the user is and what they answered so far. Anything unreadable in
//! the slot is treated as "no saved progress": loading never fails.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::answers::Answers;

/// Well-known key of the progress slot.
pub const PROGRESS_KEY: &str = "video-form-progress";

/// Snapshot mirrored to the store after every state change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProgress {
    pub step_index: usize,
    #[serde(alias = "data")]
    pub answers: Answers,
}

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("Failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write progress: {0}")]
    Io(#[from] std::io::Error),
}

/// Write-through key/value slot for [`PersistedProgress`].
pub trait ProgressStore: Send + Sync {
    fn save(&self, progress: &PersistedProgress) -> Result<(), ProgressError>;

    /// Read the saved progress. Missing or corrupt content yields `None`.
    fn load(&self) -> Option<PersistedProgress>;

    fn clear(&self) -> Result<(), ProgressError>;
}

impl<S: ProgressStore + ?Sized> ProgressStore for Arc<S> {
    fn save(&self, progress: &PersistedProgress) -> Result<(), ProgressError> {
        (**self).save(progress)
    }

    fn load(&self) -> Option<PersistedProgress> {
        (**self).load()
    }

    fn clear(&self) -> Result<(), ProgressError> {
        (**self).clear()
    }
}

fn decode(raw: &str) -> Option<PersistedProgress> {
    match serde_json::from_str(raw) {
        Ok(progress) => Some(progress),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable saved progress");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Tab-scoped store: lives exactly as long as the value itself.
///
/// Values are kept as serialized strings, like browser session storage,
/// so corrupt content can be represented and is handled the same way.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with raw content.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let store = Self::new();
        store.lock().insert(PROGRESS_KEY.to_string(), raw.into());
        store
    }

    /// Raw content of the slot, if any.
    pub fn raw(&self) -> Option<String> {
        self.lock().get(PROGRESS_KEY).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressStore for MemoryProgressStore {
    fn save(&self, progress: &PersistedProgress) -> Result<(), ProgressError> {
        let raw = serde_json::to_string(progress)?;
        self.lock().insert(PROGRESS_KEY.to_string(), raw);
        Ok(())
    }

    fn load(&self) -> Option<PersistedProgress> {
        self.raw().and_then(|raw| decode(&raw))
    }

    fn clear(&self) -> Result<(), ProgressError> {
        self.lock().remove(PROGRESS_KEY);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Store backed by `<dir>/video-form-progress.json`, used by the terminal
/// driver so an interrupted run resumes where it stopped.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{PROGRESS_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for FileProgressStore {
    fn save(&self, progress: &PersistedProgress) -> Result<(), ProgressError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(progress)?;
        // Write to a sibling file first so a crash never leaves half a document.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Option<PersistedProgress> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cannot read saved progress");
                None
            }
        }
    }

    fn clear(&self) -> Result<(), ProgressError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
