//! Durable local key-value storage
//!
//! The session manager and the progress cache share one [`LocalStore`]. It
//! is a plain string key-value map with per-entry atomic writes, standing in
//! for the browser's local storage. [`SledStore`] is the on-disk backend and
//! [`MemoryStore`] is an in-process one for tests and ephemeral runs.

use crate::error::{Result, RagSyncError};
use directories::ProjectDirs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub mod keys;

/// String key-value store shared by session and progress state.
///
/// Implementations must make each entry write atomic: a reader sees either
/// the previous value or the complete new value, never a torn one.
pub trait LocalStore: Send + Sync + std::fmt::Debug {
    /// Read a value, `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Write several entries as one unit.
    ///
    /// The default applies them one at a time; backends with batch support
    /// override this to commit them together.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// On-disk store backed by an embedded `sled` database
#[derive(Debug, Clone)]
pub struct SledStore {
    db: sled::Db,
    path: PathBuf,
}

impl SledStore {
    /// Open the store in the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns `RagSyncError::Storage` if the data directory cannot be
    /// determined or the database cannot be opened.
    pub fn open_default() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "ragsync", "ragsync")
            .ok_or_else(|| RagSyncError::Storage("Could not determine data directory".into()))?;
        Self::open(proj_dirs.data_dir().join("state"))
    }

    /// Open or create a store at `path`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ragsync::storage::{LocalStore, SledStore};
    ///
    /// # fn main() -> ragsync::Result<()> {
    /// let store = SledStore::open("/tmp/ragsync-state")?;
    /// store.set("sessionId", "abc")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RagSyncError::Storage(format!("Failed to create data directory: {}", e))
            })?;
        }

        let db = sled::open(&path)
            .map_err(|e| RagSyncError::Storage(format!("Failed to open database: {}", e)))?;
        tracing::debug!(path = %path.display(), "Opened local store");

        Ok(Self { db, path })
    }

    /// Location of the database on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| RagSyncError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

impl LocalStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| RagSyncError::Storage(format!("Read failed: {}", e)))?;

        match value {
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    RagSyncError::Storage(format!("Stored value for {} is not UTF-8: {}", key, e))
                })?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| RagSyncError::Storage(format!("Insert failed: {}", e)))?;
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| RagSyncError::Storage(format!("Remove failed: {}", e)))?;
        self.flush()
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut batch = sled::Batch::default();
        for (key, value) in entries {
            batch.insert(key.as_bytes(), value.as_bytes());
        }
        self.db
            .apply_batch(batch)
            .map_err(|e| RagSyncError::Storage(format!("Batch write failed: {}", e)))?;
        self.flush()
    }
}

/// In-memory store
///
/// Nothing survives the process. Used by tests and by runs that should not
/// touch the user's data directory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| RagSyncError::Storage("memory store lock poisoned".into()).into())
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut guard = self.lock()?;
        for (key, value) in entries {
            guard.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}
