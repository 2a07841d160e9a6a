//! Persisted progress cache
//!
//! Mirrors the latest snapshot per session token into the local store so a
//! restarted client can show progress before any network activity. Expiry
//! is owned by [`crate::session::SessionManager`], which calls
//! [`ProgressCache::clear`] explicitly.

use std::sync::Arc;

use crate::error::{Result, RagSyncError};
use crate::progress::ProgressSnapshot;
use crate::storage::keys::progress_key;
use crate::storage::LocalStore;

/// Key-value view of stored snapshots, keyed by session token
#[derive(Debug, Clone)]
pub struct ProgressCache {
    store: Arc<dyn LocalStore>,
}

impl ProgressCache {
    /// Create a cache over `store`
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Load the stored snapshot for `token`.
    ///
    /// Absent, unreadable, and malformed entries all come back as `None`;
    /// the latter two are logged.
    pub fn load(&self, token: &str) -> Option<ProgressSnapshot> {
        let raw = match self.store.get(&progress_key(token)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(session_id = %token, error = %e, "Failed to read stored progress");
                return None;
            }
        };

        match ProgressSnapshot::parse(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(session_id = %token, error = %e, "Ignoring malformed stored progress");
                None
            }
        }
    }

    /// Store `snapshot` as the latest for `token`, replacing any previous one
    pub fn save(&self, token: &str, snapshot: &ProgressSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| RagSyncError::Storage(format!("Failed to serialize snapshot: {}", e)))?;
        self.store.set(&progress_key(token), &json)
    }

    /// Drop the stored snapshot for `token`
    pub fn clear(&self, token: &str) -> Result<()> {
        self.store.remove(&progress_key(token))
    }
}
