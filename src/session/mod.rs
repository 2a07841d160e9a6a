//! Session identity management
//!
//! Owns the durable session token and its inactivity policy. A token lives
//! until it has been idle for longer than the TTL (one hour by default) or
//! the user resets it; either way it is replaced wholesale together with its
//! cached progress.

use std::sync::Arc;

use crate::error::Result;
use crate::progress::ProgressCache;
use crate::storage::keys::{LAST_ACTIVITY, SESSION_ID};
use crate::storage::LocalStore;

pub mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

/// Default inactivity threshold after which a session expires (one hour)
pub const DEFAULT_SESSION_TTL_MS: i64 = 3_600_000;

/// Resolves, refreshes, and resets the session token
#[derive(Debug, Clone)]
pub struct SessionManager {
    store: Arc<dyn LocalStore>,
    cache: ProgressCache,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
}

impl SessionManager {
    /// Create a manager over `store` using the default TTL
    pub fn new(store: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self {
        let cache = ProgressCache::new(Arc::clone(&store));
        Self {
            store,
            cache,
            clock,
            ttl_ms: DEFAULT_SESSION_TTL_MS,
        }
    }

    /// Override the inactivity threshold
    pub fn with_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    /// Progress cache sharing this manager's store
    pub fn cache(&self) -> &ProgressCache {
        &self.cache
    }

    /// Return the usable session token, creating one if needed.
    ///
    /// A stored token idle for longer than the TTL is discarded along with
    /// its cached progress. The last-activity stamp is always refreshed, and
    /// token plus stamp are written in one store call.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use ragsync::session::{ManualClock, SessionManager};
    /// use ragsync::storage::MemoryStore;
    ///
    /// # fn main() -> ragsync::Result<()> {
    /// let clock = Arc::new(ManualClock::new(0));
    /// let sessions = SessionManager::new(Arc::new(MemoryStore::new()), clock.clone());
    /// let first = sessions.resolve_session()?;
    ///
    /// clock.advance(60_000);
    /// assert_eq!(sessions.resolve_session()?, first);
    /// # Ok(())
    /// # }
    /// ```
    pub fn resolve_session(&self) -> Result<String> {
        let now = self.clock.now_millis();
        let mut token = self.store.get(SESSION_ID)?;
        let last_activity = self.read_last_activity()?;

        if let (Some(existing), Some(last)) = (token.as_deref(), last_activity) {
            let idle = now - last;
            if idle > self.ttl_ms {
                tracing::info!(session_id = %existing, idle_ms = idle, "Session expired, creating new session");
                self.cache.clear(existing)?;
                token = None;
            }
        }

        let token = match token {
            Some(token) => token,
            None => {
                let fresh = new_token();
                tracing::info!(session_id = %fresh, "Created new session");
                fresh
            }
        };

        self.persist(&token, now)?;
        Ok(token)
    }

    /// Discard the current session and its cached progress, returning a new
    /// token. Used for user-initiated "clear all data".
    pub fn reset_session(&self) -> Result<String> {
        if let Some(old) = self.store.get(SESSION_ID)? {
            self.cache.clear(&old)?;
            tracing::info!(session_id = %old, "Discarding session on reset");
        }

        let token = new_token();
        self.persist(&token, self.clock.now_millis())?;
        tracing::info!(session_id = %token, "Created new session after reset");
        Ok(token)
    }

    /// Stored token, without touching expiry or activity
    pub fn current(&self) -> Result<Option<String>> {
        self.store.get(SESSION_ID)
    }

    /// Stored last-activity stamp, `None` when absent or unparseable
    pub fn last_activity(&self) -> Result<Option<i64>> {
        self.read_last_activity()
    }

    fn read_last_activity(&self) -> Result<Option<i64>> {
        let raw = self.store.get(LAST_ACTIVITY)?;
        Ok(raw.and_then(|value| match value.trim().parse::<i64>() {
            Ok(millis) => Some(millis),
            Err(_) => {
                tracing::warn!(value = %value, "Ignoring unparseable last-activity stamp");
                None
            }
        }))
    }

    fn persist(&self, token: &str, now: i64) -> Result<()> {
        let stamp = now.to_string();
        self.store
            .set_many(&[(SESSION_ID, token), (LAST_ACTIVITY, stamp.as_str())])
    }
}

fn new_token() -> String {
    uuid::Uuid::new_v4().to_string()
}
