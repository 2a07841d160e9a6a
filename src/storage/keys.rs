//! Fixed, human-readable key names in the local store

/// Key holding the active session token
pub const SESSION_ID: &str = "sessionId";

/// Key holding the last-activity timestamp (epoch millis, decimal string)
pub const LAST_ACTIVITY: &str = "lastActivity";

/// Key holding the last known progress snapshot for `token`
///
/// # Examples
///
/// ```
/// use ragsync::storage::keys::progress_key;
///
/// assert_eq!(progress_key("abc"), "progress_abc");
/// ```
pub fn progress_key(token: &str) -> String {
    format!("progress_{}", token)
}
