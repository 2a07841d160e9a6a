//! Error types for RagSync
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for RagSync operations
///
/// Most failures inside the live-sync core are recovered locally (reconnect,
/// drop malformed payloads). The variants here are what escapes to callers:
/// configuration problems, storage faults, and request failures that the
/// display layer surfaces to the user.
#[derive(Error, Debug)]
pub enum RagSyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Durable local storage errors (open, read, write)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Live subscription transport errors (connect refused, dropped)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A request/response call (upload, chat, history, clear) failed.
    ///
    /// Carries the server-supplied `detail` when present, otherwise a fixed
    /// fallback message for the operation.
    #[error("{0}")]
    Request(String),

    /// Caller supplied input that cannot be sent (blank query, bad file)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket protocol errors
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Result type alias for RagSync operations
///
/// Uses `anyhow::Error` so context can be attached while propagating;
/// callers that need the kind can `downcast_ref::<RagSyncError>()`.
pub type Result<T> = anyhow::Result<T>;
