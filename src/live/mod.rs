//! Live progress subscription
//!
//! This module keeps one logical subscription to the server's progress
//! stream per session token. It is split the same way at every seam:
//!
//! - [`LiveTransport`] / [`LiveConnection`] -- how a physical connection is
//!   opened and read. [`websocket::WebSocketTransport`] is the real one;
//!   [`fake::FakeTransport`] replaces it in tests (cfg(test) only).
//! - [`endpoint::live_endpoint`] -- derives the subscription URL from the
//!   page origin, an optional override base, and the token.
//! - [`client::LiveClient`] -- the reconnecting state machine that pushes
//!   every snapshot into the [`crate::progress::ProgressCache`] and publishes
//!   it through a [`client::LiveHandle`].

use crate::error::Result;

pub mod client;
pub mod endpoint;
pub mod websocket;

#[cfg(test)]
pub mod fake;

pub use client::{ConnectionPhase, LiveClient, LiveHandle, LiveState, DEFAULT_RECONNECT_DELAY};
pub use endpoint::live_endpoint;
pub use websocket::WebSocketTransport;

/// Opens physical connections to the progress stream.
///
/// Used polymorphically through `Arc<dyn LiveTransport>` so the client can
/// run against a fake in tests.
#[async_trait::async_trait]
pub trait LiveTransport: Send + Sync + std::fmt::Debug {
    /// Open one connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RagSyncError::Transport`] when the connection
    /// cannot be established.
    async fn connect(&self, url: &url::Url) -> Result<Box<dyn LiveConnection>>;
}

/// One open connection delivering inbound text frames in order.
#[async_trait::async_trait]
pub trait LiveConnection: Send {
    /// Wait for the next inbound text frame.
    ///
    /// Returns `None` once the peer has closed the stream and `Some(Err(_))`
    /// on a transport failure. Control frames are handled internally and
    /// never surface here.
    async fn next_text(&mut self) -> Option<Result<String>>;

    /// Actively close the connection. Safe to call on an already closed one.
    async fn close(&mut self);
}
