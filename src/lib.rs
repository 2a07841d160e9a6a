//! ragsync - session-bound progress sync client for a RAG service
//!
//! This library keeps one anonymous session per local store, follows the
//! server's document processing progress over a WebSocket, and exchanges
//! chat queries about the processed documents.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: session token resolution, expiry and reset
//! - `storage`: durable local key-value store (`sled`)
//! - `progress`: snapshots, their local cache, and derived stage statuses
//! - `live`: reconnecting live progress client and its transports
//! - `chat`: conversation transcript and chat turns
//! - `api`: HTTP client for upload, chat, history and session clear
//! - `runtime`: ties the above together for one active session
//! - `config`, `logging`, `error`, `cli`, `commands`: the ambient CLI stack
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ragsync::api::ApiClient;
//! use ragsync::live::WebSocketTransport;
//! use ragsync::runtime::{RuntimeOptions, SessionRuntime};
//! use ragsync::session::SystemClock;
//! use ragsync::storage::SledStore;
//! use ragsync::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let runtime = SessionRuntime::init(
//!         RuntimeOptions::from_config(&config)?,
//!         Arc::new(SledStore::open("/tmp/ragsync")?),
//!         Arc::new(SystemClock),
//!         Arc::new(WebSocketTransport::new()),
//!         Arc::new(ApiClient::new(config.api_base_url()?, config.request_timeout())?),
//!     )
//!     .await?;
//!
//!     println!("{:?}", runtime.stages());
//!     runtime.teardown().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod live;
pub mod logging;
pub mod progress;
pub mod runtime;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{RagSyncError, Result};
pub use runtime::SessionRuntime;

#[cfg(test)]
pub mod test_utils;
