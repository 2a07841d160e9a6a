//! Session runtime
//!
//! Brackets the active use of one session token: resolve the token, follow
//! its processing progress live, and hold its conversation. [`SessionRuntime::init`]
//! and [`SessionRuntime::teardown`] are the explicit start and end; there is
//! no implicit global state.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use url::Url;

use crate::api::{RagApi, UploadResponse};
use crate::chat::ConversationSession;
use crate::config::Config;
use crate::error::Result;
use crate::live::{live_endpoint, ConnectionPhase, LiveClient, LiveHandle, LiveState, LiveTransport};
use crate::progress::DerivedStages;
use crate::session::{Clock, SessionManager};
use crate::storage::LocalStore;

/// Endpoint and timing settings for a runtime
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Page origin the WebSocket endpoint is derived from
    pub page_url: Url,
    /// Explicit WebSocket base overriding the derived one
    pub ws_base_url: Option<Url>,
    pub reconnect_delay: Duration,
    pub session_ttl_ms: i64,
}

impl RuntimeOptions {
    /// Options from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            page_url: config.page_url()?,
            ws_base_url: config.ws_base_url()?,
            reconnect_delay: config.reconnect_delay(),
            session_ttl_ms: config.session.ttl_ms,
        })
    }
}

/// The one live view of the current session
#[derive(Debug)]
pub struct SessionRuntime {
    sessions: SessionManager,
    transport: Arc<dyn LiveTransport>,
    api: Arc<dyn RagApi>,
    options: RuntimeOptions,
    token: String,
    live: Option<LiveHandle>,
    conversation: ConversationSession,
}

impl SessionRuntime {
    /// Resolve the session and start following it.
    ///
    /// The cached snapshot is visible through [`SessionRuntime::state`] as
    /// soon as this returns, whether or not the stream has connected.
    /// Chat history is loaded once here; a failed load leaves the
    /// transcript empty.
    pub async fn init(
        options: RuntimeOptions,
        store: Arc<dyn LocalStore>,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn LiveTransport>,
        api: Arc<dyn RagApi>,
    ) -> Result<Self> {
        let sessions = SessionManager::new(store, clock).with_ttl_ms(options.session_ttl_ms);
        let token = sessions.resolve_session()?;
        tracing::info!(session_id = %token, "Session runtime starting");

        let conversation = ConversationSession::new(token.clone(), Arc::clone(&api));
        let mut runtime = Self {
            sessions,
            transport,
            api,
            options,
            token,
            live: None,
            conversation,
        };

        runtime.live = Some(runtime.spawn_live(&runtime.token)?);
        runtime.conversation.load_history().await;

        Ok(runtime)
    }

    fn spawn_live(&self, token: &str) -> Result<LiveHandle> {
        let url = live_endpoint(&self.options.page_url, self.options.ws_base_url.as_ref(), token)?;
        let client = LiveClient::new(
            token,
            url,
            Arc::clone(&self.transport),
            self.sessions.cache().clone(),
        )
        .with_reconnect_delay(self.options.reconnect_delay);
        Ok(client.spawn())
    }

    /// Current session token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Current published live state
    pub fn state(&self) -> LiveState {
        match &self.live {
            Some(live) => live.state(),
            None => LiveState {
                snapshot: self.sessions.cache().load(&self.token),
                connected: false,
                phase: ConnectionPhase::Stopped,
            },
        }
    }

    /// Derived stage statuses for the current snapshot
    pub fn stages(&self) -> DerivedStages {
        self.state().stages()
    }

    /// A receiver notified on every live state change.
    ///
    /// A reset starts a new live client; subscribe again afterwards.
    pub fn subscribe(&self) -> Option<watch::Receiver<LiveState>> {
        self.live.as_ref().map(LiveHandle::subscribe)
    }

    /// Wait until the live state satisfies `predicate`
    pub async fn wait_for<F>(&self, predicate: F) -> LiveState
    where
        F: FnMut(&LiveState) -> bool,
    {
        match &self.live {
            Some(live) => live.wait_for(predicate).await,
            None => self.state(),
        }
    }

    /// The session's conversation
    pub fn conversation(&self) -> &ConversationSession {
        &self.conversation
    }

    /// Mutable access for sending chat turns
    pub fn conversation_mut(&mut self) -> &mut ConversationSession {
        &mut self.conversation
    }

    /// Upload a document under the current session.
    ///
    /// If the live client already finished following an earlier job, its
    /// cached result is dropped and a fresh client follows the new one.
    pub async fn upload(&mut self, path: &Path) -> Result<UploadResponse> {
        let response = self.api.upload(&self.token, path).await?;

        let finished = self
            .live
            .as_ref()
            .map(|live| live.state().phase.is_final())
            .unwrap_or(true);
        if finished {
            if let Some(old) = self.live.take() {
                old.shutdown().await;
            }
            self.sessions.cache().clear(&self.token)?;
            tracing::info!(session_id = %self.token, "Following new processing job");
            self.live = Some(self.spawn_live(&self.token)?);
        }

        Ok(response)
    }

    /// Clear the session on the server, then start over with a new token.
    ///
    /// If the server refuses, the current session, stream and transcript
    /// are left untouched and the error is returned.
    pub async fn reset(&mut self) -> Result<String> {
        let cleanup = self.api.clear_session(&self.token).await?;
        tracing::info!(
            session_id = %self.token,
            status = %cleanup.status,
            "Server session cleared"
        );

        if let Some(old) = self.live.take() {
            old.shutdown().await;
        }

        let token = match self.sessions.reset_session() {
            Ok(token) => token,
            Err(e) => {
                self.live = Some(self.spawn_live(&self.token)?);
                return Err(e);
            }
        };

        self.token = token.clone();
        self.conversation.reset(token.clone());
        self.live = Some(self.spawn_live(&token)?);
        Ok(token)
    }

    /// Stop the live client and wait for its connection to close
    pub async fn teardown(mut self) {
        if let Some(live) = self.live.take() {
            live.shutdown().await;
        }
        tracing::info!(session_id = %self.token, "Session runtime stopped");
    }
}
