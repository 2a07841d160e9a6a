//! Reconnecting live progress client
//!
//! [`LiveClient::spawn`] starts one task per session token. That task owns
//! the only physical connection and the only reconnect timer, so the two can
//! never coexist. Its lifecycle is:
//!
//! ```text
//! Idle -> Connecting -> Connected --(unexpected close)--> ReconnectScheduled
//!             ^   |                                             |
//!             |   +--(connect failed)---------------------------+
//!             +-----------------(delay elapsed)------------------+
//!
//! Connected --(terminal snapshot)--> Terminated   (absorbing)
//! any       --(shutdown / drop)----> Stopped
//! ```
//!
//! Every snapshot received is validated, written to the
//! [`ProgressCache`], then published through the [`LiveHandle`]'s watch
//! channel, strictly in receipt order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::live::{LiveConnection, LiveTransport};
use crate::progress::{
    control_frame_type, derive_stages, DerivedStages, ProgressCache, ProgressSnapshot,
};

/// Fixed wait between an unexpected close and the next connection attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Where the client is in its connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Created, no attempt made yet
    Idle,
    /// Opening a connection
    Connecting,
    /// Connection open and receiving
    Connected,
    /// Waiting out the reconnect delay
    ReconnectScheduled,
    /// Job finished; no further attempts for this token
    Terminated,
    /// Torn down by the owner
    Stopped,
}

impl ConnectionPhase {
    /// No further connection attempts will be made
    pub fn is_final(self) -> bool {
        matches!(self, ConnectionPhase::Terminated | ConnectionPhase::Stopped)
    }
}

/// Published view of the subscription
#[derive(Debug, Clone, PartialEq)]
pub struct LiveState {
    /// Latest snapshot, warm-started from the cache
    pub snapshot: Option<ProgressSnapshot>,
    /// A physical connection is currently open
    pub connected: bool,
    pub phase: ConnectionPhase,
}

impl LiveState {
    /// Stage statuses derived from the current snapshot
    pub fn stages(&self) -> DerivedStages {
        derive_stages(self.snapshot.as_ref())
    }
}

/// Configured, not yet running, live client for one token
#[derive(Debug, Clone)]
pub struct LiveClient {
    token: String,
    url: Url,
    transport: Arc<dyn LiveTransport>,
    cache: ProgressCache,
    reconnect_delay: Duration,
}

enum PumpOutcome {
    Terminal,
    Closed,
    Cancelled,
}

impl LiveClient {
    /// Create a client for `token` subscribing at `url`
    pub fn new(
        token: impl Into<String>,
        url: Url,
        transport: Arc<dyn LiveTransport>,
        cache: ProgressCache,
    ) -> Self {
        Self {
            token: token.into(),
            url,
            transport,
            cache,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    /// Override the reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Start the subscription task.
    ///
    /// The cached snapshot, if any, is published before the task makes its
    /// first connection attempt. Must be called inside a Tokio runtime.
    pub fn spawn(self) -> LiveHandle {
        let snapshot = self.cache.load(&self.token);
        let (state_tx, state_rx) = watch::channel(LiveState {
            snapshot,
            connected: false,
            phase: ConnectionPhase::Idle,
        });
        let cancel = CancellationToken::new();
        let token = self.token.clone();

        let task = tokio::spawn(self.run(state_tx, cancel.clone()));

        LiveHandle {
            token,
            state_rx,
            cancel,
            task: Some(task),
        }
    }

    async fn run(self, state_tx: watch::Sender<LiveState>, cancel: CancellationToken) {
        let already_finished = state_tx
            .borrow()
            .snapshot
            .as_ref()
            .map(ProgressSnapshot::is_terminal)
            .unwrap_or(false);
        if already_finished {
            tracing::info!(session_id = %self.token, "Processing already completed, not connecting");
            set_phase(&state_tx, ConnectionPhase::Terminated, false);
            return;
        }

        loop {
            set_phase(&state_tx, ConnectionPhase::Connecting, false);
            tracing::info!(session_id = %self.token, url = %self.url, "Connecting live progress stream");

            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                attempt = self.transport.connect(&self.url) => attempt,
            };

            match attempt {
                Ok(mut connection) => {
                    tracing::info!(session_id = %self.token, "Live progress stream connected");
                    set_phase(&state_tx, ConnectionPhase::Connected, true);

                    let outcome = self.pump(connection.as_mut(), &state_tx, &cancel).await;
                    connection.close().await;

                    match outcome {
                        PumpOutcome::Terminal => {
                            tracing::info!(session_id = %self.token, "Processing completed, live stream closed");
                            return;
                        }
                        PumpOutcome::Cancelled => break,
                        PumpOutcome::Closed => {
                            tracing::warn!(session_id = %self.token, "Live progress stream disconnected");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(session_id = %self.token, error = %e, "Live progress connection failed");
                }
            }

            set_phase(&state_tx, ConnectionPhase::ReconnectScheduled, false);
            tracing::debug!(
                session_id = %self.token,
                delay_ms = self.reconnect_delay.as_millis() as u64,
                "Reconnect scheduled"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        tracing::debug!(session_id = %self.token, "Live progress client stopped");
        set_phase(&state_tx, ConnectionPhase::Stopped, false);
    }

    async fn pump(
        &self,
        connection: &mut dyn LiveConnection,
        state_tx: &watch::Sender<LiveState>,
        cancel: &CancellationToken,
    ) -> PumpOutcome {
        loop {
            let frame = tokio::select! {
                biased;
                _ = cancel.cancelled() => return PumpOutcome::Cancelled,
                frame = connection.next_text() => frame,
            };

            let text = match frame {
                Some(Ok(text)) => text,
                Some(Err(e)) => {
                    tracing::warn!(session_id = %self.token, error = %e, "Live progress stream error");
                    return PumpOutcome::Closed;
                }
                None => return PumpOutcome::Closed,
            };

            let snapshot = match ProgressSnapshot::parse(&text) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    match control_frame_type(&text) {
                        Some(kind) => {
                            tracing::debug!(session_id = %self.token, kind = %kind, "Ignoring control message")
                        }
                        None => {
                            tracing::warn!(session_id = %self.token, error = %e, "Dropping malformed progress message")
                        }
                    }
                    continue;
                }
            };

            tracing::debug!(
                session_id = %self.token,
                stage = %snapshot.stage,
                status = %snapshot.status,
                progress = snapshot.progress,
                "Progress update received"
            );

            if let Err(e) = self.cache.save(&self.token, &snapshot) {
                tracing::warn!(session_id = %self.token, error = %e, "Failed to persist progress snapshot");
            }

            // A terminal snapshot is published already disconnected, before
            // the close handshake runs.
            let terminal = snapshot.is_terminal();
            state_tx.send_modify(|state| {
                state.snapshot = Some(snapshot);
                if terminal {
                    state.connected = false;
                    state.phase = ConnectionPhase::Terminated;
                }
            });

            if terminal {
                return PumpOutcome::Terminal;
            }
        }
    }
}

fn set_phase(state_tx: &watch::Sender<LiveState>, phase: ConnectionPhase, connected: bool) {
    state_tx.send_modify(|state| {
        state.phase = phase;
        state.connected = connected;
    });
}

/// Owner's handle to a running live client.
///
/// Dropping the handle cancels the subscription: any pending reconnect
/// timer is abandoned and the open connection, if any, is closed by the
/// task before it exits. [`LiveHandle::shutdown`] does the same and waits
/// for the task to finish.
#[derive(Debug)]
pub struct LiveHandle {
    token: String,
    state_rx: watch::Receiver<LiveState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveHandle {
    /// Session token this handle follows
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Current published state
    pub fn state(&self) -> LiveState {
        self.state_rx.borrow().clone()
    }

    /// Latest snapshot, if any
    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.state_rx.borrow().snapshot.clone()
    }

    /// Whether a physical connection is open right now
    pub fn is_connected(&self) -> bool {
        self.state_rx.borrow().connected
    }

    /// Derived stage statuses for the current snapshot
    pub fn stages(&self) -> DerivedStages {
        self.state_rx.borrow().stages()
    }

    /// A receiver that is notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<LiveState> {
        self.state_rx.clone()
    }

    /// Wait until `predicate` holds for the published state, returning it.
    ///
    /// Returns the last state if the client task has gone away first.
    pub async fn wait_for<F>(&self, mut predicate: F) -> LiveState
    where
        F: FnMut(&LiveState) -> bool,
    {
        let mut rx = self.state_rx.clone();
        let outcome = rx
            .wait_for(|state| predicate(state))
            .await
            .map(|state| LiveState::clone(&state));
        match outcome {
            Ok(state) => state,
            Err(_) => LiveState::clone(&rx.borrow()),
        }
    }

    /// Cancel the subscription and wait for the task to close its
    /// connection and exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(session_id = %self.token, error = %e, "Live client task ended abnormally");
            }
        }
    }
}

impl Drop for LiveHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
