//! In-process fake transport for live client tests
//!
//! [`FakeTransport::new`] returns a `(FakeTransport, FakeServer)` pair. Wire
//! the transport into the client; script the server side from the test:
//!
//! - `server.refuse_next()` -- the next `connect` fails.
//! - `server.accept_next()` -- the next `connect` succeeds and returns a
//!   [`FakeSocket`] the test pushes frames through. Dropping the socket ends
//!   the stream (an unexpected close from the client's point of view).
//! - `server.delay_close(d)` -- client-initiated closes take `d` to finish,
//!   like a slow close handshake.
//!
//! A `connect` with nothing scripted is refused. Every attempt is recorded
//! with the tokio clock so paused-time tests can check reconnect timing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::{Result, RagSyncError};
use crate::live::{LiveConnection, LiveTransport};

/// Frame pushed from the fake server to the client
#[derive(Debug, Clone)]
pub enum FakeFrame {
    /// A text frame
    Text(String),
    /// A transport failure surfaced from `next_text`
    Error(String),
}

enum Script {
    Refuse,
    Accept {
        rx: mpsc::UnboundedReceiver<FakeFrame>,
        closed: Arc<AtomicBool>,
    },
}

#[derive(Default)]
struct Shared {
    scripts: VecDeque<Script>,
    attempts: Vec<(url::Url, Instant)>,
    close_delay: Duration,
}

/// Transport half, handed to the code under test
#[derive(Clone)]
pub struct FakeTransport {
    shared: Arc<Mutex<Shared>>,
}

impl std::fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTransport").finish_non_exhaustive()
    }
}

/// Test-side half that scripts connection outcomes
#[derive(Clone)]
pub struct FakeServer {
    shared: Arc<Mutex<Shared>>,
}

/// Server end of one accepted fake connection
#[derive(Debug)]
pub struct FakeSocket {
    tx: mpsc::UnboundedSender<FakeFrame>,
    closed: Arc<AtomicBool>,
}

impl FakeTransport {
    /// Create a connected `(transport, server)` pair
    pub fn new() -> (Self, FakeServer) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            FakeServer { shared },
        )
    }
}

impl FakeServer {
    /// Make the next connection attempt fail
    pub fn refuse_next(&self) {
        self.shared.lock().unwrap().scripts.push_back(Script::Refuse);
    }

    /// Make the next connection attempt succeed
    pub fn accept_next(&self) -> FakeSocket {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        self.shared.lock().unwrap().scripts.push_back(Script::Accept {
            rx,
            closed: Arc::clone(&closed),
        });
        FakeSocket { tx, closed }
    }

    /// Make every later client-initiated close take `delay`
    pub fn delay_close(&self, delay: Duration) {
        self.shared.lock().unwrap().close_delay = delay;
    }

    /// Times of every connection attempt so far
    pub fn attempt_times(&self) -> Vec<Instant> {
        self.shared
            .lock()
            .unwrap()
            .attempts
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }

    /// URLs of every connection attempt so far
    pub fn attempt_urls(&self) -> Vec<url::Url> {
        self.shared
            .lock()
            .unwrap()
            .attempts
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Number of connection attempts so far
    pub fn attempts(&self) -> usize {
        self.shared.lock().unwrap().attempts.len()
    }
}

impl FakeSocket {
    /// Push a text frame to the client
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.tx.send(FakeFrame::Text(text.into()));
    }

    /// Push a JSON value as a text frame
    pub fn send_json(&self, value: serde_json::Value) {
        self.send_text(value.to_string());
    }

    /// Make the client's next read fail
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.tx.send(FakeFrame::Error(message.into()));
    }

    /// Whether the client actively closed this connection
    pub fn was_closed_by_client(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Shared close flag, readable after the socket is dropped
    pub fn close_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

struct FakeConnection {
    rx: mpsc::UnboundedReceiver<FakeFrame>,
    closed: Arc<AtomicBool>,
    close_delay: Duration,
}

#[async_trait::async_trait]
impl LiveTransport for FakeTransport {
    async fn connect(&self, url: &url::Url) -> Result<Box<dyn LiveConnection>> {
        let (script, close_delay) = {
            let mut shared = self.shared.lock().unwrap();
            shared.attempts.push((url.clone(), Instant::now()));
            (shared.scripts.pop_front(), shared.close_delay)
        };

        match script {
            Some(Script::Accept { rx, closed }) => Ok(Box::new(FakeConnection {
                rx,
                closed,
                close_delay,
            })),
            Some(Script::Refuse) | None => {
                Err(RagSyncError::Transport("fake connection refused".into()).into())
            }
        }
    }
}

#[async_trait::async_trait]
impl LiveConnection for FakeConnection {
    async fn next_text(&mut self) -> Option<Result<String>> {
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        match self.rx.recv().await? {
            FakeFrame::Text(text) => Some(Ok(text)),
            FakeFrame::Error(message) => Some(Err(RagSyncError::Transport(message).into())),
        }
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.rx.close();
        if !self.close_delay.is_zero() {
            tokio::time::sleep(self.close_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> url::Url {
        url::Url::parse("ws://fake/api/ws/tok").unwrap()
    }

    #[tokio::test]
    async fn test_unscripted_connect_is_refused() {
        let (transport, server) = FakeTransport::new();
        assert!(transport.connect(&url()).await.is_err());
        assert_eq!(server.attempts(), 1);
    }

    #[tokio::test]
    async fn test_accepted_connection_delivers_frames_in_order() {
        let (transport, server) = FakeTransport::new();
        let socket = server.accept_next();
        let mut conn = transport.connect(&url()).await.unwrap();

        socket.send_text("one");
        socket.send_text("two");

        assert_eq!(conn.next_text().await.unwrap().unwrap(), "one");
        assert_eq!(conn.next_text().await.unwrap().unwrap(), "two");
    }

    #[tokio::test]
    async fn test_dropping_socket_ends_stream() {
        let (transport, server) = FakeTransport::new();
        let socket = server.accept_next();
        let mut conn = transport.connect(&url()).await.unwrap();
        drop(socket);
        assert!(conn.next_text().await.is_none());
    }

    #[tokio::test]
    async fn test_close_is_visible_to_server() {
        let (transport, server) = FakeTransport::new();
        let socket = server.accept_next();
        let mut conn = transport.connect(&url()).await.unwrap();
        conn.close().await;
        assert!(socket.was_closed_by_client());
        assert!(conn.next_text().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_close_takes_configured_time() {
        let (transport, server) = FakeTransport::new();
        server.delay_close(Duration::from_secs(2));
        let _socket = server.accept_next();
        let mut conn = transport.connect(&url()).await.unwrap();

        let started = Instant::now();
        conn.close().await;
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_fail_surfaces_error() {
        let (transport, server) = FakeTransport::new();
        let socket = server.accept_next();
        let mut conn = transport.connect(&url()).await.unwrap();
        socket.fail("reset by peer");
        assert!(conn.next_text().await.unwrap().is_err());
    }
}
