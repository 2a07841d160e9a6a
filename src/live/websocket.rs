//! WebSocket transport for the live progress stream

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{Result, RagSyncError};
use crate::live::{LiveConnection, LiveTransport};

/// Upper bound on the whole close handshake, sending our frame included
const CLOSE_HANDSHAKE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(2);

/// Opens `tokio-tungstenite` client connections.
///
/// Ping/pong is answered by tungstenite itself; only text frames (and
/// UTF-8 binary frames) are handed to the client.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Create the transport
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl LiveTransport for WebSocketTransport {
    async fn connect(&self, url: &url::Url) -> Result<Box<dyn LiveConnection>> {
        let (stream, response) = connect_async(url.as_str()).await.map_err(|e| {
            RagSyncError::Transport(format!("WebSocket connect to {} failed: {}", url, e))
        })?;
        tracing::debug!(url = %url, status = %response.status(), "WebSocket handshake complete");

        Ok(Box::new(WebSocketConnection {
            stream,
            closed: false,
        }))
    }
}

struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

#[async_trait::async_trait]
impl LiveConnection for WebSocketConnection {
    async fn next_text(&mut self) -> Option<Result<String>> {
        if self.closed {
            return None;
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping non UTF-8 binary frame");
                        continue;
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(?frame, "Server closed WebSocket");
                    return None;
                }
                // Ping, Pong, raw frames.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Some(Err(RagSyncError::Transport(format!(
                        "WebSocket read failed: {}",
                        e
                    ))
                    .into()))
                }
                None => return None,
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let stream = &mut self.stream;
        let handshake = async move {
            if let Err(e) = stream.close(None).await {
                tracing::debug!(error = %e, "WebSocket close did not complete cleanly");
                return;
            }
            // Drain until the peer acknowledges or the stream ends.
            while let Some(Ok(_)) = stream.next().await {}
        };
        if tokio::time::timeout(CLOSE_HANDSHAKE_TIMEOUT, handshake)
            .await
            .is_err()
        {
            tracing::debug!("WebSocket close handshake timed out");
        }
    }
}
