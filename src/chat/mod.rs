//! Conversation session
//!
//! Holds the local transcript for one session token and exchanges queries
//! with the RAG service. The user's message is appended before the request
//! goes out; a failed request is answered locally with [`APOLOGY_TEXT`]
//! instead of surfacing the raw error in the transcript.
//!
//! Sending is split in two so a caller can render the pending state while
//! the request is in flight:
//!
//! ```text
//! begin_turn(text) -> PendingTurn      user message appended, is_loading = true
//! finish_turn(pending, outcome)        assistant message appended, is_loading = false
//! ```
//!
//! [`ConversationSession::send`] does both around one API call.

use std::sync::Arc;

use crate::api::{ChatResponse, RagApi};
use crate::error::{Result, RagSyncError};

pub mod message;
pub use message::{ChatMessage, MessageMetadata, Role, APOLOGY_TEXT};

/// A user turn whose answer has not arrived yet
#[derive(Debug)]
#[must_use = "a pending turn leaves the session loading until it is finished"]
pub struct PendingTurn {
    query: String,
}

impl PendingTurn {
    /// Trimmed query text to send
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Chat transcript bound to one session token
#[derive(Debug, Clone)]
pub struct ConversationSession {
    token: String,
    api: Arc<dyn RagApi>,
    messages: Vec<ChatMessage>,
    loading: bool,
}

impl ConversationSession {
    /// Start an empty transcript for `token`
    pub fn new(token: impl Into<String>, api: Arc<dyn RagApi>) -> Self {
        Self {
            token: token.into(),
            api,
            messages: Vec::new(),
            loading: false,
        }
    }

    /// Session token queries are sent under
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Transcript, oldest first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// A request is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Append the user's message and mark the session loading.
    ///
    /// Blank input is rejected and leaves the transcript untouched.
    pub fn begin_turn(&mut self, text: &str) -> Result<PendingTurn> {
        let query = text.trim();
        if query.is_empty() {
            return Err(RagSyncError::InvalidInput("Message must not be empty".into()).into());
        }

        self.messages.push(ChatMessage::user(query));
        self.loading = true;
        Ok(PendingTurn {
            query: query.to_string(),
        })
    }

    /// Append the assistant's side of `pending` and clear the loading flag.
    ///
    /// A failed `outcome` appends the apology message and is returned as a
    /// request error.
    pub fn finish_turn(
        &mut self,
        pending: PendingTurn,
        outcome: Result<ChatResponse>,
    ) -> Result<ChatMessage> {
        self.loading = false;

        match outcome {
            Ok(response) => {
                let message = ChatMessage::from_response(response);
                tracing::debug!(
                    session_id = %self.token,
                    message_id = %message.id,
                    "Assistant answer received"
                );
                self.messages.push(message.clone());
                Ok(message)
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.token,
                    query_len = pending.query.len(),
                    error = %e,
                    "Chat request failed"
                );
                self.messages.push(ChatMessage::apology());
                match e.downcast::<RagSyncError>() {
                    Ok(err @ RagSyncError::Request(_)) => Err(err.into()),
                    Ok(other) => Err(RagSyncError::Request(other.to_string()).into()),
                    Err(other) => Err(RagSyncError::Request(other.to_string()).into()),
                }
            }
        }
    }

    /// Send `text` and wait for the answer
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for blank text and `Request` when the service
    /// rejects the query or cannot be reached.
    pub async fn send(&mut self, text: &str) -> Result<ChatMessage> {
        let pending = self.begin_turn(text)?;
        let outcome = self.api.send_chat(&self.token, pending.query()).await;
        self.finish_turn(pending, outcome)
    }

    /// Fetch the stored transcript and place it ahead of any local messages.
    ///
    /// Failures are logged and yield an empty history.
    pub async fn load_history(&mut self) -> Vec<ChatMessage> {
        let history = match self.api.chat_history(&self.token).await {
            Ok(entries) => entries
                .into_iter()
                .filter_map(ChatMessage::from_history)
                .collect::<Vec<_>>(),
            Err(e) => {
                tracing::warn!(session_id = %self.token, error = %e, "Failed to load chat history");
                return Vec::new();
            }
        };

        tracing::debug!(session_id = %self.token, count = history.len(), "Chat history loaded");
        let local = std::mem::take(&mut self.messages);
        self.messages = history.clone();
        self.messages.extend(local);
        history
    }

    /// Drop the transcript and follow `token` from now on
    pub fn reset(&mut self, token: impl Into<String>) {
        self.token = token.into();
        self.messages.clear();
        self.loading = false;
    }
}
