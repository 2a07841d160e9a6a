//! Test utilities for ragsync
//!
//! Temporary directory helpers and a scripted in-memory [`RagApi`].

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tempfile::TempDir;

use crate::api::{ChatResponse, CleanupResponse, HistoryMessage, RagApi, UploadResponse};
use crate::error::{Result, RagSyncError};

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
pub fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error message contains `expected`
pub fn assert_error_contains(err: &anyhow::Error, expected: &str) {
    let message = err.to_string();
    assert!(
        message.contains(expected),
        "Error message '{}' does not contain '{}'",
        message,
        expected
    );
}

/// Scripted [`RagApi`] that records what it was asked.
///
/// Chat replies are consumed in order; an unscripted chat call fails.
#[derive(Debug, Default)]
pub struct FakeApi {
    chat_replies: Mutex<VecDeque<std::result::Result<ChatResponse, String>>>,
    chat_queries: Mutex<Vec<(String, String)>>,
    history: Mutex<Vec<HistoryMessage>>,
    history_fails: AtomicBool,
    clear_fails: AtomicBool,
    cleared: Mutex<Vec<String>>,
    uploads: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chat_reply(&self, response: ChatResponse) {
        self.chat_replies.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_chat_error(&self, detail: &str) {
        self.chat_replies
            .lock()
            .unwrap()
            .push_back(Err(detail.to_string()));
    }

    pub fn set_history(&self, messages: Vec<HistoryMessage>) {
        *self.history.lock().unwrap() = messages;
    }

    pub fn fail_history(&self) {
        self.history_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_clear(&self) {
        self.clear_fails.store(true, Ordering::SeqCst);
    }

    /// `(session_id, query)` of every chat call
    pub fn chat_queries(&self) -> Vec<(String, String)> {
        self.chat_queries.lock().unwrap().clone()
    }

    /// Session ids passed to `clear_session`, successful or not
    pub fn cleared(&self) -> Vec<String> {
        self.cleared.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<(String, PathBuf)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RagApi for FakeApi {
    async fn upload(&self, session_id: &str, path: &Path) -> Result<UploadResponse> {
        self.uploads
            .lock()
            .unwrap()
            .push((session_id.to_string(), path.to_path_buf()));
        Ok(UploadResponse {
            document_id: "doc-1".into(),
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            status: "processing".into(),
            message: "Document uploaded".into(),
        })
    }

    async fn send_chat(&self, session_id: &str, query: &str) -> Result<ChatResponse> {
        self.chat_queries
            .lock()
            .unwrap()
            .push((session_id.to_string(), query.to_string()));
        match self.chat_replies.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(detail)) => Err(RagSyncError::Request(detail).into()),
            None => Err(RagSyncError::Request("Chat request failed".into()).into()),
        }
    }

    async fn chat_history(&self, _session_id: &str) -> Result<Vec<HistoryMessage>> {
        if self.history_fails.load(Ordering::SeqCst) {
            return Err(RagSyncError::Request("Failed to fetch chat history".into()).into());
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn clear_session(&self, session_id: &str) -> Result<CleanupResponse> {
        self.cleared.lock().unwrap().push(session_id.to_string());
        if self.clear_fails.load(Ordering::SeqCst) {
            return Err(RagSyncError::Request("Failed to clear session".into()).into());
        }
        Ok(CleanupResponse {
            status: "success".into(),
            message: format!("Cleared session {}", session_id),
            deleted_items: Default::default(),
        })
    }
}
