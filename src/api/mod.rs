//! HTTP API client for the RAG service
//!
//! Thin request/response wrappers: no retries, no backpressure. Every
//! non-success response becomes [`RagSyncError::Request`], carrying the
//! server's `detail` text when it sends one (upload and chat) or a fixed
//! message otherwise.
//!
//! The [`RagApi`] trait is the seam the conversation session and the
//! runtime depend on, so both can be driven by an in-memory fake.

use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::error::{Result, RagSyncError};

pub mod types;
pub use types::{
    ChatHistoryResponse, ChatRequest, ChatResponse, CleanupResponse, HistoryMessage,
    UploadResponse, VisualContent,
};
use types::ErrorBody;

/// Default largest file accepted for upload (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

const UPLOAD_FAILED: &str = "Upload failed";
const CHAT_FAILED: &str = "Chat request failed";
const HISTORY_FAILED: &str = "Failed to fetch chat history";
const CLEAR_FAILED: &str = "Failed to clear session";

/// Operations the client needs from the RAG service
#[async_trait::async_trait]
pub trait RagApi: Send + Sync + std::fmt::Debug {
    /// Upload a document for processing under `session_id`
    async fn upload(&self, session_id: &str, path: &Path) -> Result<UploadResponse>;

    /// Ask a question about the session's documents
    async fn send_chat(&self, session_id: &str, query: &str) -> Result<ChatResponse>;

    /// Fetch the stored transcript, oldest first
    async fn chat_history(&self, session_id: &str) -> Result<Vec<HistoryMessage>>;

    /// Delete everything the server holds for `session_id`
    async fn clear_session(&self, session_id: &str) -> Result<CleanupResponse>;
}

/// `reqwest`-backed [`RagApi`] implementation
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use url::Url;
/// use ragsync::api::ApiClient;
///
/// let client = ApiClient::new(
///     Url::parse("http://localhost:8000").unwrap(),
///     Duration::from_secs(30),
/// ).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    max_upload_bytes: u64,
}

impl ApiClient {
    /// Create a client for the service at `base`.
    ///
    /// `timeout` applies to each request individually.
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagSyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        })
    }

    /// Override the client-side upload size limit
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Base URL of the service
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RagSyncError::Config(format!("Invalid API base URL: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Check the file before any bytes go over the wire.
    ///
    /// Only PDFs are processed by the service.
    async fn validate_upload(&self, path: &Path) -> Result<(String, u64)> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            RagSyncError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(
                RagSyncError::InvalidInput(format!("{} is not a file", path.display())).into(),
            );
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err(RagSyncError::InvalidInput(format!(
                "Only PDF files are supported: {}",
                path.display()
            ))
            .into());
        }

        let size = metadata.len();
        if size > self.max_upload_bytes {
            return Err(RagSyncError::InvalidInput(format!(
                "File is {} bytes; the limit is {} bytes",
                size, self.max_upload_bytes
            ))
            .into());
        }

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        Ok((filename, size))
    }
}

/// Turn a non-success response into a request error.
///
/// Prefers the body's `detail` string; otherwise `fallback`.
async fn error_from_response(response: reqwest::Response, fallback: &str) -> anyhow::Error {
    let status = response.status();
    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail_text());
    tracing::warn!(status = %status, detail = ?detail, "{}", fallback);
    RagSyncError::Request(detail.unwrap_or_else(|| fallback.to_string())).into()
}

fn send_error(e: reqwest::Error, fallback: &str) -> anyhow::Error {
    tracing::warn!(error = %e, "{}", fallback);
    RagSyncError::Request(format!("{}: {}", fallback, e)).into()
}

#[async_trait::async_trait]
impl RagApi for ApiClient {
    async fn upload(&self, session_id: &str, path: &Path) -> Result<UploadResponse> {
        let (filename, size) = self.validate_upload(path).await?;
        let bytes = tokio::fs::read(path).await?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.clone())
            .mime_str("application/pdf")
            .map_err(|e| RagSyncError::Request(format!("{}: {}", UPLOAD_FAILED, e)))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("session_id", session_id.to_string());

        tracing::info!(session_id = %session_id, filename = %filename, size, "Uploading document");
        let response = self
            .http
            .post(self.endpoint(&["api", "upload"])?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| send_error(e, UPLOAD_FAILED))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, UPLOAD_FAILED).await);
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| send_error(e, UPLOAD_FAILED))?;
        tracing::info!(document_id = %uploaded.document_id, "Document accepted for processing");
        Ok(uploaded)
    }

    async fn send_chat(&self, session_id: &str, query: &str) -> Result<ChatResponse> {
        tracing::debug!(session_id = %session_id, "Sending chat query");
        let response = self
            .http
            .post(self.endpoint(&["api", "chat"])?)
            .json(&ChatRequest { session_id, query })
            .send()
            .await
            .map_err(|e| send_error(e, CHAT_FAILED))?;

        if !response.status().is_success() {
            return Err(error_from_response(response, CHAT_FAILED).await);
        }

        response.json().await.map_err(|e| send_error(e, CHAT_FAILED))
    }

    async fn chat_history(&self, session_id: &str) -> Result<Vec<HistoryMessage>> {
        let response = self
            .http
            .get(self.endpoint(&["api", "chat", "history", session_id])?)
            .send()
            .await
            .map_err(|e| send_error(e, HISTORY_FAILED))?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "{}", HISTORY_FAILED);
            return Err(RagSyncError::Request(HISTORY_FAILED.to_string()).into());
        }

        let history: ChatHistoryResponse = response
            .json()
            .await
            .map_err(|e| send_error(e, HISTORY_FAILED))?;
        Ok(history.messages)
    }

    async fn clear_session(&self, session_id: &str) -> Result<CleanupResponse> {
        let response = self
            .http
            .delete(self.endpoint(&["api", "documents", "session", session_id])?)
            .send()
            .await
            .map_err(|e| send_error(e, CLEAR_FAILED))?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "{}", CLEAR_FAILED);
            return Err(RagSyncError::Request(CLEAR_FAILED.to_string()).into());
        }

        response.json().await.map_err(|e| send_error(e, CLEAR_FAILED))
    }
}
