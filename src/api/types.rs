//! Request and response bodies for the RAG service HTTP API

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Response to a document upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub document_id: String,
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Body of a chat request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub session_id: &'a str,
    pub query: &'a str,
}

/// Auxiliary visual content returned with an answer
///
/// Entries are kept as raw JSON: the server sends either objects
/// (`{"html": ...}`, `{"base64": ...}`) or the bare string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualContent {
    #[serde(default)]
    pub tables: Vec<Value>,
    #[serde(default)]
    pub images: Vec<Value>,
    #[serde(default)]
    pub chunks: Vec<Value>,
}

impl VisualContent {
    /// Table markup, one string per table
    pub fn table_markup(&self) -> Vec<String> {
        self.tables.iter().map(|t| flatten_entry(t, "html")).collect()
    }

    /// Base64 image payloads, one string per image
    pub fn image_payloads(&self) -> Vec<String> {
        self.images.iter().map(|i| flatten_entry(i, "base64")).collect()
    }
}

/// Pick `field` out of an object entry, or take a bare string entry as is.
///
/// Anything else is kept as its JSON text so nothing is silently lost.
fn flatten_entry(entry: &Value, field: &str) -> String {
    match entry {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get(field) {
            Some(Value::String(s)) => s.clone(),
            _ => entry.to_string(),
        },
        other => other.to_string(),
    }
}

/// Response to a chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message_id: String,
    pub answer: String,
    #[serde(default)]
    pub visuals: VisualContent,
    pub timestamp: String,
    #[serde(default)]
    pub processing_time: f64,
}

/// One stored message in the server's chat history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub visuals: Option<VisualContent>,
    pub timestamp: String,
}

/// Response to a chat history fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
    #[serde(default)]
    pub total_count: usize,
}

/// Response to a session clear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub deleted_items: BTreeMap<String, u64>,
}

/// Error body returned on non-success responses
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// `detail` when it is a non-empty string.
    ///
    /// Validation failures carry a list here instead; those fall back to the
    /// caller's generic message.
    pub fn detail_text(&self) -> Option<String> {
        match &self.detail {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_markup_accepts_object_and_string_entries() {
        let visuals = VisualContent {
            tables: vec![json!({"html": "<table/>", "page": 2}), json!("<table id=2/>")],
            ..Default::default()
        };
        assert_eq!(visuals.table_markup(), vec!["<table/>", "<table id=2/>"]);
    }

    #[test]
    fn test_image_payloads_accepts_object_and_string_entries() {
        let visuals = VisualContent {
            images: vec![json!({"base64": "aGVsbG8="}), json!("d29ybGQ=")],
            ..Default::default()
        };
        assert_eq!(visuals.image_payloads(), vec!["aGVsbG8=", "d29ybGQ="]);
    }

    #[test]
    fn test_entry_without_expected_field_keeps_json_text() {
        let visuals = VisualContent {
            tables: vec![json!({"rows": 3})],
            ..Default::default()
        };
        assert_eq!(visuals.table_markup(), vec![r#"{"rows":3}"#]);
    }

    #[test]
    fn test_chat_response_tolerates_missing_visuals() {
        let response: ChatResponse = serde_json::from_value(json!({
            "message_id": "m1",
            "answer": "42",
            "timestamp": "2025-01-01T00:00:00"
        }))
        .unwrap();
        assert!(response.visuals.tables.is_empty());
        assert_eq!(response.processing_time, 0.0);
    }

    #[test]
    fn test_error_body_detail_text() {
        let body: ErrorBody = serde_json::from_value(json!({"detail": "File too large"})).unwrap();
        assert_eq!(body.detail_text().as_deref(), Some("File too large"));

        let body: ErrorBody =
            serde_json::from_value(json!({"detail": [{"loc": ["body"], "msg": "bad"}]})).unwrap();
        assert!(body.detail_text().is_none());

        let body: ErrorBody = serde_json::from_value(json!({})).unwrap();
        assert!(body.detail_text().is_none());
    }
}
