//! Transcript message types

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{ChatResponse, HistoryMessage, VisualContent};

/// Assistant text used when a chat request fails
pub const APOLOGY_TEXT: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

/// Who authored a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Map a server role string; `system` and unknown roles are not shown
    pub fn from_wire(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Supporting content attached to an assistant answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Number of document chunks the answer drew on
    pub chunks_used: usize,
    pub has_tables: bool,
    pub has_images: bool,
    /// Table markup, one entry per table
    pub tables: Vec<String>,
    /// Base64 image payloads
    pub images: Vec<String>,
}

impl From<&VisualContent> for MessageMetadata {
    fn from(visuals: &VisualContent) -> Self {
        Self {
            chunks_used: visuals.chunks.len(),
            has_tables: !visuals.tables.is_empty(),
            has_images: !visuals.images.is_empty(),
            tables: visuals.table_markup(),
            images: visuals.image_payloads(),
        }
    }
}

/// One entry in the local transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// RFC 3339 timestamp, as sent by the server for assistant answers
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    /// A message typed by the user, stamped now
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::User,
            content: content.into(),
            timestamp: now_rfc3339(),
            metadata: None,
        }
    }

    /// The fixed assistant reply appended when a request fails
    pub fn apology() -> Self {
        Self {
            id: new_message_id(),
            role: Role::Assistant,
            content: APOLOGY_TEXT.to_string(),
            timestamp: now_rfc3339(),
            metadata: None,
        }
    }

    /// An assistant answer from a chat response
    pub fn from_response(response: ChatResponse) -> Self {
        let metadata = MessageMetadata::from(&response.visuals);
        Self {
            id: response.message_id,
            role: Role::Assistant,
            content: response.answer,
            timestamp: response.timestamp,
            metadata: Some(metadata),
        }
    }

    /// A stored history entry, or `None` for roles the transcript does not show
    pub fn from_history(message: HistoryMessage) -> Option<Self> {
        let role = Role::from_wire(&message.role)?;
        Some(Self {
            id: message.id,
            role,
            content: message.content,
            timestamp: message.timestamp,
            metadata: message.visuals.as_ref().map(MessageMetadata::from),
        })
    }
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_from_visuals() {
        let visuals = VisualContent {
            tables: vec![json!({"html": "<table/>"})],
            images: vec![],
            chunks: vec![json!({"id": "c1"}), json!({"id": "c2"})],
        };
        let metadata = MessageMetadata::from(&visuals);

        assert_eq!(metadata.chunks_used, 2);
        assert!(metadata.has_tables);
        assert!(!metadata.has_images);
        assert_eq!(metadata.tables, vec!["<table/>"]);
        assert!(metadata.images.is_empty());
    }

    #[test]
    fn test_from_response_keeps_server_id_and_timestamp() {
        let response = ChatResponse {
            message_id: "m-7".into(),
            answer: "Revenue grew 12%.".into(),
            visuals: VisualContent::default(),
            timestamp: "2025-03-01T10:00:00Z".into(),
            processing_time: 1.5,
        };
        let message = ChatMessage::from_response(response);

        assert_eq!(message.id, "m-7");
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.timestamp, "2025-03-01T10:00:00Z");
        assert_eq!(message.metadata.unwrap().chunks_used, 0);
    }

    #[test]
    fn test_from_history_skips_system_messages() {
        let system = HistoryMessage {
            id: "s".into(),
            role: "system".into(),
            content: "context".into(),
            visuals: None,
            timestamp: "t".into(),
        };
        assert!(ChatMessage::from_history(system).is_none());
    }

    #[test]
    fn test_from_history_maps_visuals() {
        let entry = HistoryMessage {
            id: "a1".into(),
            role: "assistant".into(),
            content: "See table".into(),
            visuals: Some(VisualContent {
                images: vec![json!("aGk=")],
                ..Default::default()
            }),
            timestamp: "t".into(),
        };
        let message = ChatMessage::from_history(entry).unwrap();
        let metadata = message.metadata.unwrap();
        assert!(metadata.has_images);
        assert_eq!(metadata.images, vec!["aGk="]);
    }

    #[test]
    fn test_user_message_timestamp_is_rfc3339() {
        let message = ChatMessage::user("hi");
        assert!(chrono::DateTime::parse_from_rfc3339(&message.timestamp).is_ok());
        assert!(message.metadata.is_none());
    }
}
