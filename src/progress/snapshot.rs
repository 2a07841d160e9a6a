//! Progress snapshot wire model
//!
//! A snapshot is the authoritative description of a session's pipeline at
//! one point in time. Each one supersedes the previous; nothing is merged.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Pipeline stage reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// File bytes are being received
    Uploading,
    /// Document is being split into typed elements
    Partitioning,
    /// Elements are being grouped into retrieval chunks
    Chunking,
    /// Chunks are being embedded and stored
    Vectorization,
    /// Pipeline finished
    Completed,
    /// Pipeline failed; sent alongside `Status::Error`
    Error,
}

impl Stage {
    /// Position in the processing order, `None` for stages outside it.
    ///
    /// `Uploading` precedes every processing stage and `Completed` follows
    /// all of them. `Error` is not ordered.
    pub fn ordinal(self) -> Option<u8> {
        match self {
            Stage::Uploading => Some(0),
            Stage::Partitioning => Some(1),
            Stage::Chunking => Some(2),
            Stage::Vectorization => Some(3),
            Stage::Completed => Some(4),
            Stage::Error => None,
        }
    }

    /// Wire name of the stage
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Uploading => "uploading",
            Stage::Partitioning => "partitioning",
            Stage::Chunking => "chunking",
            Stage::Vectorization => "vectorization",
            Stage::Completed => "completed",
            Stage::Error => "error",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Work in progress
    Processing,
    /// Finished successfully
    Completed,
    /// Failed
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Processing => "processing",
            Status::Completed => "completed",
            Status::Error => "error",
        };
        f.write_str(s)
    }
}

/// Per-chunk transparency record sent while chunking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDetail {
    pub id: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub full_text_length: u64,
    #[serde(default)]
    pub has_text: bool,
    #[serde(default)]
    pub has_table: bool,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default)]
    pub table_count: u32,
    #[serde(default)]
    pub image_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChunkCounts>,
}

/// Table and image counts nested in a [`ChunkDetail`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkCounts {
    pub tables: u32,
    pub images: u32,
}

/// Stage-dependent detail bag
///
/// The server accumulates details across stages, so a late snapshot usually
/// carries every field. Keys this client does not model, and modelled keys
/// whose value has an unexpected shape, are kept in `extra` so a stored
/// snapshot reads back exactly as received. Deserializing never fails on
/// the content of the bag, only on it not being an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_types: Option<BTreeMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vectors_stored: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_details: Option<Vec<ChunkDetail>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgressDetails {
    /// Split a raw detail object into typed fields and `extra`
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        Self {
            filename: take_typed(&mut map, "filename"),
            file_size: take_typed(&mut map, "file_size"),
            elements_count: take_typed(&mut map, "elements_count"),
            element_types: take_typed(&mut map, "element_types"),
            chunks_count: take_typed(&mut map, "chunks_count"),
            vectors_stored: take_typed(&mut map, "vectors_stored"),
            chunk_details: take_typed(&mut map, "chunk_details"),
            extra: map,
        }
    }
}

impl<'de> Deserialize<'de> for ProgressDetails {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::deserialize(deserializer).map(Self::from_map)
    }
}

/// Remove `key` from `map` if its value fits `T`; otherwise leave it there.
fn take_typed<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let parsed = T::deserialize(map.get(key)?);
    match parsed {
        Ok(value) => {
            map.remove(key);
            Some(value)
        }
        Err(e) => {
            tracing::debug!(key, error = %e, "Keeping progress detail untyped");
            None
        }
    }
}

/// A `details` value that is not an object is treated as absent.
fn deserialize_details<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<ProgressDetails>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Ok(Some(ProgressDetails::from_map(map))),
        _ => Ok(None),
    }
}

/// Latest known pipeline state for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub stage: Stage,
    pub status: Status,
    /// Percentage within the active stage, clamped to 0..=100
    #[serde(default, deserialize_with = "deserialize_percent")]
    pub progress: u8,
    #[serde(default)]
    pub message: String,
    #[serde(
        default,
        deserialize_with = "deserialize_details",
        skip_serializing_if = "Option::is_none"
    )]
    pub details: Option<ProgressDetails>,
}

fn deserialize_percent<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(0, 100) as u8)
}

impl ProgressSnapshot {
    /// Build a snapshot without details
    ///
    /// # Examples
    ///
    /// ```
    /// use ragsync::progress::{ProgressSnapshot, Stage, Status};
    ///
    /// let snap = ProgressSnapshot::new(Stage::Chunking, Status::Processing, 40, "Chunking...");
    /// assert!(!snap.is_terminal());
    /// ```
    pub fn new(stage: Stage, status: Status, progress: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            status,
            progress: progress.min(100),
            message: message.into(),
            details: None,
        }
    }

    /// Attach a detail bag
    pub fn with_details(mut self, details: ProgressDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Parse a snapshot from its JSON text form.
    ///
    /// Fails when `stage` or `status` is missing or has an unknown value.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// True once the job has finished and no further snapshots will follow.
    ///
    /// Either field reporting `completed` is enough.
    pub fn is_terminal(&self) -> bool {
        self.status == Status::Completed || self.stage == Stage::Completed
    }
}

/// Classify a text frame that failed to parse as a snapshot.
///
/// The server interleaves `{"type":"connected"}` and `{"type":"ping"}`
/// envelopes with progress frames. Returns the envelope type for those so
/// callers can log them quietly.
pub fn control_frame_type(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let kind = value.get("type")?.as_str()?;
    match kind {
        "connected" | "ping" | "pong" => Some(kind.to_string()),
        _ => None,
    }
}
