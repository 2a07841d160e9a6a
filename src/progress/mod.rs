//! Progress snapshots, their local cache, and derived stage statuses

pub mod cache;
pub mod snapshot;
pub mod stages;

pub use cache::ProgressCache;
pub use snapshot::{
    control_frame_type, ChunkCounts, ChunkDetail, ProgressDetails, ProgressSnapshot, Stage, Status,
};
pub use stages::{derive_stages, DerivedStages, StageStatus};
