//! Derived stage statuses for display
//!
//! Pure mapping from the latest snapshot to the four stages the display
//! tracks. No storage, no history: the same snapshot always yields the same
//! result.

use serde::Serialize;
use std::fmt;

use crate::progress::{ProgressSnapshot, Stage, Status};

/// Display status of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Not reached yet
    Pending,
    /// Current stage, still running
    Active,
    /// Done
    Completed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageStatus::Pending => "pending",
            StageStatus::Active => "active",
            StageStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Per-stage statuses derived from one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedStages {
    pub upload: StageStatus,
    pub partitioning: StageStatus,
    pub chunking: StageStatus,
    pub vectorization: StageStatus,
    /// Overall status is `completed`
    pub overall_completed: bool,
    /// Overall status is `error`
    pub failed: bool,
}

impl DerivedStages {
    /// Rows in display order, labelled
    pub fn rows(&self) -> [(&'static str, StageStatus); 4] {
        [
            ("upload", self.upload),
            ("partitioning", self.partitioning),
            ("chunking", self.chunking),
            ("vectorization", self.vectorization),
        ]
    }
}

/// Derive display statuses from the latest snapshot, if any.
///
/// Upload has no sub-protocol of its own: it counts as completed as soon as
/// any snapshot exists, whatever stage that snapshot is at.
///
/// # Examples
///
/// ```
/// use ragsync::progress::{derive_stages, ProgressSnapshot, Stage, StageStatus, Status};
///
/// let snap = ProgressSnapshot::new(Stage::Chunking, Status::Processing, 30, "");
/// let stages = derive_stages(Some(&snap));
/// assert_eq!(stages.partitioning, StageStatus::Completed);
/// assert_eq!(stages.chunking, StageStatus::Active);
/// assert_eq!(stages.vectorization, StageStatus::Pending);
///
/// assert_eq!(derive_stages(None).upload, StageStatus::Pending);
/// ```
pub fn derive_stages(snapshot: Option<&ProgressSnapshot>) -> DerivedStages {
    let Some(snapshot) = snapshot else {
        return DerivedStages {
            upload: StageStatus::Pending,
            partitioning: StageStatus::Pending,
            chunking: StageStatus::Pending,
            vectorization: StageStatus::Pending,
            overall_completed: false,
            failed: false,
        };
    };

    let overall_completed = snapshot.status == Status::Completed;

    DerivedStages {
        upload: StageStatus::Completed,
        partitioning: processing_stage_status(snapshot, Stage::Partitioning, overall_completed),
        chunking: processing_stage_status(snapshot, Stage::Chunking, overall_completed),
        vectorization: processing_stage_status(snapshot, Stage::Vectorization, overall_completed),
        overall_completed,
        failed: snapshot.status == Status::Error,
    }
}

fn processing_stage_status(
    snapshot: &ProgressSnapshot,
    stage: Stage,
    overall_completed: bool,
) -> StageStatus {
    if overall_completed {
        return StageStatus::Completed;
    }
    if snapshot.stage == stage {
        return StageStatus::Active;
    }
    match (snapshot.stage.ordinal(), stage.ordinal()) {
        (Some(current), Some(target)) if current > target => StageStatus::Completed,
        _ => StageStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(stage: Stage, status: Status) -> ProgressSnapshot {
        ProgressSnapshot::new(stage, status, 50, "")
    }

    #[test]
    fn test_absent_snapshot_is_all_pending() {
        let stages = derive_stages(None);
        assert!(stages.rows().iter().all(|(_, s)| *s == StageStatus::Pending));
        assert!(!stages.overall_completed);
        assert!(!stages.failed);
    }

    #[test]
    fn test_uploading_snapshot_completes_upload_only() {
        let stages = derive_stages(Some(&snap(Stage::Uploading, Status::Processing)));
        assert_eq!(stages.upload, StageStatus::Completed);
        assert_eq!(stages.partitioning, StageStatus::Pending);
        assert_eq!(stages.chunking, StageStatus::Pending);
        assert_eq!(stages.vectorization, StageStatus::Pending);
    }

    #[test]
    fn test_partitioning_active() {
        let stages = derive_stages(Some(&snap(Stage::Partitioning, Status::Processing)));
        assert_eq!(stages.upload, StageStatus::Completed);
        assert_eq!(stages.partitioning, StageStatus::Active);
        assert_eq!(stages.chunking, StageStatus::Pending);
    }

    #[test]
    fn test_vectorization_active_marks_earlier_completed() {
        let stages = derive_stages(Some(&snap(Stage::Vectorization, Status::Processing)));
        assert_eq!(stages.partitioning, StageStatus::Completed);
        assert_eq!(stages.chunking, StageStatus::Completed);
        assert_eq!(stages.vectorization, StageStatus::Active);
        assert!(!stages.overall_completed);
    }

    #[test]
    fn test_completed_stage_marks_everything_completed() {
        let stages = derive_stages(Some(&snap(Stage::Completed, Status::Completed)));
        assert!(stages.rows().iter().all(|(_, s)| *s == StageStatus::Completed));
        assert!(stages.overall_completed);
    }

    #[test]
    fn test_completed_status_overrides_active_stage() {
        let stages = derive_stages(Some(&snap(Stage::Chunking, Status::Completed)));
        assert_eq!(stages.chunking, StageStatus::Completed);
        assert_eq!(stages.vectorization, StageStatus::Completed);
    }

    #[test]
    fn test_completed_stage_without_completed_status() {
        let stages = derive_stages(Some(&snap(Stage::Completed, Status::Processing)));
        assert_eq!(stages.vectorization, StageStatus::Completed);
        assert!(!stages.overall_completed);
    }

    #[test]
    fn test_error_stage_leaves_processing_pending_and_flags_failure() {
        let stages = derive_stages(Some(&snap(Stage::Error, Status::Error)));
        assert_eq!(stages.upload, StageStatus::Completed);
        assert_eq!(stages.partitioning, StageStatus::Pending);
        assert_eq!(stages.vectorization, StageStatus::Pending);
        assert!(stages.failed);
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let s = snap(Stage::Chunking, Status::Processing);
        assert_eq!(derive_stages(Some(&s)), derive_stages(Some(&s)));
    }

    #[test]
    fn test_only_latest_snapshot_matters() {
        let latest = snap(Stage::Chunking, Status::Processing);
        let direct = derive_stages(Some(&latest));
        // Arriving after a later-stage snapshot does not change the result.
        let _earlier = derive_stages(Some(&snap(Stage::Vectorization, Status::Processing)));
        assert_eq!(derive_stages(Some(&latest)), direct);
    }
}
