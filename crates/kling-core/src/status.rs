//! Task state as classified from the service's raw numeric status.

use serde::{Deserialize, Serialize};

/// Lowest raw status that means the task finished producing media.
pub const COMPLETED_THRESHOLD: i64 = 90;

/// Raw statuses the service uses for a rejected or crashed generation.
pub const FAILED_STATUSES: [i64; 2] = [9, 50];

/// Client-side view of a remote task. Never transmitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Queued or generating.
    #[default]
    Pending,
    /// Finished; works are available.
    Completed,
    /// The service gave up on the task.
    Failed,
}

impl TaskState {
    /// Classify a raw status value.
    ///
    /// `>= 90` is Completed, `9` and `50` are Failed, anything else is still
    /// Pending. The rule is the same for every job kind.
    pub fn classify(raw: i64) -> Self {
        if raw >= COMPLETED_THRESHOLD {
            Self::Completed
        } else if FAILED_STATUSES.contains(&raw) {
            Self::Failed
        } else {
            Self::Pending
        }
    }

    /// Returns true if polling can stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}
