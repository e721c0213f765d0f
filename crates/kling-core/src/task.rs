//! Task handles and status snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{TaskId, WorkId};
use crate::job::Argument;
use crate::status::TaskState;

/// A submitted task. Cheap to clone and keep for a later extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Id assigned by the service.
    pub id: TaskId,

    /// When the submission was accepted.
    pub submitted_at: DateTime<Utc>,
}

impl TaskHandle {
    /// Create a handle stamped with the current time.
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            submitted_at: Utc::now(),
        }
    }
}

/// One produced artifact of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    /// Service-internal work id. Only needed to extend the work.
    pub work_id: Option<WorkId>,

    /// Downloadable URL, once the artifact exists.
    pub resource: Option<String>,

    /// Arguments of the job that produced this work.
    pub arguments: Vec<Argument>,

    /// Type tag of the job that produced this work.
    pub job_type: Option<String>,
}

impl Work {
    /// Look up an argument of the originating job.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// Result of a single status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Status exactly as reported.
    pub raw_status: i64,

    /// [`TaskState::classify`] of `raw_status`.
    pub state: TaskState,

    /// Works reported so far.
    pub works: Vec<Work>,
}

impl TaskSnapshot {
    /// Build a snapshot, classifying the raw status.
    pub fn new(raw_status: i64, works: Vec<Work>) -> Self {
        Self {
            raw_status,
            state: TaskState::classify(raw_status),
            works,
        }
    }

    /// Resource URLs of a completed task, in work order, skipping works
    /// without one. Empty for any other state, even if works are present.
    pub fn resources(&self) -> Vec<String> {
        if self.state != TaskState::Completed {
            return Vec::new();
        }
        self.works
            .iter()
            .filter_map(|w| w.resource.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(id: &str, resource: Option<&str>) -> Work {
        Work {
            work_id: Some(WorkId::new(id)),
            resource: resource.map(str::to_string),
            arguments: vec![Argument::new("prompt", "a cat")],
            job_type: Some("mmu_txt2img_aiweb".to_string()),
        }
    }

    #[test]
    fn test_resources_skip_missing() {
        let snapshot = TaskSnapshot::new(
            99,
            vec![
                work("1", Some("https://cdn/a.png")),
                work("2", None),
                work("3", Some("https://cdn/c.png")),
            ],
        );
        assert_eq!(snapshot.state, TaskState::Completed);
        assert_eq!(
            snapshot.resources(),
            vec!["https://cdn/a.png".to_string(), "https://cdn/c.png".to_string()]
        );
    }

    #[test]
    fn test_failed_snapshot_has_no_resources() {
        let snapshot = TaskSnapshot::new(50, vec![work("1", Some("https://cdn/a.png"))]);
        assert_eq!(snapshot.state, TaskState::Failed);
        assert!(snapshot.resources().is_empty());
    }

    #[test]
    fn test_work_argument_lookup() {
        let w = work("1", None);
        assert_eq!(w.argument("prompt"), Some("a cat"));
        assert_eq!(w.argument("style"), None);
    }
}
