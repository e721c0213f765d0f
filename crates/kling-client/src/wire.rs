//! Typed response schemas, decoded once at the boundary.

use serde::Deserialize;

use kling_core::{Argument, TaskId, TaskSnapshot, Work, WorkId};

/// Common wrapper of the main API host.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: Option<i64>,
    pub message: Option<String>,
    pub data: Option<T>,
}

/// `data` of a task submission.
#[derive(Debug, Deserialize)]
pub struct SubmitData {
    /// Inline status. `7` means the payload was rejected.
    pub status: Option<i64>,
    pub message: Option<String>,
    pub task: Option<SubmittedTask>,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedTask {
    pub id: Option<TaskId>,
}

/// `data` of a task status poll.
#[derive(Debug, Deserialize)]
pub struct StatusData {
    pub status: i64,
    pub works: Option<Vec<WireWork>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireWork {
    pub work_id: Option<WorkId>,
    pub resource: Option<WireResource>,
    pub task_info: Option<WireTaskInfo>,
}

#[derive(Debug, Deserialize)]
pub struct WireResource {
    pub resource: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireTaskInfo {
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub arguments: Option<Vec<Argument>>,
}

impl From<WireWork> for Work {
    fn from(wire: WireWork) -> Self {
        let (job_type, arguments) = match wire.task_info {
            Some(info) => (info.job_type, info.arguments.unwrap_or_default()),
            None => (None, Vec::new()),
        };
        Work {
            work_id: wire.work_id,
            resource: wire.resource.and_then(|r| r.resource).filter(|r| !r.is_empty()),
            arguments,
            job_type,
        }
    }
}

impl From<StatusData> for TaskSnapshot {
    fn from(data: StatusData) -> Self {
        let works = data
            .works
            .unwrap_or_default()
            .into_iter()
            .map(Work::from)
            .collect();
        TaskSnapshot::new(data.status, works)
    }
}

/// `{status, data: {token}}` from the token issue endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenData {
    pub token: String,
}

/// `{result}` from the upload host.
#[derive(Debug, Deserialize)]
pub struct UploadResult {
    pub result: Option<i64>,
}

/// `{status, data: {url}}` from the verify endpoint.
#[derive(Debug, Deserialize)]
pub struct VerifyData {
    pub url: String,
}

/// `{status, data: {total}}` from the point endpoint. Scaled by 100.
#[derive(Debug, Deserialize)]
pub struct PointData {
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kling_core::TaskState;

    #[test]
    fn test_status_decoding() {
        let body = r#"{
            "status": 200,
            "data": {
                "status": 99,
                "works": [{
                    "workId": 1234,
                    "resource": {"resource": "https://cdn/v.mp4"},
                    "taskInfo": {
                        "type": "m2v_txt2video",
                        "arguments": [{"name": "prompt", "value": "a dog"}]
                    }
                }]
            }
        }"#;
        let envelope: Envelope<StatusData> = serde_json::from_str(body).unwrap();
        let snapshot = TaskSnapshot::from(envelope.data.unwrap());

        assert_eq!(snapshot.state, TaskState::Completed);
        let work = &snapshot.works[0];
        assert_eq!(work.work_id, Some(WorkId::new("1234")));
        assert_eq!(work.resource.as_deref(), Some("https://cdn/v.mp4"));
        assert_eq!(work.job_type.as_deref(), Some("m2v_txt2video"));
        assert_eq!(work.argument("prompt"), Some("a dog"));
    }

    #[test]
    fn test_status_tolerates_sparse_works() {
        let body = r#"{"data": {"status": 5, "works": null}}"#;
        let envelope: Envelope<StatusData> = serde_json::from_str(body).unwrap();
        let snapshot = TaskSnapshot::from(envelope.data.unwrap());
        assert_eq!(snapshot.state, TaskState::Pending);
        assert!(snapshot.works.is_empty());

        let body = r#"{"data": {"status": 99, "works": [{"resource": {}}]}}"#;
        let envelope: Envelope<StatusData> = serde_json::from_str(body).unwrap();
        let snapshot = TaskSnapshot::from(envelope.data.unwrap());
        assert_eq!(snapshot.works[0].resource, None);
        assert_eq!(snapshot.works[0].work_id, None);
    }

    #[test]
    fn test_status_requires_numeric_status() {
        let body = r#"{"data": {"works": []}}"#;
        assert!(serde_json::from_str::<Envelope<StatusData>>(body).is_err());
    }

    #[test]
    fn test_submit_decoding() {
        let body = r#"{"status": 200, "data": {"task": {"id": 5566}}}"#;
        let envelope: Envelope<SubmitData> = serde_json::from_str(body).unwrap();
        let id = envelope.data.unwrap().task.unwrap().id.unwrap();
        assert_eq!(id.as_str(), "5566");

        let body = r#"{"data": {"status": 7, "message": "quota exceeded"}}"#;
        let envelope: Envelope<SubmitData> = serde_json::from_str(body).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data.status, Some(7));
        assert_eq!(data.message.as_deref(), Some("quota exceeded"));
    }
}
