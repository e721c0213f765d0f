//! Task submission.

use tracing::{debug, info};

use kling_core::{JobPayload, TaskHandle};

use crate::config::Endpoints;
use crate::error::ClientError;
use crate::transport::{HttpRequest, Transport};
use crate::wire::{Envelope, SubmitData};

/// Inline status the service uses to reject a payload it accepted over HTTP.
pub const REJECTED_STATUS: i64 = 7;

/// Post a job and return the handle of the created task.
pub async fn submit_job(
    transport: &dyn Transport,
    endpoints: &Endpoints,
    payload: &JobPayload,
) -> Result<TaskHandle, ClientError> {
    let body = serde_json::to_value(payload)
        .map_err(|e| ClientError::Submission(format!("payload encoding: {e}")))?;

    debug!(job_type = %payload.job_type, "Submitting job");
    let response = transport
        .send(HttpRequest::post(endpoints.task_submit()).json(body))
        .await?;

    if !response.is_success() {
        return Err(ClientError::Submission(format!(
            "HTTP {}: {}",
            response.status,
            response.text()
        )));
    }

    let envelope: Envelope<SubmitData> = response.json()?;
    let Some(data) = envelope.data else {
        return Err(ClientError::Submission("no task id".to_string()));
    };

    if data.status == Some(REJECTED_STATUS) {
        let message = data
            .message
            .unwrap_or_else(|| "rejected without message".to_string());
        return Err(ClientError::Submission(message));
    }

    let id = data
        .task
        .and_then(|t| t.id)
        .filter(|id| !id.as_str().is_empty())
        .ok_or_else(|| ClientError::Submission("no task id".to_string()))?;

    info!(task_id = %id, job_type = %payload.job_type, "Task submitted");
    Ok(TaskHandle::new(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use crate::transport::Body;
    use kling_core::Quality;
    use serde_json::json;

    fn endpoints() -> Endpoints {
        Endpoints::new("https://kling.test", "https://upload.test")
    }

    #[tokio::test]
    async fn test_submit_returns_task_id() {
        let mock = MockTransport::new();
        mock.push_json(200, json!({"status": 200, "data": {"task": {"id": "T1"}}}));

        let payload = JobPayload::text_to_image("a cat");
        let handle = submit_job(&mock, &endpoints(), &payload).await.unwrap();
        assert_eq!(handle.id.as_str(), "T1");

        let request = &mock.requests()[0];
        assert_eq!(request.url, endpoints().task_submit());
        match &request.body {
            Body::Json(body) => {
                assert_eq!(body["type"], "mmu_txt2img_aiweb");
                assert_eq!(body["arguments"][0]["value"], "a cat");
            }
            other => panic!("Expected JSON body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_inline_rejection() {
        let mock = MockTransport::new();
        mock.push_json(200, json!({"data": {"status": 7, "message": "quota exceeded"}}));

        let payload = JobPayload::text_to_video("P", Quality::Standard);
        let err = submit_job(&mock, &endpoints(), &payload).await.unwrap_err();
        assert!(matches!(err, ClientError::Submission(ref m) if m.contains("quota exceeded")));
    }

    #[tokio::test]
    async fn test_http_failure_carries_body() {
        let mock = MockTransport::new();
        mock.push_bytes(500, b"internal boom".to_vec());

        let payload = JobPayload::text_to_image("p");
        let err = submit_job(&mock, &endpoints(), &payload).await.unwrap_err();
        assert!(matches!(err, ClientError::Submission(ref m) if m.contains("internal boom")));
    }

    #[tokio::test]
    async fn test_missing_task_id() {
        let mock = MockTransport::new();
        mock.push_json(200, json!({"data": {"task": {}}}))
            .push_json(200, json!({"status": 200}));

        let payload = JobPayload::text_to_image("p");
        for _ in 0..2 {
            let err = submit_job(&mock, &endpoints(), &payload).await.unwrap_err();
            assert!(matches!(err, ClientError::Submission(ref m) if m == "no task id"));
        }
    }
}
