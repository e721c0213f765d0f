//! Video extension chaining.
//!
//! An extension job is derived entirely from the source task's status record:
//! its first work supplies the input video, and the arguments the work was
//! created with supply the original prompt and type tag.

use tracing::info;

use kling_core::{JobPayload, TaskId, TaskState};

use crate::config::Endpoints;
use crate::error::ClientError;
use crate::poll::fetch_snapshot;
use crate::transport::Transport;

/// Build the extension payload for a completed video task.
pub async fn extension_payload(
    transport: &dyn Transport,
    endpoints: &Endpoints,
    source: &TaskId,
) -> Result<JobPayload, ClientError> {
    let snapshot = fetch_snapshot(transport, endpoints, source).await?;

    if snapshot.state != TaskState::Completed {
        return Err(ClientError::Extension(format!(
            "source task {source} is not completed (status {})",
            snapshot.raw_status
        )));
    }

    let work = snapshot
        .works
        .first()
        .ok_or_else(|| ClientError::Extension("no source video".to_string()))?;

    let url = work
        .resource
        .as_deref()
        .ok_or_else(|| ClientError::Extension("source video has no resource".to_string()))?;
    let work_id = work
        .work_id
        .clone()
        .ok_or_else(|| ClientError::Extension("source video has no work id".to_string()))?;
    let initial_type = work
        .job_type
        .as_deref()
        .ok_or_else(|| ClientError::Extension("source task type unknown".to_string()))?;
    let initial_prompt = work.argument("prompt").unwrap_or_default();

    info!(
        source_task = %source,
        work_id = %work_id,
        initial_type = %initial_type,
        "Extending video"
    );

    Ok(JobPayload::video_extend(
        url,
        work_id,
        initial_type,
        initial_prompt,
    ))
}
