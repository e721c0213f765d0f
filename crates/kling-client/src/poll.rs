//! Completion polling.
//!
//! A task stays Pending for an arbitrary time, so the poller only gives up on
//! its wall-clock deadline or when the caller cancels. It never polls faster
//! than the policy interval and never polls again once a terminal state has
//! been seen.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use kling_core::{TaskId, TaskSnapshot, TaskState};

use crate::config::{Endpoints, PollPolicy};
use crate::error::ClientError;
use crate::transport::{HttpRequest, Transport};
use crate::wire::{Envelope, StatusData};

/// Query a task's status once.
pub async fn fetch_snapshot(
    transport: &dyn Transport,
    endpoints: &Endpoints,
    task_id: &TaskId,
) -> Result<TaskSnapshot, ClientError> {
    let response = transport
        .send(HttpRequest::get(endpoints.task_status()).query("taskId", task_id))
        .await?
        .error_for_status()?;

    let envelope: Envelope<StatusData> = response.json()?;
    let data = envelope.data.ok_or_else(|| {
        ClientError::Decode(format!("status of task {task_id} has no data"))
    })?;
    Ok(TaskSnapshot::from(data))
}

/// Sleep for `duration` unless cancelled first.
pub(crate) async fn pause(
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), ClientError> {
    tokio::select! {
        _ = tokio::time::sleep(duration) => Ok(()),
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
    }
}

/// Drives one task to a terminal state.
pub struct TaskPoller<'a> {
    transport: &'a dyn Transport,
    endpoints: &'a Endpoints,
    policy: PollPolicy,
    resource_grace: Duration,
    cancel: CancellationToken,
}

impl<'a> TaskPoller<'a> {
    /// Create a poller with no grace period and its own cancellation token.
    pub fn new(
        transport: &'a dyn Transport,
        endpoints: &'a Endpoints,
        policy: PollPolicy,
    ) -> Self {
        Self {
            transport,
            endpoints,
            policy,
            resource_grace: Duration::ZERO,
            cancel: CancellationToken::new(),
        }
    }

    /// Pause this long before returning each finished resource.
    pub fn with_resource_grace(mut self, grace: Duration) -> Self {
        self.resource_grace = grace;
        self
    }

    /// Abort waiting when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    fn timeout(&self, task_id: &TaskId) -> ClientError {
        ClientError::Timeout {
            task_id: task_id.clone(),
            waited: self.policy.max_wait,
        }
    }

    /// Poll until the task is Completed or Failed and return that snapshot.
    pub async fn wait_terminal(&self, task_id: &TaskId) -> Result<TaskSnapshot, ClientError> {
        let started = Instant::now();
        let deadline = started + self.policy.max_wait;
        let mut polls: u32 = 0;

        loop {
            if started.elapsed() > self.policy.max_wait {
                warn!(task_id = %task_id, polls, "Task timed out");
                return Err(self.timeout(task_id));
            }
            if self.cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            // A stalled request is still bound by the deadline and the token.
            let snapshot = tokio::select! {
                biased;
                snapshot = fetch_snapshot(self.transport, self.endpoints, task_id) => snapshot?,
                _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => {
                    warn!(task_id = %task_id, polls, "Task timed out during a status request");
                    return Err(self.timeout(task_id));
                }
            };
            polls += 1;

            match snapshot.state {
                TaskState::Pending => {
                    debug!(
                        task_id = %task_id,
                        raw_status = snapshot.raw_status,
                        polls,
                        "Task pending"
                    );
                    pause(self.policy.interval, &self.cancel).await?;
                }
                TaskState::Completed | TaskState::Failed => {
                    info!(
                        task_id = %task_id,
                        state = ?snapshot.state,
                        raw_status = snapshot.raw_status,
                        works = snapshot.works.len(),
                        elapsed_secs = started.elapsed().as_secs(),
                        "Task finished"
                    );
                    return Ok(snapshot);
                }
            }
        }
    }

    /// Poll until terminal and return the produced resource URLs.
    ///
    /// A Failed task yields an empty list, whatever works it reports.
    pub async fn wait_for_resources(&self, task_id: &TaskId) -> Result<Vec<String>, ClientError> {
        let snapshot = self.wait_terminal(task_id).await?;

        if snapshot.state == TaskState::Failed {
            warn!(
                task_id = %task_id,
                raw_status = snapshot.raw_status,
                "Task failed on the service"
            );
            return Ok(Vec::new());
        }

        let resources = snapshot.resources();
        if resources.is_empty() {
            warn!(task_id = %task_id, "Task completed without resources");
        }
        for resource in &resources {
            if !self.resource_grace.is_zero() {
                pause(self.resource_grace, &self.cancel).await?;
            }
            debug!(task_id = %task_id, resource = %resource, "Resource ready");
        }
        Ok(resources)
    }
}
