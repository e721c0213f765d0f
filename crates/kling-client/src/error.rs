//! Error types for the Kling client.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use kling_core::{CoreError, Region, TaskId};

/// The step of the chunked upload that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    IssueToken,
    Resume,
    Fragment,
    Complete,
    Verify,
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phrase = match self {
            Self::IssueToken => "token issuance failed",
            Self::Resume => "resume rejected",
            Self::Fragment => "fragment rejected",
            Self::Complete => "completion rejected",
            Self::Verify => "verification failed",
        };
        f.write_str(phrase)
    }
}

/// Errors that can occur when talking to the generation service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The cookie or client configuration is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The daily-bonus gate rejected the cookie.
    #[error("authentication failed for {region} region, the cookie may be invalid there: {body}")]
    Authentication { region: Region, body: String },

    /// A chunked-upload step failed.
    #[error("upload {step}: {detail}")]
    Upload { step: UploadStep, detail: String },

    /// The service refused a job payload.
    #[error("submission failed: {0}")]
    Submission(String),

    /// A task did not reach a terminal state in time.
    #[error("task {task_id} did not finish within {}s", .waited.as_secs())]
    Timeout { task_id: TaskId, waited: Duration },

    /// The task to extend is missing or has no usable video.
    #[error("extension failed: {0}")]
    Extension(String),

    /// The point balance could not be read.
    #[error("account error: {0}")]
    Account(String),

    /// A result could not be downloaded.
    #[error("download failed: {0}")]
    Download(String),

    /// A response did not match the expected schema.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// An endpoint answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCookie(_) => Self::Configuration(err.to_string()),
            CoreError::InvalidInput(_) => Self::Submission(err.to_string()),
        }
    }
}

impl ClientError {
    pub(crate) fn upload(step: UploadStep, detail: impl Into<String>) -> Self {
        Self::Upload {
            step,
            detail: detail.into(),
        }
    }

    /// Returns true if this is the failure of the given upload step.
    pub fn is_upload_step(&self, expected: UploadStep) -> bool {
        matches!(self, Self::Upload { step, .. } if *step == expected)
    }
}
