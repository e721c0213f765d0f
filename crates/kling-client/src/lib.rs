//! Client library for the Kling generation service.
//!
//! Provides an authenticated [`Session`] over HTTP that uploads images,
//! submits generation jobs, polls them to completion, chains video
//! extensions and reads the account balance. The individual steps are
//! exposed as free functions over a [`Transport`] for callers that want to
//! drive the lifecycle themselves.

pub mod account;
pub mod config;
pub mod download;
pub mod error;
pub mod extend;
pub mod poll;
pub mod session;
pub mod submit;
pub mod transport;
pub mod upload;
pub mod wire;

#[cfg(test)]
mod testing;

pub use account::read_points;
pub use config::{ClientConfig, Endpoints, PollPolicy};
pub use download::{download_all, MediaKind};
pub use error::{ClientError, UploadStep};
pub use extend::extension_payload;
pub use poll::{fetch_snapshot, TaskPoller};
pub use session::{Generation, ImageSource, Session};
pub use submit::submit_job;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use upload::upload_image;
