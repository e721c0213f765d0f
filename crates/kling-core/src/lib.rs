//! Kling Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - HTTP or any transport
//! - Runtime specifics
//!
//! It models the task lifecycle of the generation service: cookie and region
//! resolution, job payloads, task handles, and the status classification rule.

pub mod error;
pub mod ids;
pub mod job;
pub mod region;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::{TaskId, WorkId};
pub use job::{Argument, JobInput, JobKind, JobPayload, Quality};
pub use region::{CookieJar, Region};
pub use status::TaskState;
pub use task::{TaskHandle, TaskSnapshot, Work};
