//! Core domain errors.

use thiserror::Error;

/// Core domain errors for the Kling client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The cookie string did not yield a single `name=value` pair.
    #[error("Invalid cookie: {0}")]
    InvalidCookie(String),

    /// A job was built from inputs that do not fit its kind.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
