//! Job Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A job error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for job operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The job could not be handed to a site's queue.
    #[display("failed to queue job for site: {_0}")]
    Queue(#[error(not(source))] String),
    /// A job payload could not be encoded or decoded.
    #[display("invalid job payload")]
    Payload,
    /// The local page cache refused the purge.
    #[display("cache purge failed")]
    Purge,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Queue(_) | Self::Purge)
    }
}
