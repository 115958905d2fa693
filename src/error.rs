//! Index Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Errors from the component crates are
//! kept as the source of the kinds below.

use derive_more::{Display, Error};

/// An index error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A mutation was attempted while the index is read-only. Nothing was
    /// written and no cache was invalidated.
    #[display("index is in read-only mode")]
    ReadOnly,
    /// The index store failed. Never retried here.
    #[display("index store error")]
    Store,
    /// The index was updated but purge jobs could not be scheduled for every
    /// affected site.
    #[display("failed to schedule cache invalidation")]
    Invalidation,
    /// The host wiki's page or site data could not be read.
    #[display("failed to read source data")]
    Source,
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] &'static str),
    #[display("configuration error")]
    Config,
    #[display("i/o error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Invalidation | Self::Source | Self::Io)
    }
}
