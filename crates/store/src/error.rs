//! Index Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An index store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for index store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The backing database failed (I/O, connectivity, constraint). Surfaced
    /// as-is, never retried here.
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A mutation was attempted while the index is read-only. Nothing was
    /// written.
    #[display("index is in read-only mode")]
    ReadOnly,
    /// A value could not be converted to or from its stored representation.
    #[display("invalid index data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
