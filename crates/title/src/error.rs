//! Title Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A title error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for title operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input handed to the hasher was not a valid string. This is a bug in
    /// the caller, not a data condition.
    #[display("invalid hash input: {_0}")]
    InvalidInput(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
