//! Cross-site title index.
//!
//! Many independently operated wikis share one index recording which of them
//! holds a page under which title. Each site asks the index "who else has an
//! equivalent page?" to render cross-site links, and tells the index when its
//! own pages are created, moved or deleted. Every change fans out one cache
//! purge per affected site so their rendered links catch up.
//!
//! - [`Repository`] is the entry point for page traffic.
//! - [`hooks`] turns host wiki page events into repository calls.
//! - [`maintenance`] backfills and repairs the index in bulk.

pub mod error;
pub mod hooks;
pub mod maintenance;
mod repo;

pub use crate::repo::{Repository, format_link};
