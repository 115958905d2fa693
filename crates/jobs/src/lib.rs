//! Cache invalidation fan-out.
//!
//! When the index changes, every site that links to (or is) the changed page
//! has stale rendered output. This crate turns "these sites reference this
//! page" into one [`CacheUpdateJob`] per site, pushed onto that site's own
//! [`JobQueue`]. Scheduling is fire-and-forget: the purge itself runs later,
//! on the target site, and never talks to the index.

pub mod error;
mod invalidator;
mod job;
pub mod queue;

pub use crate::invalidator::CacheInvalidator;
pub use crate::job::{CacheUpdateJob, PageCache};
pub use crate::queue::JobQueue;
use std::sync::Arc;

pub type QueueHandle = Arc<dyn JobQueue + Send + Sync>;
