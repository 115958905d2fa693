//! Job queue trait and implementations.

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use self::mock::MockQueue;
use crate::error::Result;
use crate::job::CacheUpdateJob;
use async_trait::async_trait;

/// Transport delivering jobs to each site's own work queue.
///
/// Delivery is assumed to be at-least-once, and no ordering is expected
/// between different sites.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Schedule `job` on the queue of `site` (a site database name).
    ///
    /// Returning `Ok` means the job is durably scheduled, not that it has run.
    async fn push(&self, site: &str, job: CacheUpdateJob) -> Result<()>;
}
