//! In-memory job queue for testing.

use crate::error::{ErrorKind, Result};
use crate::job::CacheUpdateJob;
use crate::queue::JobQueue;
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// In-memory job queue for testing.
///
/// Records every pushed job alongside the site it was addressed to, in push
/// order. Sites registered with [`with_failing_site`](Self::with_failing_site)
/// reject pushes.
///
/// # Examples
///
/// ```
/// use crosswiki_jobs::queue::{JobQueue, MockQueue};
/// use crosswiki_jobs::CacheUpdateJob;
/// use crosswiki_title::LinkTarget;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let queue = MockQueue::default();
/// queue.push("enwiktionary", CacheUpdateJob::new(LinkTarget::new(0, "Berlin"))).await.unwrap();
/// assert_eq!(queue.sites().await, ["enwiktionary"]);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockQueue {
    pushed: RwLock<Vec<(String, CacheUpdateJob)>>,
    failing: HashSet<String>,
}

impl MockQueue {
    /// Make pushes addressed to `site` fail.
    pub fn with_failing_site(mut self, site: impl Into<String>) -> Self {
        self.failing.insert(site.into());
        self
    }

    /// Every pushed job with its site, in push order.
    pub async fn jobs(&self) -> Vec<(String, CacheUpdateJob)> {
        self.pushed.read().await.clone()
    }

    /// Sites that received a job, in push order (repeated per job).
    pub async fn sites(&self) -> Vec<String> {
        self.pushed.read().await.iter().map(|(site, _)| site.clone()).collect()
    }

    /// Jobs pushed to a single site.
    pub async fn jobs_for(&self, site: &str) -> Vec<CacheUpdateJob> {
        self.pushed.read().await.iter().filter(|(s, _)| s == site).map(|(_, job)| job.clone()).collect()
    }

    /// Forget every recorded job.
    pub async fn clear(&self) {
        self.pushed.write().await.clear();
    }
}

#[async_trait]
impl JobQueue for MockQueue {
    async fn push(&self, site: &str, job: CacheUpdateJob) -> Result<()> {
        if self.failing.contains(site) {
            exn::bail!(ErrorKind::Queue(site.to_string()));
        }
        self.pushed.write().await.push((site.to_string(), job));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosswiki_title::LinkTarget;

    #[tokio::test]
    async fn test_records_jobs_per_site() {
        let queue = MockQueue::default();
        let job = CacheUpdateJob::new(LinkTarget::new(0, "Berlin"));
        queue.push("enwiktionary", job.clone()).await.unwrap();
        queue.push("dewiktionary", job.clone()).await.unwrap();
        assert_eq!(queue.sites().await, ["enwiktionary", "dewiktionary"]);
        assert_eq!(queue.jobs_for("dewiktionary").await, [job]);
        queue.clear().await;
        assert!(queue.jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_site() {
        let queue = MockQueue::default().with_failing_site("frwiktionary");
        let err = queue.push("frwiktionary", CacheUpdateJob::new(LinkTarget::new(0, "Berlin"))).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Queue(site) if site == "frwiktionary"));
        assert!(queue.jobs().await.is_empty());
    }
}
