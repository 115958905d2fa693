use crate::QueueHandle;
use crate::error::{ErrorKind, Result};
use crate::job::CacheUpdateJob;
use crosswiki_title::LinkTarget;
use std::collections::BTreeSet;
use tracing::instrument;

/// Fans a page change out to every affected site's queue.
#[derive(Clone)]
pub struct CacheInvalidator {
    queue: QueueHandle,
}

impl CacheInvalidator {
    pub fn new(queue: QueueHandle) -> Self {
        Self { queue }
    }

    /// Schedule exactly one [`CacheUpdateJob`] for `target` on each distinct
    /// site in `sites`, returning how many were scheduled.
    ///
    /// A failed push does not stop the remaining sites from being scheduled;
    /// the first failure is returned once every site has been attempted.
    #[instrument(skip_all, fields(namespace = target.namespace, title = %target.db_key))]
    pub async fn invalidate<S: AsRef<str>>(&self, sites: impl IntoIterator<Item = S>, target: &LinkTarget) -> Result<usize> {
        let sites: BTreeSet<String> = sites.into_iter().map(|site| site.as_ref().to_string()).collect();
        let mut failure = None;
        for site in &sites {
            if let Err(err) = self.queue.push(site, CacheUpdateJob::new(target.clone())).await {
                let kind: &ErrorKind = &err;
                tracing::warn!(site = %site, job = CacheUpdateJob::TYPE, error = %kind, "Failed to schedule cache purge");
                failure.get_or_insert(err);
            }
        }
        match failure {
            Some(err) => Err(err),
            None => {
                tracing::debug!(job = CacheUpdateJob::TYPE, sites = sites.len(), "Scheduled cache purges");
                Ok(sites.len())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::JobQueue;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingQueue {
        pushed: Mutex<Vec<(String, CacheUpdateJob)>>,
        failing: Option<&'static str>,
    }

    #[async_trait]
    impl JobQueue for RecordingQueue {
        async fn push(&self, site: &str, job: CacheUpdateJob) -> Result<()> {
            if self.failing == Some(site) {
                exn::bail!(ErrorKind::Queue(site.to_string()));
            }
            self.pushed.lock().unwrap().push((site.to_string(), job));
            Ok(())
        }
    }

    #[rstest]
    #[case::distinct(&["A", "B", "C"], &["A", "B", "C"])]
    #[case::repeated(&["B", "A", "C", "A"], &["A", "B", "C"])]
    #[case::single(&["A", "A"], &["A"])]
    #[case::none(&[], &[])]
    #[tokio::test]
    async fn test_one_job_per_distinct_site(#[case] sites: &[&str], #[case] expected: &[&str]) {
        let queue = Arc::new(RecordingQueue::default());
        let invalidator = CacheInvalidator::new(queue.clone());
        let target = LinkTarget::new(0, "Foo");
        let scheduled = invalidator.invalidate(sites, &target).await.unwrap();
        assert_eq!(scheduled, expected.len());
        let pushed = queue.pushed.lock().unwrap().clone();
        let pushed_sites: Vec<&str> = pushed.iter().map(|(site, _)| site.as_str()).collect();
        assert_eq!(pushed_sites, expected);
        assert!(pushed.iter().all(|(_, job)| job.target == target));
    }

    #[tokio::test]
    async fn test_failed_push_still_schedules_other_sites() {
        let queue = Arc::new(RecordingQueue { failing: Some("B"), ..Default::default() });
        let invalidator = CacheInvalidator::new(queue.clone());
        let err = invalidator.invalidate(["A", "B", "C"], &LinkTarget::new(0, "Foo")).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Queue("B".to_string()));
        let sites: Vec<String> = queue.pushed.lock().unwrap().iter().map(|(site, _)| site.clone()).collect();
        assert_eq!(sites, ["A", "C"]);
    }
}
