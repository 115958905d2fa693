use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use crosswiki_title::LinkTarget;
use exn::ResultExt;
use serde::{Deserialize, Serialize};

/// A site's own rendered-page cache.
///
/// Implemented by whatever the executing site uses to cache rendered pages.
#[async_trait]
pub trait PageCache: Send + Sync {
    /// Drop any cached output for `target` on this site.
    async fn purge(&self, target: &LinkTarget) -> Result<()>;
}

/// Unit of work purging one page from one site's cache.
///
/// Jobs are addressed to a single site's queue and carry only the page
/// identity, so the executing site resolves the page against its own data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheUpdateJob {
    pub target: LinkTarget,
}

impl CacheUpdateJob {
    /// Job type name, for queue transports that route by type.
    pub const TYPE: &'static str = "crosswikiCacheUpdate";

    pub fn new(target: LinkTarget) -> Self {
        Self { target }
    }

    /// Encode the job for a queue transport.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).or_raise(|| ErrorKind::Payload)
    }

    /// Decode a job received from a queue transport.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).or_raise(|| ErrorKind::Payload)
    }

    /// Execute the job on the receiving site.
    pub async fn run(&self, cache: &dyn PageCache) -> Result<()> {
        tracing::debug!(namespace = self.target.namespace, title = %self.target.db_key, "Purging cached page");
        cache.purge(&self.target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCache {
        purged: Mutex<Vec<LinkTarget>>,
    }

    #[async_trait]
    impl PageCache for RecordingCache {
        async fn purge(&self, target: &LinkTarget) -> Result<()> {
            self.purged.lock().unwrap().push(target.clone());
            Ok(())
        }
    }

    struct FailingCache;

    #[async_trait]
    impl PageCache for FailingCache {
        async fn purge(&self, _target: &LinkTarget) -> Result<()> {
            exn::bail!(ErrorKind::Purge);
        }
    }

    #[tokio::test]
    async fn test_run_purges_only_the_job_target() {
        let cache = RecordingCache::default();
        let job = CacheUpdateJob::new(LinkTarget::new(0, "Berlin"));
        job.run(&cache).await.unwrap();
        assert_eq!(*cache.purged.lock().unwrap(), [LinkTarget::new(0, "Berlin")]);
    }

    #[tokio::test]
    async fn test_run_surfaces_purge_failure() {
        let job = CacheUpdateJob::new(LinkTarget::new(0, "Berlin"));
        let err = job.run(&FailingCache).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Purge);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_payload_shape() {
        let job = CacheUpdateJob::new(LinkTarget::new(1, "Foo"));
        let payload = job.to_payload().unwrap();
        assert_eq!(payload, br#"{"target":{"namespace":1,"db_key":"Foo"}}"#);
        assert_eq!(CacheUpdateJob::from_payload(&payload).unwrap(), job);
    }

    #[test]
    fn test_invalid_payload() {
        let err = CacheUpdateJob::from_payload(b"{\"target\":").unwrap_err();
        assert_eq!(*err, ErrorKind::Payload);
    }
}
