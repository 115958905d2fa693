//! Page traffic against the index, with cache invalidation on every change.

use crate::error::{ErrorKind, Result};
use crosswiki_jobs::CacheInvalidator;
use crosswiki_store::{IndexStore, Insert, LinkDetails};
use crosswiki_title::LinkTarget;
use exn::ResultExt;
use std::time::Instant;
use tracing::instrument;

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Format a cross-site link: `de:Berlin`, or `de:Talk:Berlin` outside the
/// main namespace.
pub fn format_link(details: &LinkDetails) -> String {
    format!("{}:{}", details.interwiki, details.target().prefixed())
}

/// Entry point for a site's page traffic.
///
/// Every successful mutation schedules a cache purge on each site holding an
/// equivalent page, plus the acting site itself, so that rendered link lists
/// everywhere pick up the change.
#[derive(Clone)]
pub struct Repository {
    store: IndexStore,
    invalidator: CacheInvalidator,
}

impl Repository {
    pub fn new(store: IndexStore, invalidator: CacheInvalidator) -> Self {
        Self { store, invalidator }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn is_read_only(&self) -> bool {
        self.store.is_read_only()
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.store.is_read_only() {
            exn::bail!(ErrorKind::ReadOnly);
        }
        Ok(())
    }

    /// Record that `site` has a page at `target`.
    ///
    /// Returns `false` without invalidating anything when the title's hash is
    /// already taken by a different title.
    #[instrument(skip(self, target), fields(namespace = target.namespace, title = %target.db_key))]
    pub async fn save_page(&self, site: &str, target: &LinkTarget) -> Result<bool> {
        metrics::counter!("crosswiki.repo.save_page").increment(1);
        self.ensure_writable()?;
        let start = Instant::now();
        let insert = self.store.insert_page(site, target).await.or_raise(|| ErrorKind::Store)?;
        metrics::histogram!("crosswiki.repo.save_page.time").record(elapsed_ms(start));
        metrics::gauge!("crosswiki.repo.save_page.inserts").set(insert.writes() as f64);
        match insert {
            Insert::Written(_) => {
                self.invalidate(site, target).await?;
                Ok(true)
            },
            Insert::Collision => {
                tracing::error!(
                    site,
                    namespace = target.namespace,
                    db_key = %target.db_key,
                    "Probable duplicate hash for title, refusing to index it",
                );
                Ok(false)
            },
        }
    }

    /// Record that `site` no longer has a page at `target`.
    ///
    /// Returns `false` (and invalidates nothing) if the page wasn't recorded.
    #[instrument(skip(self, target), fields(namespace = target.namespace, title = %target.db_key))]
    pub async fn delete_page(&self, site: &str, target: &LinkTarget) -> Result<bool> {
        metrics::counter!("crosswiki.repo.delete_page").increment(1);
        self.ensure_writable()?;
        let start = Instant::now();
        let deleted = self.store.delete_page(site, target).await.or_raise(|| ErrorKind::Store)?;
        metrics::histogram!("crosswiki.repo.delete_page.time").record(elapsed_ms(start));
        if deleted {
            self.invalidate(site, target).await?;
        }
        Ok(deleted)
    }

    /// Links to the pages on other sites equivalent to `target` on `site`,
    /// ordered by interwiki prefix.
    pub async fn get_links_for_page(&self, site: &str, target: &LinkTarget) -> Result<Vec<String>> {
        metrics::counter!("crosswiki.repo.get_links_for_page").increment(1);
        let start = Instant::now();
        let details = self.store.select_link_details_for_page(site, target).await.or_raise(|| ErrorKind::Store)?;
        metrics::histogram!("crosswiki.repo.get_links_for_page.time").record(elapsed_ms(start));
        Ok(details.iter().map(format_link).collect())
    }

    /// Database names of every site holding a page equivalent to `target`.
    pub async fn select_sites_for_page(&self, target: &LinkTarget) -> Result<Vec<String>> {
        metrics::counter!("crosswiki.repo.select_sites_for_page").increment(1);
        let start = Instant::now();
        let sites = self.store.select_sites_for_page(target).await.or_raise(|| ErrorKind::Store)?;
        metrics::histogram!("crosswiki.repo.select_sites_for_page.time").record(elapsed_ms(start));
        Ok(sites)
    }

    async fn invalidate(&self, site: &str, target: &LinkTarget) -> Result<()> {
        let mut sites = self.store.select_sites_for_page(target).await.or_raise(|| ErrorKind::Store)?;
        sites.push(site.to_string());
        self.invalidator.invalidate(sites, target).await.or_raise(|| ErrorKind::Invalidation)?;
        Ok(())
    }
}
