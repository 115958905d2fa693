//! Bulk backfill and repair of the index.
//!
//! These run outside normal page traffic: they write straight to the
//! [`IndexStore`] and schedule no cache purges. Each walks its input in
//! batches and logs progress as it goes.

mod dump;

pub use self::dump::{DumpSource, SiteRecord, read_sites};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use crosswiki_store::{IndexStore, PageEntry};
use crosswiki_title::{LinkTarget, Namespace, namespace};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A page as the host wiki stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePage {
    pub id: u64,
    pub namespace: Namespace,
    pub title: String,
    #[serde(default)]
    pub redirect: bool,
}

impl SourcePage {
    pub fn target(&self) -> LinkTarget {
        LinkTarget::new(self.namespace, self.title.clone())
    }
}

/// The host wiki's page table, as seen by the maintenance operations.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Up to `limit` pages with an ID of at least `from`, in ascending ID order.
    async fn batch(&self, from: u64, limit: usize) -> Result<Vec<SourcePage>>;

    /// Whether the site currently has a page at `target`.
    async fn exists(&self, target: &LinkTarget) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateSummary {
    pub batches: u64,
    /// Pages read from the source, including skipped ones.
    pub pages_read: u64,
    pub titles_inserted: u64,
    pub pages_inserted: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub processed: u64,
    /// Rows deleted, or that would have been in a dry run.
    pub deleted: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecalculateSummary {
    pub processed: u64,
    /// Titles whose normalized key changed, updated unless in a dry run.
    pub updated: u64,
}

fn ensure_writable(store: &IndexStore) -> Result<()> {
    if store.is_read_only() {
        exn::bail!(ErrorKind::ReadOnly);
    }
    Ok(())
}

/// Register sites as `(dbname, interwiki prefix)` pairs. Returns how many
/// were new.
#[instrument(skip_all)]
pub async fn populate_sites<D, I>(store: &IndexStore, sites: impl IntoIterator<Item = (D, I)>) -> Result<u64>
where
    D: AsRef<str>,
    I: AsRef<str>,
{
    ensure_writable(store)?;
    let inserted = store.insert_sites(sites).await.or_raise(|| ErrorKind::Store)?;
    tracing::info!(inserted, "Inserted sites");
    Ok(inserted)
}

/// Record every existing page of `site` in the index.
///
/// Pages are read from `source` in ID order starting at `start` (or the
/// beginning). Redirects and pages outside `namespaces` are skipped, as are
/// namespaces not shared by every site. Safe to re-run: pages already in the
/// index are left alone.
#[instrument(skip(store, source, namespaces))]
pub async fn populate_pages(
    store: &IndexStore,
    source: &dyn PageSource,
    site: &str,
    namespaces: &[Namespace],
    start: Option<u64>,
    batch_size: usize,
) -> Result<PopulateSummary> {
    ensure_writable(store)?;
    if batch_size == 0 {
        exn::bail!(ErrorKind::InvalidArgument("batch size must be at least 1"));
    }
    let namespaces: Vec<Namespace> =
        namespaces.iter().copied().filter(|ns| namespace::is_core_namespace(*ns)).collect();
    let mut summary = PopulateSummary::default();
    let mut from = start.unwrap_or(0);
    loop {
        let pages = source.batch(from, batch_size).await?;
        let Some(last) = pages.last() else {
            break;
        };
        from = last.id + 1;
        summary.batches += 1;
        summary.pages_read += pages.len() as u64;
        let entries: Vec<PageEntry> = pages
            .into_iter()
            .filter(|page| !page.redirect && namespaces.contains(&page.namespace))
            .map(|page| PageEntry::new(site, page.target()))
            .collect();
        let inserted = store.insert_pages(&entries).await.or_raise(|| ErrorKind::Store)?;
        summary.titles_inserted += inserted.titles;
        summary.pages_inserted += inserted.pages;
        tracing::info!(next = from, rows = entries.len(), pages = inserted.pages, "Inserted batch");
    }
    tracing::info!(?summary, "Finished populating pages");
    Ok(summary)
}

/// Remove index rows for pages `site` no longer has.
///
/// Deletions can be missed, for example while the index was read-only. Each
/// page recorded for `site` is checked against `source`, and the missing ones
/// are deleted. In a dry run nothing is deleted but the summary still counts
/// them.
#[instrument(skip(store, source))]
pub async fn purge_deleted_pages(
    store: &IndexStore,
    source: &dyn PageSource,
    site: &str,
    batch_size: usize,
    dry_run: bool,
) -> Result<PurgeSummary> {
    if batch_size < 2 {
        exn::bail!(ErrorKind::InvalidArgument("batch size must be 2 or more"));
    }
    if !dry_run {
        ensure_writable(store)?;
    }
    let mut summary = PurgeSummary::default();
    let mut cursor = None;
    loop {
        let pages = store.select_pages_for_site(site, cursor, batch_size).await.or_raise(|| ErrorKind::Store)?;
        let Some(last) = pages.last() else {
            break;
        };
        cursor = Some(last.cursor());
        let mut missing = Vec::new();
        for page in &pages {
            if !source.exists(&page.target()).await? {
                missing.push((page.namespace, page.title_key));
            }
        }
        if !dry_run && !missing.is_empty() {
            store.delete_pages(site, &missing).await.or_raise(|| ErrorKind::Store)?;
        }
        summary.processed += pages.len() as u64;
        summary.deleted += missing.len() as u64;
        tracing::info!(processed = pages.len(), deleted = missing.len(), dry_run, "Processed batch");
    }
    tracing::info!(?summary, dry_run, "Finished purging deleted pages");
    Ok(summary)
}

/// Recompute the normalized key of every title.
///
/// Needed after the normalization table changes, since stored keys were
/// computed with the old table.
#[instrument(skip(store))]
pub async fn recalculate_normalized_hashes(
    store: &IndexStore,
    batch_size: usize,
    dry_run: bool,
) -> Result<RecalculateSummary> {
    if batch_size == 0 {
        exn::bail!(ErrorKind::InvalidArgument("batch size must be at least 1"));
    }
    if !dry_run {
        ensure_writable(store)?;
    }
    let mut summary = RecalculateSummary::default();
    let mut after = None;
    loop {
        let titles = store.select_titles(after, batch_size).await.or_raise(|| ErrorKind::Store)?;
        let Some(last) = titles.last() else {
            break;
        };
        after = Some(last.raw_key);
        let updates: Vec<(i64, i64)> = titles
            .iter()
            .map(|title| (title.raw_key, title.normalized_key, store.normalized_key(&title.raw)))
            .filter(|(_, old, new)| old != new)
            .map(|(raw_key, _, new)| (raw_key, new))
            .collect();
        if !dry_run && !updates.is_empty() {
            store.update_normalized_keys(&updates).await.or_raise(|| ErrorKind::Store)?;
        }
        summary.processed += titles.len() as u64;
        summary.updated += updates.len() as u64;
        tracing::info!(after = last.raw_key, updates = updates.len(), dry_run, "Processed batch");
    }
    tracing::info!(?summary, dry_run, "Finished recalculating normalized hashes");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosswiki_store::Database;
    use rstest::rstest;

    const SITE: &str = "enwiktionary";

    async fn store() -> (IndexStore, Database) {
        let db = Database::connect_in_memory().await.unwrap();
        let store = IndexStore::from(&db);
        store.insert_sites([(SITE, "en"), ("dewiktionary", "de")]).await.unwrap();
        (store, db)
    }

    fn page(id: u64, namespace: Namespace, title: &str) -> SourcePage {
        SourcePage { id, namespace, title: title.to_string(), redirect: false }
    }

    fn source(pages: impl IntoIterator<Item = SourcePage>) -> DumpSource {
        DumpSource::new(pages)
    }

    async fn indexed(store: &IndexStore, namespace: Namespace, title: &str) -> bool {
        store.select_sites_for_page(&LinkTarget::new(namespace, title)).await.unwrap().contains(&SITE.to_string())
    }

    #[tokio::test]
    async fn test_populate_sites() {
        let (store, _db) = store().await;
        let inserted = populate_sites(&store, [(SITE, "en"), ("frwiktionary", "fr")]).await.unwrap();
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn test_populate_pages_filters_and_batches() {
        let (store, _db) = store().await;
        let mut redirect = page(3, 0, "Redirected");
        redirect.redirect = true;
        let source = source([
            page(1, 0, "Berlin"),
            page(2, 1, "Berlin"),
            redirect,
            page(4, 14, "Nouns"),
            page(5, 100, "Custom"),
            page(6, 0, "Paris"),
        ]);
        let summary = populate_pages(&store, &source, SITE, &[0, 14, 100], None, 2).await.unwrap();
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.pages_read, 6);
        assert_eq!(summary.pages_inserted, 3);
        assert_eq!(summary.titles_inserted, 3);
        assert!(indexed(&store, 0, "Berlin").await);
        assert!(indexed(&store, 14, "Nouns").await);
        assert!(indexed(&store, 0, "Paris").await);
        assert!(!indexed(&store, 1, "Berlin").await);
        assert!(!indexed(&store, 0, "Redirected").await);
        assert!(!indexed(&store, 100, "Custom").await);

        // Re-running changes nothing.
        let again = populate_pages(&store, &source, SITE, &[0, 14], None, 2).await.unwrap();
        assert_eq!(again.pages_inserted, 0);
        assert_eq!(again.titles_inserted, 0);
    }

    #[tokio::test]
    async fn test_populate_pages_from_start() {
        let (store, _db) = store().await;
        let source = source([page(1, 0, "Berlin"), page(7, 0, "Paris")]);
        let summary = populate_pages(&store, &source, SITE, &[0], Some(2), 10).await.unwrap();
        assert_eq!(summary.pages_inserted, 1);
        assert!(!indexed(&store, 0, "Berlin").await);
        assert!(indexed(&store, 0, "Paris").await);
    }

    #[tokio::test]
    async fn test_populate_pages_empty_source() {
        let (store, _db) = store().await;
        let summary = populate_pages(&store, &source([]), SITE, &[0], None, 10).await.unwrap();
        assert_eq!(summary, PopulateSummary::default());
    }

    #[rstest]
    #[case(false, false)]
    #[case(true, true)]
    #[tokio::test]
    async fn test_purge_deleted_pages(#[case] dry_run: bool, #[case] still_indexed: bool) {
        let (store, _db) = store().await;
        let pages = [page(1, 0, "Alpha"), page(2, 0, "Beta"), page(3, 0, "Gamma"), page(4, 1, "Delta")];
        populate_pages(&store, &source(pages.clone()), SITE, &[0, 1], None, 10).await.unwrap();
        store.insert_page("dewiktionary", &LinkTarget::new(0, "Beta")).await.unwrap();

        // Beta and Delta have since been deleted from the site.
        let remaining = source([pages[0].clone(), pages[2].clone()]);
        let summary = purge_deleted_pages(&store, &remaining, SITE, 2, dry_run).await.unwrap();
        assert_eq!(summary, PurgeSummary { processed: 4, deleted: 2 });
        assert_eq!(indexed(&store, 0, "Beta").await, still_indexed);
        assert_eq!(indexed(&store, 1, "Delta").await, still_indexed);
        assert!(indexed(&store, 0, "Alpha").await);
        assert!(indexed(&store, 0, "Gamma").await);
        // Other sites are untouched.
        let sites = store.select_sites_for_page(&LinkTarget::new(0, "Beta")).await.unwrap();
        assert!(sites.contains(&"dewiktionary".to_string()));
    }

    #[tokio::test]
    async fn test_purge_rejects_small_batches() {
        let (store, _db) = store().await;
        let err = purge_deleted_pages(&store, &source([]), SITE, 1, false).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_recalculate_normalized_hashes() {
        let (store, db) = store().await;
        let source = source([page(1, 0, "Foo_bar"), page(2, 0, "Apostrophe’"), page(3, 0, "Plain")]);
        populate_pages(&store, &source, SITE, &[0], None, 10).await.unwrap();
        sqlx::query("UPDATE titles SET normalized_key = 0 WHERE raw = ?1 OR raw = ?2")
            .bind("Apostrophe’")
            .bind("Foo_bar")
            .execute(db.pool())
            .await
            .unwrap();
        assert!(!indexed(&store, 0, "Apostrophe'").await);

        let dry = recalculate_normalized_hashes(&store, 2, true).await.unwrap();
        assert_eq!(dry, RecalculateSummary { processed: 3, updated: 2 });
        assert!(!indexed(&store, 0, "Apostrophe'").await);

        let summary = recalculate_normalized_hashes(&store, 2, false).await.unwrap();
        assert_eq!(summary, RecalculateSummary { processed: 3, updated: 2 });
        assert!(indexed(&store, 0, "Apostrophe'").await);
        let titles = store.select_titles(None, 10).await.unwrap();
        assert!(titles.iter().all(|title| title.normalized_key == store.normalized_key(&title.raw)));

        let again = recalculate_normalized_hashes(&store, 2, false).await.unwrap();
        assert_eq!(again.updated, 0);
    }

    #[tokio::test]
    async fn test_read_only_store_refuses_writes_but_allows_dry_runs() {
        let (store, _db) = store().await;
        let store = store.with_read_only(true);
        let err = populate_pages(&store, &source([page(1, 0, "Foo")]), SITE, &[0], None, 10).await.unwrap_err();
        assert_eq!(*err, ErrorKind::ReadOnly);
        let err = populate_sites(&store, [("frwiktionary", "fr")]).await.unwrap_err();
        assert_eq!(*err, ErrorKind::ReadOnly);
        let err = recalculate_normalized_hashes(&store, 10, false).await.unwrap_err();
        assert_eq!(*err, ErrorKind::ReadOnly);
        assert_eq!(recalculate_normalized_hashes(&store, 10, true).await.unwrap(), RecalculateSummary::default());
        assert_eq!(purge_deleted_pages(&store, &source([]), SITE, 2, true).await.unwrap(), PurgeSummary::default());
    }
}
