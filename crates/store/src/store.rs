//! Index Store: the three relations and the algorithms over them.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{LinkDetails, PageEntry, SitePage, TitleEntry};
use crosswiki_title::{LinkTarget, Namespace, StringHasher, StringNormalizer};
use exn::ResultExt;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

// Three bound parameters per row keeps every chunk far below SQLite's limit
// on bound variables per statement.
const ROWS_PER_STATEMENT: usize = 500;

/// Outcome of [`IndexStore::insert_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    /// The page tuple is recorded. Holds how many of the two writes were
    /// executed: `2` when the title was new to the index, `1` when the title
    /// was already known (the page tuple may or may not have been present).
    Written(u64),
    /// The title's raw key already belongs to a *different* raw title. Nothing
    /// was written and the existing title is left untouched.
    Collision,
}

impl Insert {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Written(_))
    }

    pub fn writes(&self) -> u64 {
        match self {
            Self::Written(writes) => *writes,
            Self::Collision => 0,
        }
    }
}

/// Row counts from [`IndexStore::insert_pages`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkInsert {
    pub titles: u64,
    pub pages: u64,
}

/// The shared index of sites, titles and pages.
///
/// # Write ordering
///
/// [`insert_page`](Self::insert_page) performs up to two writes (title, then
/// page) and does **not** wrap them in a transaction. Do not "fix" this: the
/// index can live in a separate database from the page edit that triggers
/// it, so no transaction spans the whole write path anyway. The page tuple is
/// only written once its title row is confirmed to exist, so a failure in
/// between leaves at most an unreferenced title row (harmless) and never a
/// page pointing at a missing title.
///
/// # Concurrency
///
/// Concurrent first inserts of the same raw title race harmlessly, because
/// the title insert ignores key conflicts. Two *different* titles with the
/// same raw key can both pass the read check; the primary key on `raw_key`
/// decides the winner and the loser is reported as a collision.
#[derive(Debug, Clone)]
pub struct IndexStore {
    pool: SqlitePool,
    hasher: StringHasher,
    normalizer: StringNormalizer,
    read_only: bool,
}

impl From<&Database> for IndexStore {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone(), StringHasher::new(), StringNormalizer::new(), false)
    }
}

impl IndexStore {
    pub fn new(pool: SqlitePool, hasher: StringHasher, normalizer: StringNormalizer, read_only: bool) -> Self {
        Self { pool, hasher, normalizer, read_only }
    }

    /// Return a copy of this store with the read-only flag set.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn hasher(&self) -> &StringHasher {
        &self.hasher
    }

    /// Hash of the normalized form of a raw title.
    pub fn normalized_key(&self, raw: &str) -> i64 {
        self.hasher.hash(self.normalizer.normalize(raw))
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            exn::bail!(ErrorKind::ReadOnly);
        }
        Ok(())
    }

    async fn select_title_raw(&self, raw_key: i64) -> Result<Option<String>> {
        sqlx::query_scalar(include_str!("../queries/select_title_raw.sql"))
            .bind(raw_key)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Page traffic
    // =========================================================================

    /// Record that `site` has a page at `target`.
    ///
    /// Refuses with [`Insert::Collision`] when the title's raw key is already
    /// taken by a different raw title, so two different titles are never
    /// silently merged.
    #[instrument(level = "debug", skip(self, target), fields(namespace = target.namespace, title = %target.db_key))]
    pub async fn insert_page(&self, site: &str, target: &LinkTarget) -> Result<Insert> {
        self.ensure_writable()?;
        let site_key = self.hasher.hash(site);
        let raw_key = self.hasher.hash(&target.db_key);
        let mut writes = 0;
        match self.select_title_raw(raw_key).await? {
            Some(existing) if existing != target.db_key => return Ok(Insert::Collision),
            Some(_) => {},
            None => {
                let inserted = sqlx::query(include_str!("../queries/insert_title.sql"))
                    .bind(raw_key)
                    .bind(&target.db_key)
                    .bind(self.normalized_key(&target.db_key))
                    .execute(&self.pool)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
                if inserted.rows_affected() > 0 {
                    writes += 1;
                } else if self.select_title_raw(raw_key).await?.as_deref() != Some(target.db_key.as_str()) {
                    // Another writer got there between our read and our write
                    // with a different title.
                    return Ok(Insert::Collision);
                }
            },
        }
        sqlx::query(include_str!("../queries/insert_page.sql"))
            .bind(site_key)
            .bind(target.namespace)
            .bind(raw_key)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        writes += 1;
        Ok(Insert::Written(writes))
    }

    /// Remove the page tuple for `site` at `target`.
    ///
    /// The title row is kept: other sites (or a concurrent insert on this
    /// one) may still reference it. Returns `true` if a row was removed.
    #[instrument(level = "debug", skip(self, target), fields(namespace = target.namespace, title = %target.db_key))]
    pub async fn delete_page(&self, site: &str, target: &LinkTarget) -> Result<bool> {
        self.ensure_writable()?;
        let result = sqlx::query(include_str!("../queries/delete_page.sql"))
            .bind(self.hasher.hash(site))
            .bind(target.namespace)
            .bind(self.hasher.hash(&target.db_key))
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Pages on *other* registered sites with a title equivalent to `target`.
    ///
    /// Equivalence is by normalized key, so `Foo_bar` on one site matches
    /// `Foo bar` on another. Each result carries the other site's raw title.
    pub async fn select_link_details_for_page(&self, site: &str, target: &LinkTarget) -> Result<Vec<LinkDetails>> {
        sqlx::query_as(include_str!("../queries/select_link_details_for_page.sql"))
            .bind(self.normalized_key(&target.db_key))
            .bind(target.namespace)
            .bind(site)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Database names of every registered site with a page equivalent to
    /// `target`, including the caller's own site.
    pub async fn select_sites_for_page(&self, target: &LinkTarget) -> Result<Vec<String>> {
        sqlx::query_scalar(include_str!("../queries/select_sites_for_page.sql"))
            .bind(self.normalized_key(&target.db_key))
            .bind(target.namespace)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Bulk / administrative
    // =========================================================================

    /// Record many pages at once.
    ///
    /// Unlike [`insert_page`](Self::insert_page) there is no collision check:
    /// conflicting rows are ignored so one bad row can't fail a backfill.
    /// All titles are written before any page.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub async fn insert_pages(&self, pages: &[PageEntry]) -> Result<BulkInsert> {
        self.ensure_writable()?;
        let mut counts = BulkInsert::default();
        if pages.is_empty() {
            return Ok(counts);
        }
        let titles: Vec<TitleEntry> = pages
            .iter()
            .map(|page| TitleEntry {
                raw_key: self.hasher.hash(&page.title),
                raw: page.title.clone(),
                normalized_key: self.normalized_key(&page.title),
            })
            .collect();
        for chunk in titles.chunks(ROWS_PER_STATEMENT) {
            let mut builder: QueryBuilder<'_, Sqlite> =
                QueryBuilder::new("INSERT INTO titles (raw_key, raw, normalized_key) ");
            builder.push_values(chunk, |mut row, title| {
                row.push_bind(title.raw_key).push_bind(title.raw.clone()).push_bind(title.normalized_key);
            });
            builder.push(" ON CONFLICT (raw_key) DO NOTHING");
            let result = builder.build().execute(&self.pool).await.or_raise(|| ErrorKind::Database)?;
            counts.titles += result.rows_affected();
        }
        for chunk in pages.chunks(ROWS_PER_STATEMENT) {
            let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new("INSERT INTO pages (site, namespace, title) ");
            builder.push_values(chunk, |mut row, page| {
                row.push_bind(self.hasher.hash(&page.site))
                    .push_bind(page.namespace)
                    .push_bind(self.hasher.hash(&page.title));
            });
            builder.push(" ON CONFLICT (site, namespace, title) DO NOTHING");
            let result = builder.build().execute(&self.pool).await.or_raise(|| ErrorKind::Database)?;
            counts.pages += result.rows_affected();
        }
        tracing::debug!(titles = counts.titles, pages = counts.pages, "Bulk insert finished");
        Ok(counts)
    }

    /// Register sites as `(dbname, interwiki prefix)` pairs. Already
    /// registered sites are left unchanged. Returns the number of new sites.
    #[instrument(skip_all)]
    pub async fn insert_sites<D, I>(&self, sites: impl IntoIterator<Item = (D, I)>) -> Result<u64>
    where
        D: AsRef<str>,
        I: AsRef<str>,
    {
        self.ensure_writable()?;
        let sites: Vec<(i64, String, String)> = sites
            .into_iter()
            .map(|(dbname, interwiki)| {
                let dbname = dbname.as_ref();
                (self.hasher.hash(dbname), dbname.to_string(), interwiki.as_ref().to_string())
            })
            .collect();
        let mut inserted = 0;
        for chunk in sites.chunks(ROWS_PER_STATEMENT) {
            let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new("INSERT INTO sites (key, dbname, interwiki) ");
            builder.push_values(chunk, |mut row, (key, dbname, interwiki)| {
                row.push_bind(*key).push_bind(dbname.clone()).push_bind(interwiki.clone());
            });
            builder.push(" ON CONFLICT DO NOTHING");
            let result = builder.build().execute(&self.pool).await.or_raise(|| ErrorKind::Database)?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    /// Remove every page tuple recorded for `site`. Returns the number removed.
    #[instrument(skip(self))]
    pub async fn delete_pages_for_site(&self, site: &str) -> Result<u64> {
        self.ensure_writable()?;
        let result = sqlx::query(include_str!("../queries/delete_pages_for_site.sql"))
            .bind(self.hasher.hash(site))
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Walk the pages recorded for `site`, ordered by `(title key, namespace)`.
    ///
    /// Pass the [`cursor`](SitePage::cursor) of the last row of a batch as
    /// `after` to fetch the next batch.
    pub async fn select_pages_for_site(
        &self,
        site: &str,
        after: Option<(i64, Namespace)>,
        limit: usize,
    ) -> Result<Vec<SitePage>> {
        let limit = i64::try_from(limit).or_raise(|| ErrorKind::InvalidData("limit"))?;
        let (title_key, namespace) = match after {
            Some((title_key, namespace)) => (Some(title_key), namespace),
            None => (None, 0),
        };
        sqlx::query_as(include_str!("../queries/select_pages_for_site.sql"))
            .bind(self.hasher.hash(site))
            .bind(title_key)
            .bind(namespace)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Remove specific `(namespace, title key)` page tuples for `site`.
    pub async fn delete_pages(&self, site: &str, pages: &[(Namespace, i64)]) -> Result<u64> {
        self.ensure_writable()?;
        let site_key = self.hasher.hash(site);
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let mut deleted = 0;
        for (namespace, title_key) in pages {
            let result = sqlx::query(include_str!("../queries/delete_page.sql"))
                .bind(site_key)
                .bind(namespace)
                .bind(title_key)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            deleted += result.rows_affected();
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(deleted)
    }

    /// Walk the title table in `raw_key` order, starting after `after`.
    pub async fn select_titles(&self, after: Option<i64>, limit: usize) -> Result<Vec<TitleEntry>> {
        let limit = i64::try_from(limit).or_raise(|| ErrorKind::InvalidData("limit"))?;
        sqlx::query_as(include_str!("../queries/select_titles.sql"))
            .bind(after)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Overwrite the normalized key of titles, given `(raw_key, normalized_key)` pairs.
    pub async fn update_normalized_keys(&self, updates: &[(i64, i64)]) -> Result<u64> {
        self.ensure_writable()?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let mut updated = 0;
        for (raw_key, normalized_key) in updates {
            let result = sqlx::query(include_str!("../queries/update_normalized_key.sql"))
                .bind(raw_key)
                .bind(normalized_key)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            updated += result.rows_affected();
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(updated)
    }
}
