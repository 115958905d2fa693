use crosswiki_title::{LinkTarget, Namespace};

/// A page to record during bulk population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    /// Database name of the site holding the page.
    pub site: String,
    pub namespace: Namespace,
    /// Raw title (DB key).
    pub title: String,
}

impl PageEntry {
    pub fn new(site: impl Into<String>, target: LinkTarget) -> Self {
        Self { site: site.into(), namespace: target.namespace, title: target.db_key }
    }
}

/// A page recorded for one site, as returned when walking that site's rows.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SitePage {
    pub namespace: Namespace,
    pub title_key: i64,
    pub title: String,
}

impl SitePage {
    pub fn target(&self) -> LinkTarget {
        LinkTarget::new(self.namespace, self.title.clone())
    }

    /// Keyset pagination cursor for [`IndexStore::select_pages_for_site`](crate::IndexStore::select_pages_for_site).
    pub fn cursor(&self) -> (i64, Namespace) {
        (self.title_key, self.namespace)
    }
}
