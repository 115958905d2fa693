//! JSON-lines dumps of a site's page table and of the site list.

use super::{PageSource, SourcePage};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use crosswiki_title::LinkTarget;
use exn::ResultExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A line of a site list dump: `{"dbname":"enwiktionary","interwiki":"en"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub dbname: String,
    pub interwiki: String,
}

async fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let contents = tokio::fs::read_to_string(path).await.or_raise(|| ErrorKind::Io)?;
    parse_json_lines(&contents)
}

fn parse_json_lines<T: DeserializeOwned>(contents: &str) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::error!(line = index + 1, error = %err, "Malformed dump line");
                return Err(err).or_raise(|| ErrorKind::Source);
            },
        }
    }
    Ok(records)
}

/// Read a site list dump.
pub async fn read_sites(path: impl AsRef<Path>) -> Result<Vec<SiteRecord>> {
    read_json_lines(path.as_ref()).await
}

/// A site's page table loaded from a JSON-lines dump, one page per line:
/// `{"id":1,"namespace":0,"title":"Berlin","redirect":false}`.
#[derive(Debug, Clone, Default)]
pub struct DumpSource {
    /// Sorted by ID.
    pages: Vec<SourcePage>,
    existing: HashSet<LinkTarget>,
}

impl DumpSource {
    pub fn new(pages: impl IntoIterator<Item = SourcePage>) -> Self {
        let mut pages: Vec<SourcePage> = pages.into_iter().collect();
        pages.sort_by_key(|page| page.id);
        let existing = pages.iter().map(SourcePage::target).collect();
        Self { pages, existing }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let pages: Vec<SourcePage> = read_json_lines(path.as_ref()).await?;
        Ok(Self::new(pages))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[async_trait]
impl PageSource for DumpSource {
    async fn batch(&self, from: u64, limit: usize) -> Result<Vec<SourcePage>> {
        let start = self.pages.partition_point(|page| page.id < from);
        Ok(self.pages[start..].iter().take(limit).cloned().collect())
    }

    async fn exists(&self, target: &LinkTarget) -> Result<bool> {
        Ok(self.existing.contains(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_pages_skips_blank_lines() {
        let pages: Vec<SourcePage> = parse_json_lines(concat!(
            r#"{"id":1,"namespace":0,"title":"Berlin","redirect":false}"#,
            "\n\n",
            r#"{"id":2,"namespace":1,"title":"Berlin"}"#,
            "\n",
        ))
        .unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].target(), LinkTarget::new(1, "Berlin"));
        assert!(!pages[1].redirect);
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let err = parse_json_lines::<SiteRecord>("{\"dbname\":\"enwiktionary\"}\n").unwrap_err();
        assert_eq!(*err, ErrorKind::Source);
    }

    #[tokio::test]
    async fn test_read_sites_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"dbname":"enwiktionary","interwiki":"en"}}"#).unwrap();
        writeln!(file, r#"{{"dbname":"dewiktionary","interwiki":"de"}}"#).unwrap();
        let sites = read_sites(file.path()).await.unwrap();
        assert_eq!(sites[1], SiteRecord { dbname: "dewiktionary".to_string(), interwiki: "de".to_string() });
    }

    #[tokio::test]
    async fn test_load_counts_pages() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id":2,"namespace":0,"title":"Berlin"}}"#).unwrap();
        writeln!(file, r#"{{"id":1,"namespace":0,"title":"Paris"}}"#).unwrap();
        let source = DumpSource::load(file.path()).await.unwrap();
        assert_eq!(source.len(), 2);
        assert!(!source.is_empty());

        let empty = tempfile::NamedTempFile::new().unwrap();
        let source = DumpSource::load(empty.path()).await.unwrap();
        assert_eq!(source.len(), 0);
        assert!(source.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = DumpSource::load("/nonexistent/pages.jsonl").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Io);
    }

    #[tokio::test]
    async fn test_batches_in_id_order() {
        let page = |id, title: &str| SourcePage { id, namespace: 0, title: title.to_string(), redirect: false };
        let source = DumpSource::new([page(5, "E"), page(1, "A"), page(3, "C")]);
        let titles = |pages: Vec<SourcePage>| pages.into_iter().map(|page| page.title).collect::<Vec<_>>();
        assert_eq!(titles(source.batch(0, 2).await.unwrap()), ["A", "C"]);
        assert_eq!(titles(source.batch(4, 2).await.unwrap()), ["E"]);
        assert!(source.batch(6, 2).await.unwrap().is_empty());
        assert!(source.exists(&LinkTarget::new(0, "C")).await.unwrap());
        assert!(!source.exists(&LinkTarget::new(1, "C")).await.unwrap());
    }
}
