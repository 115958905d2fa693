use crate::namespace::{self, Namespace};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A page title within a namespace, as the index sees it.
///
/// `db_key` is the raw title text exactly as the site stores it (typically
/// with underscores instead of spaces). It is never normalized: the raw form
/// is what gets displayed in cross-site links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkTarget {
    pub namespace: Namespace,
    pub db_key: String,
}

impl LinkTarget {
    pub fn new(namespace: Namespace, db_key: impl Into<String>) -> Self {
        Self { namespace, db_key: db_key.into() }
    }

    /// Title prefixed with its canonical namespace name (`Talk:Foo`), or the
    /// bare title in the main namespace and in non-core namespaces.
    pub fn prefixed(&self) -> String {
        match namespace::canonical_name(self.namespace) {
            Some(name) if !name.is_empty() => format!("{name}:{}", self.db_key),
            _ => self.db_key.clone(),
        }
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.db_key)
    }
}
