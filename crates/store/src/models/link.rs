use crosswiki_title::{LinkTarget, Namespace};

/// Another site's page that is equivalent to the page being viewed.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LinkDetails {
    /// Interwiki prefix of the site holding the page.
    pub interwiki: String,
    pub namespace: Namespace,
    /// Raw title as stored by the other site, which may differ cosmetically
    /// from the title that was looked up.
    pub title: String,
}

impl LinkDetails {
    pub fn target(&self) -> LinkTarget {
        LinkTarget::new(self.namespace, self.title.clone())
    }
}
