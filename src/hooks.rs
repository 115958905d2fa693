//! Wiring between the host wiki's page events and the index.
//!
//! The host wiki decides *when* a page changed and reports it as a
//! [`PageEvent`]. Handlers are registered explicitly on an
//! [`EventDispatcher`]; [`IndexUpdater`] is the handler that keeps the index
//! in step with one site.

use crate::Repository;
use crate::error::Result;
use async_trait::async_trait;
use crosswiki_title::{LinkTarget, Namespace, namespace};
use std::sync::Arc;

/// Something that happened to a page on the local site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// An edit was saved. A null edit changed nothing.
    Saved { target: LinkTarget, null_edit: bool },
    Deleted(LinkTarget),
    Undeleted(LinkTarget),
    Moved { from: LinkTarget, to: LinkTarget },
}

#[async_trait]
pub trait PageEventHandler: Send + Sync {
    async fn on_saved(&self, target: &LinkTarget, null_edit: bool) -> Result<()>;
    async fn on_deleted(&self, target: &LinkTarget) -> Result<()>;
    async fn on_undeleted(&self, target: &LinkTarget) -> Result<()>;
    async fn on_moved(&self, from: &LinkTarget, to: &LinkTarget) -> Result<()>;
}

pub type HandlerHandle = Arc<dyn PageEventHandler + Send + Sync>;

/// Delivers page events to every registered handler, in registration order.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: Vec<HandlerHandle>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: HandlerHandle) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    /// Hand `event` to every handler.
    ///
    /// A failing handler doesn't stop the others; the first failure is
    /// returned once all of them have run.
    pub async fn dispatch(&self, event: &PageEvent) -> Result<()> {
        let mut failure = None;
        for handler in &self.handlers {
            let result = match event {
                PageEvent::Saved { target, null_edit } => handler.on_saved(target, *null_edit).await,
                PageEvent::Deleted(target) => handler.on_deleted(target).await,
                PageEvent::Undeleted(target) => handler.on_undeleted(target).await,
                PageEvent::Moved { from, to } => handler.on_moved(from, to).await,
            };
            if let Err(err) = result {
                tracing::warn!(?event, error = %*err, "Page event handler failed");
                failure.get_or_insert(err);
            }
        }
        failure.map_or(Ok(()), Err)
    }
}

/// Keeps the index in step with the pages of one site.
///
/// Only pages in the configured namespaces are indexed, and of those only
/// namespaces shared by every site.
#[derive(Clone)]
pub struct IndexUpdater {
    repo: Repository,
    site: String,
    namespaces: Vec<Namespace>,
}

impl IndexUpdater {
    pub fn new(repo: Repository, site: impl Into<String>, namespaces: impl IntoIterator<Item = Namespace>) -> Self {
        Self { repo, site: site.into(), namespaces: namespaces.into_iter().collect() }
    }

    fn is_actionable(&self, target: &LinkTarget) -> bool {
        self.namespaces.contains(&target.namespace) && namespace::is_core_namespace(target.namespace)
    }
}

#[async_trait]
impl PageEventHandler for IndexUpdater {
    async fn on_saved(&self, target: &LinkTarget, null_edit: bool) -> Result<()> {
        if null_edit || !self.is_actionable(target) {
            return Ok(());
        }
        self.repo.save_page(&self.site, target).await?;
        Ok(())
    }

    async fn on_deleted(&self, target: &LinkTarget) -> Result<()> {
        if self.is_actionable(target) {
            self.repo.delete_page(&self.site, target).await?;
        }
        Ok(())
    }

    async fn on_undeleted(&self, target: &LinkTarget) -> Result<()> {
        if self.is_actionable(target) {
            self.repo.save_page(&self.site, target).await?;
        }
        Ok(())
    }

    /// A move is a delete of the old title followed by a save of the new one.
    /// Between the two, neither title is indexed.
    async fn on_moved(&self, from: &LinkTarget, to: &LinkTarget) -> Result<()> {
        if self.is_actionable(from) {
            self.repo.delete_page(&self.site, from).await?;
        }
        if self.is_actionable(to) {
            self.repo.save_page(&self.site, to).await?;
        }
        Ok(())
    }
}
