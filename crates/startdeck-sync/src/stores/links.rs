//! Link store: the bookmarks on the start page, ordered by position.

use async_trait::async_trait;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tracing::debug;

use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::stores::ReloadTarget;
use startdeck_core::tables;
use startdeck_core::validation::validate_link;
use startdeck_core::Link;
use startdeck_db::Database;

/// Cached, position-ordered list of links.
pub struct LinkStore {
    db: Arc<Database>,
    engine: Arc<SyncEngine>,
    links: RwLock<Vec<Link>>,
}

impl LinkStore {
    /// Loads the links and registers the store for reload after a pull.
    pub async fn load(db: Arc<Database>, engine: Arc<SyncEngine>) -> SyncResult<Arc<Self>> {
        let store = Arc::new(LinkStore {
            db,
            engine,
            links: RwLock::new(Vec::new()),
        });
        store.refresh().await?;

        let weak = Arc::downgrade(&store);
        let target: Weak<dyn ReloadTarget> = weak;
        store.engine.register_reload_target(target).await;
        Ok(store)
    }

    /// All links, ordered by position.
    pub async fn list(&self) -> Vec<Link> {
        self.links.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Link> {
        self.links.read().await.iter().find(|l| l.id == id).cloned()
    }

    /// Appends a link at the end of the page.
    pub async fn add(&self, title: &str, url: &str) -> SyncResult<Link> {
        let position = self
            .links
            .read()
            .await
            .iter()
            .map(|l| l.position + 1)
            .max()
            .unwrap_or(0);

        let link = Link::new(title.trim(), url.trim(), position);
        validate_link(&link)?;

        self.db.links().put(&link).await?;
        self.links.write().await.push(link.clone());
        debug!(id = %link.id, "Link added");

        self.engine.update().await;
        Ok(link)
    }

    /// Replaces an existing link.
    pub async fn update(&self, link: Link) -> SyncResult<()> {
        validate_link(&link)?;
        if self.get(&link.id).await.is_none() {
            return Err(SyncError::RecordNotFound {
                table: tables::LINK.into(),
                id: link.id,
            });
        }

        self.db.links().put(&link).await?;
        {
            let mut links = self.links.write().await;
            if let Some(slot) = links.iter_mut().find(|l| l.id == link.id) {
                *slot = link;
            }
            links.sort_by_key(|l| l.position);
        }

        self.engine.update().await;
        Ok(())
    }

    /// Removes a link. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> SyncResult<bool> {
        let existed = self.db.links().delete(id).await?;
        if existed {
            self.links.write().await.retain(|l| l.id != id);
            debug!(id = %id, "Link removed");
            self.engine.update().await;
        }
        Ok(existed)
    }

    async fn refresh(&self) -> SyncResult<()> {
        let mut links = self.db.links().list().await?;
        links.sort_by_key(|l| l.position);
        *self.links.write().await = links;
        Ok(())
    }
}

#[async_trait]
impl ReloadTarget for LinkStore {
    fn name(&self) -> &'static str {
        "links"
    }

    async fn reload(&self) -> SyncResult<()> {
        self.refresh().await
    }
}
