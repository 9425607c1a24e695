//! # Option Store
//!
//! Key/value settings backed by the `option` table, cached in memory.
//!
//! ```text
//!   set_item(key, value, persist_remotely)
//!        │
//!        ├──► option table (SQLite)
//!        ├──► in-memory cache
//!        └──► SettingsChannel   (only when persist_remotely)
//! ```
//!
//! The settings channel is the host's own settings-sync mechanism (browser
//! storage sync in the extension). The sync engine uses it to republish every
//! option after a pull replaced the database.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::SyncResult;
use startdeck_core::options::{keys, SyncSettings};
use startdeck_core::version::version_text;
use startdeck_db::Database;

// =============================================================================
// Settings Channel
// =============================================================================

/// The host's settings-sync channel.
#[async_trait]
pub trait SettingsChannel: Send + Sync {
    /// Publishes one setting.
    async fn publish(&self, key: &str, value: &Value) -> SyncResult<()>;

    /// Publishes every setting at once.
    async fn publish_all(&self, items: &[(String, Value)]) -> SyncResult<()>;
}

/// Channel that drops everything. Used when the host has none.
pub struct NoOpChannel;

#[async_trait]
impl SettingsChannel for NoOpChannel {
    async fn publish(&self, _key: &str, _value: &Value) -> SyncResult<()> {
        Ok(())
    }

    async fn publish_all(&self, _items: &[(String, Value)]) -> SyncResult<()> {
        Ok(())
    }
}

// =============================================================================
// Option Store
// =============================================================================

/// Cached view over the `option` table.
pub struct OptionStore {
    db: Arc<Database>,
    channel: Arc<dyn SettingsChannel>,
    cache: RwLock<BTreeMap<String, Value>>,
}

impl OptionStore {
    /// Creates the store and loads every option into the cache.
    pub async fn load(db: Arc<Database>, channel: Arc<dyn SettingsChannel>) -> SyncResult<Arc<Self>> {
        let store = Arc::new(OptionStore {
            db,
            channel,
            cache: RwLock::new(BTreeMap::new()),
        });
        store.reload().await?;
        Ok(store)
    }

    /// Cached value of an option.
    pub async fn item(&self, key: &str) -> Option<Value> {
        self.cache.read().await.get(key).cloned()
    }

    /// Writes an option; optionally publishes it on the settings channel.
    ///
    /// A channel failure is logged and does not fail the write.
    pub async fn set_item(&self, key: &str, value: Value, persist_remotely: bool) -> SyncResult<()> {
        self.db.options().set(key, &value).await?;

        if persist_remotely {
            if let Err(e) = self.channel.publish(key, &value).await {
                warn!(key = %key, error = %e, "Failed to publish setting");
            }
        }

        self.cache.write().await.insert(key.to_string(), value);
        Ok(())
    }

    /// Removes an option. Returns whether it existed.
    pub async fn remove_item(&self, key: &str) -> SyncResult<bool> {
        let existed = self.db.options().remove(key).await?;
        self.cache.write().await.remove(key);
        Ok(existed)
    }

    /// Connection settings as currently cached.
    pub async fn sync_settings(&self) -> SyncSettings {
        let cache = self.cache.read().await;
        SyncSettings::from_lookup(|key| cache.get(key).cloned())
    }

    /// Raw text of the local version counter; `None` when unset.
    pub async fn local_version_text(&self) -> Option<String> {
        self.item(keys::LOCAL_VERSION)
            .await
            .as_ref()
            .and_then(version_text)
    }

    /// Cached values of the given keys, `None` for absent ones.
    pub async fn snapshot_keys(&self, keys: &[&str]) -> Vec<(String, Option<Value>)> {
        let cache = self.cache.read().await;
        keys.iter()
            .map(|key| (key.to_string(), cache.get(*key).cloned()))
            .collect()
    }

    /// All cached options.
    pub async fn all(&self) -> Vec<(String, Value)> {
        self.cache
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Re-reads the cache from the database.
    pub async fn reload(&self) -> SyncResult<()> {
        let rows = self.db.options().all().await?;
        let count = rows.len();
        *self.cache.write().await = rows.into_iter().collect();
        debug!(count, "Options loaded");
        Ok(())
    }

    /// Publishes every cached option on the settings channel.
    pub async fn push_all_to_channel(&self) -> SyncResult<()> {
        let items = self.all().await;
        self.channel.publish_all(&items).await
    }
}
