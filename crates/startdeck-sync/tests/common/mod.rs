//! Shared fixtures for the sync integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use startdeck_core::options::keys;
use startdeck_core::snapshot::SnapshotRow;
use startdeck_core::{tables, DatabaseSnapshot, Link, WaitType, DATABASE_NAME};
use startdeck_db::{Database, DbConfig};
use startdeck_sync::{
    AppConfig, Credentials, MemoryRemote, NoOpChannel, OptionStore, RemoteConnector, RemoteStore,
    SyncEngine, SyncEngineBuilder, SyncEventEmitter, SyncNotice, SyncResult,
};

pub const DATA: &str = "startdeck/startdeck-data.json";
pub const VERSION: &str = "startdeck/startdeck-version.txt";
pub const INIT_FILE: &str = "startdeck/startdeck-init.text";

pub fn credentials() -> Credentials {
    Credentials::new("https://dav.example.com/dav/", "alice", "secret", "startdeck")
}

// =============================================================================
// Emitter
// =============================================================================

#[derive(Default)]
pub struct RecordingEmitter {
    pub notices: Mutex<Vec<SyncNotice>>,
    pub waits: Mutex<Vec<WaitType>>,
}

impl RecordingEmitter {
    pub fn notices(&self) -> Vec<SyncNotice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn waits(&self) -> Vec<WaitType> {
        self.waits.lock().unwrap().clone()
    }
}

impl SyncEventEmitter for RecordingEmitter {
    fn emit_wait_type(&self, wait_type: WaitType) {
        self.waits.lock().unwrap().push(wait_type);
    }

    fn emit_error(&self, notice: &SyncNotice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

// =============================================================================
// Remotes
// =============================================================================

/// Always returns the same remote store.
pub struct FixedConnector(pub Arc<dyn RemoteStore>);

impl RemoteConnector for FixedConnector {
    fn connect(&self, _credentials: &Credentials) -> SyncResult<Arc<dyn RemoteStore>> {
        Ok(self.0.clone())
    }
}

/// Wraps a [`MemoryRemote`]; while armed, writes block until released.
pub struct GatedRemote {
    pub inner: Arc<MemoryRemote>,
    pub armed: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedRemote {
    pub fn new(inner: Arc<MemoryRemote>) -> Arc<Self> {
        Arc::new(GatedRemote {
            inner,
            armed: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl RemoteStore for GatedRemote {
    async fn read(&self, path: &str) -> SyncResult<Option<Vec<u8>>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &str, body: Vec<u8>) -> SyncResult<()> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.write(path, body).await
    }

    async fn delete(&self, path: &str) -> SyncResult<()> {
        self.inner.delete(path).await
    }

    async fn create_dir_all(&self, dir: &str) -> SyncResult<()> {
        self.inner.create_dir_all(dir).await
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub db: Arc<Database>,
    pub options: Arc<OptionStore>,
    pub engine: Arc<SyncEngine>,
    pub remote: Arc<MemoryRemote>,
    pub emitter: Arc<RecordingEmitter>,
}

impl Harness {
    /// Engine over an in-memory database and an in-memory remote.
    pub async fn new() -> Self {
        let remote = MemoryRemote::new();
        Self::with_store(remote.clone(), remote).await
    }

    /// Engine whose connector hands out `store`; `remote` is the backing
    /// memory store for assertions.
    pub async fn with_store(store: Arc<dyn RemoteStore>, remote: Arc<MemoryRemote>) -> Self {
        let db = Arc::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let options = OptionStore::load(db.clone(), Arc::new(NoOpChannel))
            .await
            .unwrap();
        let emitter = Arc::new(RecordingEmitter::default());

        let engine = SyncEngineBuilder::new(AppConfig::default())
            .with_database(db.clone())
            .with_options(options.clone())
            .with_connector(Arc::new(FixedConnector(store)))
            .with_emitter(emitter.clone())
            .build()
            .unwrap();

        Harness {
            db,
            options,
            engine,
            remote,
            emitter,
        }
    }

    /// Stored settings plus a configured remote.
    pub async fn connected() -> Self {
        Self::connected_to(MemoryRemote::new()).await
    }

    /// A second device sharing `remote`.
    pub async fn connected_to(remote: Arc<MemoryRemote>) -> Self {
        let h = Self::with_store(remote.clone(), remote).await;
        h.store_settings().await;
        h.engine.configure(&credentials()).await.unwrap();
        h
    }

    pub async fn store_settings(&self) {
        let c = credentials();
        self.options.set_item(keys::WEBDAV_URL, json!(c.url), false).await.unwrap();
        self.options.set_item(keys::WEBDAV_USERNAME, json!(c.username), false).await.unwrap();
        self.options.set_item(keys::WEBDAV_PASSWORD, json!(c.password), false).await.unwrap();
        self.options.set_item(keys::WEBDAV_DIRECTORY, json!(c.directory), false).await.unwrap();
        self.options.set_item(keys::WEBDAV_INTERVAL, json!(1), false).await.unwrap();
    }

    pub async fn set_local_version(&self, value: Value) {
        self.options.set_item(keys::LOCAL_VERSION, value, false).await.unwrap();
    }

    pub async fn local_version(&self) -> Option<String> {
        self.options.local_version_text().await
    }

    /// Every exported table, unredacted.
    pub async fn dump(&self) -> Vec<u8> {
        self.engine.export_backup().await.unwrap()
    }

    pub async fn add_link(&self, title: &str) -> Link {
        let link = Link::new(title, format!("https://{}.example.com", title.to_lowercase()), 0);
        self.db.links().put(&link).await.unwrap();
        link
    }

    pub async fn remote_writes(&self) -> usize {
        self.remote
            .ops()
            .await
            .iter()
            .filter(|op| op.is_mutation())
            .count()
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// A remote snapshot holding the given links and options.
pub fn remote_snapshot(links: &[Link], options: &[(&str, Value)]) -> DatabaseSnapshot {
    let mut snapshot = DatabaseSnapshot::new(DATABASE_NAME, 1);
    snapshot.push_table(
        tables::LINK,
        "id,title,url,position",
        links
            .iter()
            .map(|l| SnapshotRow {
                key: l.id.clone(),
                value: serde_json::to_value(l).unwrap(),
            })
            .collect(),
    );
    snapshot.push_table(
        tables::OPTION,
        "key",
        options
            .iter()
            .map(|(k, v)| SnapshotRow {
                key: k.to_string(),
                value: v.clone(),
            })
            .collect(),
    );
    snapshot
}

pub fn to_bytes(snapshot: &DatabaseSnapshot) -> Vec<u8> {
    snapshot.to_bytes(true).unwrap()
}
