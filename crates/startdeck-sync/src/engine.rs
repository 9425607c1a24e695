//! # Sync Engine
//!
//! Replicates the whole local database through a WebDAV directory, using a
//! monotonic version counter to decide the direction.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              pull()                                     │
//! │                                                                         │
//! │   locked? ──yes──► skip                                                 │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │   GET <prefix>-version.txt                                              │
//! │      │                                                                  │
//! │      ├── absent / empty ───────────────► push()                         │
//! │      ├── unreadable ───────────────────► notice, stop                   │
//! │      ▼                                                                  │
//! │   remote vs local                                                       │
//! │      ├── equal ────────────────────────► nothing to do                  │
//! │      ├── remote < local ───────────────► push()                         │
//! │      └── remote > local ───────────────► apply_remote()                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          apply_remote(version)                          │
//! │                                                                         │
//! │   lock (wait = pull) ─► backup export ─► keep local-only options        │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │   GET data file ─► strict validation ──fail──► notice, local untouched  │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │   delete db ─► open ─► import ─► lenient check ─► set version,          │
//! │      │                                restore kept options, reload      │
//! │      └── any failure ─► restore backup (or report that it is gone)      │
//! │                                                                         │
//! │   lock released on every path                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Push Ordering
//! The data file is written strictly before the version marker. If the
//! marker write fails the data file is deleted again (best effort), so other
//! devices never see a marker without matching data.
//!
//! ## Local Edits
//! Stores call [`SyncEngine::update`] after every mutation. It bumps the
//! version counter right away and triggers the debounced push.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::debounce::{DebounceHandle, DebouncedAction};
use crate::error::{SyncError, SyncNotice, SyncResult};
use crate::events::{NoOpEmitter, SyncEventEmitter};
use crate::remote::{Credentials, RemoteConnector, RemotePaths, RemoteState, RemoteStore, WebDavConnector};
use crate::stores::{OptionStore, ReloadTarget};
use startdeck_core::options::{keys, redact_row, SyncSettings, CONNECTION_KEYS, PRESERVED_LOCAL_KEYS};
use startdeck_core::snapshot::validate_snapshot;
use startdeck_core::validation::{validate_directory, validate_webdav_url};
use startdeck_core::version::{current_timestamp, next_version, parse_marker, parse_or_recover};
use startdeck_core::{ephemeral_tables, DatabaseSnapshot, SnapshotError, SnapshotMode, SnapshotShape, WaitType};
use startdeck_db::{Database, ExportOptions, ImportOptions, ImportSummary};

// =============================================================================
// Outcomes
// =============================================================================

/// Why an operation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another operation holds the lock.
    Locked,
    /// No remote is configured.
    NotConfigured,
}

/// Result of [`SyncEngine::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Skipped(SkipReason),
    /// Data and marker were written.
    Pushed { version: i64 },
    Failed(SyncNotice),
}

/// Result of [`SyncEngine::apply_remote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Skipped(SkipReason),
    /// The remote snapshot replaced the local database.
    Applied { version: i64 },
    /// The remote data was not applied; the local database was not touched.
    Rejected(SyncNotice),
    /// Applying failed after the local database was replaced; the backup is back.
    RolledBack(SyncNotice),
    /// Applying failed and the backup could not be restored.
    Failed(SyncNotice),
}

/// Result of [`SyncEngine::pull`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    Skipped(SkipReason),
    /// Both sides carry the same version.
    UpToDate { version: i64 },
    /// The remote was empty or behind; local data was pushed.
    PushedLocal(PushOutcome),
    /// The remote was ahead.
    Applied(ApplyOutcome),
    Failed(SyncNotice),
}

/// Result of [`SyncEngine::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Skipped(SkipReason),
    /// The counter was bumped and a push is scheduled.
    Scheduled {
        version: i64,
        /// The counter was unusable and restarted from the clock.
        reset: bool,
    },
    Failed(SyncNotice),
}

/// Snapshot of the engine state for status displays.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub configured: bool,
    pub locked: bool,
    pub wait_type: WaitType,
    pub push_pending: bool,
    pub local_version: Option<String>,
    pub last_pull_at: Option<DateTime<Utc>>,
    pub last_push_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Clone)]
struct RemoteTarget {
    remote: Arc<dyn RemoteStore>,
    paths: RemotePaths,
}

#[derive(Default)]
struct EngineState {
    target: Option<RemoteTarget>,
    last_pull_at: Option<DateTime<Utc>>,
    last_push_at: Option<DateTime<Utc>>,
}

/// The WebDAV sync engine.
///
/// Construct with [`SyncEngineBuilder`]; the engine is always shared as
/// `Arc<SyncEngine>` because the debounced push holds a weak reference to it.
pub struct SyncEngine {
    me: Weak<SyncEngine>,
    db: Arc<Database>,
    options: Arc<OptionStore>,
    connector: Arc<dyn RemoteConnector>,
    emitter: Arc<dyn SyncEventEmitter>,
    config: AppConfig,
    locked: AtomicBool,
    wait_tx: watch::Sender<WaitType>,
    state: Mutex<EngineState>,
    debouncer: Mutex<Option<DebounceHandle>>,
    reload_targets: Mutex<Vec<Weak<dyn ReloadTarget>>>,
}

/// Releases the engine lock and clears the wait type when dropped.
struct LockGuard<'a> {
    engine: &'a SyncEngine,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.engine.locked.store(false, Ordering::SeqCst);
        self.engine.set_wait(WaitType::Idle);
    }
}

impl SyncEngine {
    // =========================================================================
    // Connection Lifecycle
    // =========================================================================

    /// Starts sync from the stored settings.
    ///
    /// Does nothing unless URL, username, password and directory are all
    /// set. Connects if needed, (re)arms the debounced push with the
    /// configured interval, then pulls.
    pub async fn init(&self) -> PullOutcome {
        let settings = self.options.sync_settings().await;
        if let Some(field) = settings.missing_field() {
            debug!(missing = field, "Sync not configured, skipping init");
            return PullOutcome::Skipped(SkipReason::NotConfigured);
        }

        let connected = self.state.lock().await.target.is_some();
        if !connected {
            if let Err(e) = self.configure(&Credentials::from(&settings)).await {
                let notice = SyncNotice::ConnectFailed(e.to_string());
                self.report(&notice);
                return PullOutcome::Failed(notice);
            }
        }

        let period = self.push_period(&settings).await;
        self.install_debouncer(period).await;

        self.pull().await
    }

    /// Points the engine at a remote. Persists nothing.
    pub async fn configure(&self, credentials: &Credentials) -> SyncResult<()> {
        validate_webdav_url(&credentials.url)?;
        validate_directory(&credentials.directory)?;

        let remote = self.connector.connect(credentials)?;
        let paths = RemotePaths::new(&credentials.directory, &self.config.remote.file_prefix);

        info!(
            url = %credentials.url,
            directory = %paths.directory(),
            "Remote configured"
        );
        self.state.lock().await.target = Some(RemoteTarget { remote, paths });
        Ok(())
    }

    /// Checks that a remote is reachable and writable.
    ///
    /// Creates the directory when allowed, writes and deletes a one-byte
    /// init file, then looks for a version marker. Does not change the
    /// engine's own connection.
    pub async fn test(&self, credentials: &Credentials) -> SyncResult<RemoteState> {
        validate_webdav_url(&credentials.url)?;
        validate_directory(&credentials.directory)?;

        let remote = self.connector.connect(credentials)?;
        let paths = RemotePaths::new(&credentials.directory, &self.config.remote.file_prefix);

        if self.config.remote.create_directories && !paths.directory().is_empty() {
            match remote.create_dir_all(paths.directory()).await {
                Ok(()) => {}
                Err(e @ SyncError::AuthFailed { .. }) => return Err(e),
                Err(e) => warn!(error = %e, "Could not create remote directory"),
            }
        }

        remote.write(&paths.init_marker(), b"1".to_vec()).await?;
        if let Err(e) = remote.delete(&paths.init_marker()).await {
            debug!(error = %e, "Failed to delete init file");
        }

        let state = match remote.read(&paths.version()).await {
            Ok(Some(body)) if !String::from_utf8_lossy(&body).trim().is_empty() => {
                RemoteState::HasData
            }
            Ok(_) => RemoteState::Empty,
            Err(e) => {
                debug!(error = %e, "Version marker unreadable");
                RemoteState::Empty
            }
        };

        info!(url = %credentials.url, ?state, "Connection test passed");
        Ok(state)
    }

    /// Forgets the connection: clears the stored connection settings, drops
    /// the remote and cancels a pending push.
    pub async fn delete_remote_config(&self) -> SyncResult<()> {
        for key in CONNECTION_KEYS {
            self.options.set_item(key, json!(""), false).await?;
        }

        self.state.lock().await.target = None;

        if let Some(handle) = self.debouncer.lock().await.as_ref() {
            handle.cancel().await;
        }

        info!("Sync disconnected");
        Ok(())
    }

    // =========================================================================
    // Pull
    // =========================================================================

    /// Compares version markers and moves data in whichever direction is
    /// needed.
    pub async fn pull(&self) -> PullOutcome {
        if self.is_locked() {
            debug!("Sync locked, skipping pull");
            return PullOutcome::Skipped(SkipReason::Locked);
        }
        let Some(target) = self.target().await else {
            return PullOutcome::Skipped(SkipReason::NotConfigured);
        };

        let marker = match target.remote.read(&target.paths.version()).await {
            Ok(Some(body)) => String::from_utf8_lossy(&body).trim().to_string(),
            Ok(None) => String::new(),
            Err(e) if e.is_not_found() => String::new(),
            Err(e) => {
                let notice = SyncNotice::PullFailed(e.to_string());
                self.report(&notice);
                return PullOutcome::Failed(notice);
            }
        };

        if marker.is_empty() {
            info!("Remote has no version marker, uploading local data");
            return PullOutcome::PushedLocal(self.push().await);
        }

        let remote_version = match parse_marker(&marker) {
            Ok(parsed) => {
                if parsed.was_repaired() {
                    warn!(marker = %marker, version = parsed.value, "Remote version marker was not a plain number");
                }
                parsed.value
            }
            Err(e) => {
                let notice = SyncNotice::InvalidRemoteVersion(e.to_string());
                self.report(&notice);
                return PullOutcome::Failed(notice);
            }
        };

        let local_version = match self.local_version().await {
            Ok(version) => version,
            Err(e) => {
                let notice = SyncNotice::PullFailed(e.to_string());
                self.report(&notice);
                return PullOutcome::Failed(notice);
            }
        };

        debug!(remote_version, local_version, "Comparing versions");

        match remote_version.cmp(&local_version) {
            std::cmp::Ordering::Equal => PullOutcome::UpToDate {
                version: local_version,
            },
            std::cmp::Ordering::Less => {
                info!(remote_version, local_version, "Remote is behind, pushing");
                PullOutcome::PushedLocal(self.push().await)
            }
            std::cmp::Ordering::Greater => {
                info!(remote_version, local_version, "Remote is ahead, applying");
                PullOutcome::Applied(self.apply_remote(&marker).await)
            }
        }
    }

    /// Replaces the local database with the remote snapshot.
    ///
    /// `remote_version` is the marker text; it becomes the local version on
    /// success.
    pub async fn apply_remote(&self, remote_version: &str) -> ApplyOutcome {
        let version = match parse_marker(remote_version) {
            Ok(parsed) => parsed.value,
            Err(e) => {
                let notice = SyncNotice::InvalidRemoteVersion(e.to_string());
                self.report(&notice);
                return ApplyOutcome::Failed(notice);
            }
        };

        if self.is_locked() {
            return ApplyOutcome::Skipped(SkipReason::Locked);
        }
        let Some(target) = self.target().await else {
            return ApplyOutcome::Skipped(SkipReason::NotConfigured);
        };
        let Some(_guard) = self.try_lock(WaitType::Pull) else {
            return ApplyOutcome::Skipped(SkipReason::Locked);
        };

        let backup = match self.export_backup().await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "Backup export failed, restore will be unavailable");
                None
            }
        };
        let preserved = self.options.snapshot_keys(PRESERVED_LOCAL_KEYS).await;

        let snapshot = match self.fetch_remote(&target).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let notice = match e {
                    SyncError::Snapshot(_) => SyncNotice::RemoteRejected(e.to_string()),
                    other => SyncNotice::PullFailed(other.to_string()),
                };
                self.report(&notice);
                return ApplyOutcome::Rejected(notice);
            }
        };

        match self.replace_local(&snapshot, version, &preserved).await {
            Ok(summary) => {
                info!(
                    version,
                    tables = summary.tables,
                    rows = summary.rows,
                    "Remote data applied"
                );
                self.state.lock().await.last_pull_at = Some(Utc::now());
                ApplyOutcome::Applied { version }
            }
            Err(cause) => {
                error!(error = %cause, "Applying remote data failed");
                self.recover(backup, cause).await
            }
        }
    }

    async fn fetch_remote(&self, target: &RemoteTarget) -> SyncResult<DatabaseSnapshot> {
        let body = match target.remote.read(&target.paths.data()).await {
            Ok(Some(body)) => body,
            Ok(None) => return Err(SnapshotError::Empty.into()),
            Err(e) if e.is_not_found() => return Err(SnapshotError::Empty.into()),
            Err(e) => return Err(e),
        };

        let (snapshot, shape) = validate_snapshot(
            &body,
            &self.config.sync.database_name,
            SnapshotMode::Strict,
        )?;
        if shape == SnapshotShape::Legacy {
            warn!("Remote snapshot has no table list (legacy format)");
        }

        Ok(snapshot)
    }

    async fn replace_local(
        &self,
        snapshot: &DatabaseSnapshot,
        version: i64,
        preserved: &[(String, Option<Value>)],
    ) -> SyncResult<ImportSummary> {
        self.db.delete().await?;
        self.db.open().await?;
        let summary = self
            .db
            .import_snapshot(snapshot, &ImportOptions::replace())
            .await?;

        self.verify_import(snapshot).await?;
        let check = self.db.export(&Self::backup_options()).await?;
        validate_snapshot(&check, self.db.name(), SnapshotMode::Lenient)?;

        self.options.reload().await?;
        self.options
            .set_item(keys::LOCAL_VERSION, json!(version), false)
            .await?;
        for (key, value) in preserved {
            if key == keys::LOCAL_VERSION {
                continue;
            }
            match value {
                Some(value) => self.options.set_item(key, value.clone(), false).await?,
                None => {
                    self.options.remove_item(key).await?;
                }
            }
        }

        if let Err(e) = self.options.push_all_to_channel().await {
            warn!(error = %e, "Failed to publish settings after pull");
        }
        self.reload_dependents().await;

        let local_schema = self.db.schema_version().await?;
        if local_schema != summary.snapshot_version {
            info!(
                local_schema,
                snapshot_schema = summary.snapshot_version,
                "Schema versions differ, running migrations"
            );
            self.db.run_migrations().await?;
        }

        Ok(summary)
    }

    async fn recover(&self, backup: Option<Vec<u8>>, cause: SyncError) -> ApplyOutcome {
        let cause = cause.to_string();

        let Some(bytes) = backup else {
            let notice = SyncNotice::NoBackup { cause };
            self.report(&notice);
            return ApplyOutcome::Failed(notice);
        };

        match self.restore_backup(&bytes).await {
            Ok(()) => {
                warn!("Previous local data restored");
                let notice = SyncNotice::Restored { cause };
                self.report(&notice);
                ApplyOutcome::RolledBack(notice)
            }
            Err(e) => {
                let notice = SyncNotice::RestoreFailed {
                    cause,
                    restore_error: e.to_string(),
                };
                self.report(&notice);
                ApplyOutcome::Failed(notice)
            }
        }
    }

    async fn restore_backup(&self, bytes: &[u8]) -> SyncResult<()> {
        if self.db.is_open().await {
            self.db.close().await;
        }
        let snapshot: DatabaseSnapshot = serde_json::from_slice(bytes)?;
        self.db.delete().await?;
        self.db.open().await?;
        self.db
            .import_snapshot(&snapshot, &ImportOptions::replace())
            .await?;

        self.verify_import(&snapshot).await?;
        let check = self.db.export(&Self::backup_options()).await?;
        validate_snapshot(&check, self.db.name(), SnapshotMode::Lenient)?;

        self.options.reload().await?;
        self.reload_dependents().await;
        Ok(())
    }

    /// Every imported table must hold exactly the rows the snapshot carried.
    async fn verify_import(&self, snapshot: &DatabaseSnapshot) -> SyncResult<()> {
        for set in &snapshot.data.data {
            let expected = set.rows.len() as u64;
            let found = self.db.count(&set.table_name).await? as u64;
            if found != expected {
                return Err(SnapshotError::RowCountMismatch {
                    table: set.table_name.clone(),
                    declared: expected,
                    found,
                }
                .into());
            }
        }
        Ok(())
    }

    // =========================================================================
    // Push
    // =========================================================================

    /// Uploads the local database, then the version marker.
    pub async fn push(&self) -> PushOutcome {
        if self.is_locked() {
            debug!("Sync locked, skipping push");
            return PushOutcome::Skipped(SkipReason::Locked);
        }
        let Some(target) = self.target().await else {
            return PushOutcome::Skipped(SkipReason::NotConfigured);
        };
        let Some(_guard) = self.try_lock(WaitType::Push) else {
            return PushOutcome::Skipped(SkipReason::Locked);
        };

        match self.upload(&target).await {
            Ok(version) => {
                info!(version, "Local data pushed");
                self.state.lock().await.last_push_at = Some(Utc::now());
                PushOutcome::Pushed { version }
            }
            Err(e) => {
                let notice = match e {
                    SyncError::InconsistentRemote(cause) => SyncNotice::InconsistentRemote(cause),
                    other => SyncNotice::PushFailed(other.to_string()),
                };
                self.report(&notice);
                PushOutcome::Failed(notice)
            }
        }
    }

    async fn upload(&self, target: &RemoteTarget) -> SyncResult<i64> {
        let snapshot = self.db.export_snapshot(&Self::remote_export_options()).await?;
        if snapshot.is_empty() {
            return Err(SyncError::EmptyExport);
        }
        let body = snapshot.to_bytes(true)?;

        self.write_data(target, body).await?;

        let version = self.local_version().await?;
        let marker = target.paths.version();
        if let Err(e) = target
            .remote
            .write(&marker, version.to_string().into_bytes())
            .await
        {
            error!(error = %e, "Version marker write failed, removing uploaded data");
            if let Err(cleanup) = target.remote.delete(&target.paths.data()).await {
                warn!(error = %cleanup, "Failed to remove uploaded data");
            }
            return Err(SyncError::InconsistentRemote(e.to_string()));
        }

        Ok(version)
    }

    /// Writes the data file, creating the directory once on 409 Conflict.
    async fn write_data(&self, target: &RemoteTarget, body: Vec<u8>) -> SyncResult<()> {
        let path = target.paths.data();
        match target.remote.write(&path, body.clone()).await {
            Err(e) if e.is_conflict() && self.config.remote.create_directories => {
                info!(directory = %target.paths.directory(), "Remote directory missing, creating it");
                target.remote.create_dir_all(target.paths.directory()).await?;
                target.remote.write(&path, body).await
            }
            other => other,
        }
    }

    /// Records a local change: bumps the version counter and schedules a push.
    pub async fn update(&self) -> UpdateOutcome {
        let settings = self.options.sync_settings().await;
        if settings.url.trim().is_empty() {
            return UpdateOutcome::Skipped(SkipReason::NotConfigured);
        }
        if self.is_locked() {
            debug!("Sync locked, skipping update");
            return UpdateOutcome::Skipped(SkipReason::Locked);
        }

        let raw = self
            .options
            .local_version_text()
            .await
            .unwrap_or_else(|| "0".to_string());
        let bump = next_version(&raw, current_timestamp());

        if let Err(e) = self
            .options
            .set_item(keys::LOCAL_VERSION, json!(bump.value()), false)
            .await
        {
            let notice = SyncNotice::UpdateFailed(e.to_string());
            self.report(&notice);
            return UpdateOutcome::Failed(notice);
        }

        if bump.is_reset() {
            warn!(raw = %raw, version = bump.value(), "Local version was unusable, reset from clock");
        } else {
            debug!(version = bump.value(), "Local version bumped");
        }

        let period = self.push_period(&settings).await;
        self.schedule_push(period).await;

        UpdateOutcome::Scheduled {
            version: bump.value(),
            reset: bump.is_reset(),
        }
    }

    /// Runs a pending debounced push now. Returns whether one was pending.
    pub async fn flush(&self) -> bool {
        let handle = self.debouncer.lock().await.clone();
        match handle {
            Some(handle) => handle.flush().await,
            None => false,
        }
    }

    /// Stops the debounce task. A pending push is dropped; call
    /// [`SyncEngine::flush`] first to keep it.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.debouncer.lock().await.take() {
            handle.shutdown().await;
        }
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Snapshot for upload: ephemeral tables skipped, wallpaper options redacted.
    pub async fn export_snapshot(&self) -> SyncResult<Vec<u8>> {
        Ok(self.db.export(&Self::remote_export_options()).await?)
    }

    /// Full local snapshot of every table without redaction, used for backups.
    pub async fn export_backup(&self) -> SyncResult<Vec<u8>> {
        Ok(self.db.export(&Self::backup_options()).await?)
    }

    /// Replaces the local data with a snapshot file and schedules a push.
    pub async fn import_snapshot(&self, bytes: &[u8]) -> SyncResult<ImportSummary> {
        let (snapshot, shape) = validate_snapshot(bytes, self.db.name(), SnapshotMode::Strict)?;
        if shape == SnapshotShape::Legacy {
            warn!("Imported snapshot has no table list (legacy format)");
        }

        let guard = self.try_lock(WaitType::Pull).ok_or(SyncError::Locked)?;
        let summary = self
            .db
            .import_snapshot(&snapshot, &ImportOptions::replace())
            .await?;
        self.options.reload().await?;
        self.reload_dependents().await;
        drop(guard);

        self.update().await;
        Ok(summary)
    }

    fn remote_export_options() -> ExportOptions {
        ExportOptions::pretty(&ephemeral_tables()).with_transform(redact_row)
    }

    fn backup_options() -> ExportOptions {
        ExportOptions {
            pretty_json: false,
            ..ExportOptions::pretty(&[])
        }
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Operation currently holding the lock.
    pub fn wait_type(&self) -> WaitType {
        *self.wait_tx.borrow()
    }

    /// Receiver that sees every wait type change.
    pub fn subscribe(&self) -> watch::Receiver<WaitType> {
        self.wait_tx.subscribe()
    }

    /// True while a pull or push is running.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> EngineStatus {
        let push_pending = match self.debouncer.lock().await.clone() {
            Some(handle) => handle.is_pending().await,
            None => false,
        };
        let state = self.state.lock().await;

        EngineStatus {
            configured: state.target.is_some(),
            locked: self.is_locked(),
            wait_type: self.wait_type(),
            push_pending,
            local_version: self.options.local_version_text().await,
            last_pull_at: state.last_pull_at,
            last_push_at: state.last_push_at,
        }
    }

    /// Registers a store to be reloaded after a pull.
    pub async fn register_reload_target(&self, target: Weak<dyn ReloadTarget>) {
        self.reload_targets.lock().await.push(target);
    }

    /// The option store the engine reads its settings from.
    pub fn options(&self) -> &Arc<OptionStore> {
        &self.options
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn try_lock(&self, wait: WaitType) -> Option<LockGuard<'_>> {
        self.locked
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        self.set_wait(wait);
        Some(LockGuard { engine: self })
    }

    fn set_wait(&self, wait: WaitType) {
        let previous = self.wait_tx.send_replace(wait);
        if previous != wait {
            self.emitter.emit_wait_type(wait);
        }
    }

    fn report(&self, notice: &SyncNotice) {
        error!(?notice, "{}", notice.message());
        self.emitter.emit_error(notice);
    }

    async fn target(&self) -> Option<RemoteTarget> {
        self.state.lock().await.target.clone()
    }

    /// Local version as a number; absent reads as 0. Garbage is repaired
    /// and written back.
    async fn local_version(&self) -> SyncResult<i64> {
        let Some(raw) = self.options.local_version_text().await else {
            return Ok(0);
        };

        let parsed = parse_or_recover(&raw, current_timestamp());
        if parsed.was_repaired() {
            warn!(raw = %raw, repaired = parsed.value, "Repairing local version");
            self.options
                .set_item(keys::LOCAL_VERSION, json!(parsed.value), false)
                .await?;
        }
        Ok(parsed.value)
    }

    async fn push_period(&self, settings: &SyncSettings) -> Duration {
        let secs = if self.options.item(keys::WEBDAV_INTERVAL).await.is_some() {
            settings.interval_secs
        } else {
            self.config.sync.default_interval_secs
        };
        Duration::from_secs(secs)
    }

    async fn install_debouncer(&self, period: Duration) {
        let mut slot = self.debouncer.lock().await;
        match slot.as_ref() {
            Some(handle) => handle.set_period(period).await,
            None => *slot = Some(DebounceHandle::spawn(period, self.push_action())),
        }
    }

    async fn schedule_push(&self, period: Duration) {
        let handle = {
            let mut slot = self.debouncer.lock().await;
            match slot.as_ref() {
                Some(handle) => handle.clone(),
                None => {
                    let handle = DebounceHandle::spawn(period, self.push_action());
                    *slot = Some(handle.clone());
                    handle
                }
            }
        };
        handle.trigger().await;
    }

    fn push_action(&self) -> DebouncedAction {
        let engine = self.me.clone();
        Arc::new(move || {
            let engine = engine.clone();
            Box::pin(async move {
                if let Some(engine) = engine.upgrade() {
                    let outcome = engine.push().await;
                    debug!(?outcome, "Debounced push finished");
                }
            })
        })
    }

    async fn reload_dependents(&self) {
        let targets: Vec<Arc<dyn ReloadTarget>> = {
            let mut list = self.reload_targets.lock().await;
            list.retain(|target| target.strong_count() > 0);
            list.iter().filter_map(Weak::upgrade).collect()
        };

        for target in targets {
            if let Err(e) = target.reload().await {
                warn!(store = target.name(), error = %e, "Failed to reload store");
            }
        }
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for creating a [`SyncEngine`].
pub struct SyncEngineBuilder {
    config: AppConfig,
    db: Option<Arc<Database>>,
    options: Option<Arc<OptionStore>>,
    connector: Option<Arc<dyn RemoteConnector>>,
    emitter: Option<Arc<dyn SyncEventEmitter>>,
}

impl SyncEngineBuilder {
    /// Creates a new builder with the given config.
    pub fn new(config: AppConfig) -> Self {
        SyncEngineBuilder {
            config,
            db: None,
            options: None,
            connector: None,
            emitter: None,
        }
    }

    /// Sets the database.
    pub fn with_database(mut self, db: Arc<Database>) -> Self {
        self.db = Some(db);
        self
    }

    /// Sets the option store.
    pub fn with_options(mut self, options: Arc<OptionStore>) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets the remote connector. Defaults to WebDAV.
    pub fn with_connector(mut self, connector: Arc<dyn RemoteConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Sets the event emitter.
    pub fn with_emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Builds the engine.
    pub fn build(self) -> SyncResult<Arc<SyncEngine>> {
        let db = self
            .db
            .ok_or_else(|| SyncError::Internal("Database is required".into()))?;
        let options = self
            .options
            .ok_or_else(|| SyncError::Internal("Option store is required".into()))?;
        let timeout = self.config.remote.request_timeout();
        let connector = self
            .connector
            .unwrap_or_else(|| -> Arc<dyn RemoteConnector> { Arc::new(WebDavConnector::new(timeout)) });
        let emitter = self
            .emitter
            .unwrap_or_else(|| -> Arc<dyn SyncEventEmitter> { Arc::new(NoOpEmitter) });
        let (wait_tx, _) = watch::channel(WaitType::Idle);
        let config = self.config;

        Ok(Arc::new_cyclic(|me| SyncEngine {
            me: me.clone(),
            db,
            options,
            connector,
            emitter,
            config,
            locked: AtomicBool::new(false),
            wait_tx,
            state: Mutex::new(EngineState::default()),
            debouncer: Mutex::new(None),
            reload_targets: Mutex::new(Vec::new()),
        }))
    }
}
