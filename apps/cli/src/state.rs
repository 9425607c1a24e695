//! # Application State
//!
//! Everything a command needs, built once per process.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          AppState::open()                               │
//! │                                                                         │
//! │  AppConfig ──► database path ──► Database (migrations applied)         │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                   OptionStore ──► SyncEngine ──► LinkStore, NoteStore   │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │               stored credentials complete? ──yes──► configure()         │
//! │                                                                         │
//! │  finish(): flush pending push ──► stop debouncer ──► close database    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult, ErrorCode};
use startdeck_core::WaitType;
use startdeck_db::{Database, DbConfig};
use startdeck_sync::{
    AppConfig, Credentials, LinkStore, NoOpChannel, NoteStore, OptionStore, RemoteConnector,
    SyncEngine, SyncEngineBuilder, SyncEventEmitter, SyncNotice, WebDavConnector,
};

/// Prints sync notices to stderr.
pub struct ConsoleEmitter;

impl SyncEventEmitter for ConsoleEmitter {
    fn emit_wait_type(&self, wait_type: WaitType) {
        debug!(wait = %wait_type, "Sync state changed");
    }

    fn emit_error(&self, notice: &SyncNotice) {
        eprintln!("sync: {}", notice.message());
    }
}

/// Shared handles for one CLI invocation.
pub struct AppState {
    pub config: AppConfig,
    pub db: Arc<Database>,
    pub options: Arc<OptionStore>,
    pub engine: Arc<SyncEngine>,
    pub links: Arc<LinkStore>,
    pub notes: Arc<NoteStore>,
}

impl AppState {
    /// Opens the database named by the config and talks WebDAV.
    pub async fn open(config: AppConfig) -> CliResult<Self> {
        let path = config.database_path().ok_or_else(|| {
            CliError::new(
                ErrorCode::Internal,
                "Could not determine the data directory; set STARTDECK_DB_PATH",
            )
        })?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        info!(path = %path.display(), "Using database");

        let db_config = DbConfig::new(path).name(config.sync.database_name.clone());
        let db = Arc::new(Database::new(db_config).await?);
        let connector = Arc::new(WebDavConnector::new(config.remote.request_timeout()));
        Self::with_database(config, db, connector).await
    }

    /// Builds the state over an already open database.
    pub async fn with_database(
        config: AppConfig,
        db: Arc<Database>,
        connector: Arc<dyn RemoteConnector>,
    ) -> CliResult<Self> {
        let options = OptionStore::load(db.clone(), Arc::new(NoOpChannel)).await?;
        let engine = SyncEngineBuilder::new(config.clone())
            .with_database(db.clone())
            .with_options(options.clone())
            .with_connector(connector)
            .with_emitter(Arc::new(ConsoleEmitter))
            .build()?;
        let links = LinkStore::load(db.clone(), engine.clone()).await?;
        let notes = NoteStore::load(db.clone(), engine.clone()).await?;

        let settings = options.sync_settings().await;
        if settings.is_complete() {
            if let Err(e) = engine.configure(&Credentials::from(&settings)).await {
                warn!(error = %e, "Stored sync settings are unusable");
            }
        }

        Ok(AppState {
            config,
            db,
            options,
            engine,
            links,
            notes,
        })
    }

    /// Runs a pending push, then releases everything.
    pub async fn finish(&self) {
        if self.engine.flush().await {
            debug!("Pending push flushed before exit");
        }
        self.engine.shutdown().await;
        self.db.close().await;
    }
}
