//! # Database Lifecycle
//!
//! Connection pool creation and the open / close / delete lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Lifecycle                                 │
//! │                                                                         │
//! │  Database::new(config) ──► open() ──► pool + migrations                │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                     ┌───────────────────┐                              │
//! │                     │       OPEN        │◄─────────────┐               │
//! │                     │ get / put / list  │              │               │
//! │                     │ export / import   │              │ open()        │
//! │                     └─────────┬─────────┘              │               │
//! │                close()        │        delete()        │               │
//! │               ┌───────────────┴───────────────┐        │               │
//! │               ▼                               ▼        │               │
//! │     ┌──────────────────┐          ┌─────────────────────┴┐              │
//! │     │ CLOSED (data kept)│          │ CLOSED (files gone)  │              │
//! │     └──────────────────┘          └──────────────────────┘              │
//! │                                                                         │
//! │  Only the sync engine deletes the database; every other caller uses    │
//! │  record-level operations.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases use SQLite WAL mode with NORMAL synchronous. Deleting a
//! database removes the `-wal` and `-shm` side files too.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{OptionRepository, TypedRepository};
use startdeck_core::{Link, Note, SearchEngine, DATABASE_NAME};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/startdeck.db").max_connections(4);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file. `None` means in-memory.
    pub database_path: Option<PathBuf>,

    /// Logical database name written into snapshots.
    pub name: String,

    /// Maximum number of connections in the pool.
    /// Default: 4
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps connections.
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Whether to run migrations on open.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// ## Arguments
    /// * `path` - Path to the SQLite database file. Will be created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: Some(path.into()),
            name: DATABASE_NAME.to_string(),
            max_connections: 4,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the logical database name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets whether to run migrations on open.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// A single connection that is never reaped holds the data; deleting the
    /// database drops it and the next `open()` starts empty.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: None,
            name: DATABASE_NAME.to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    /// True for in-memory configurations.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.is_none()
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle.
///
/// The pool lives behind a lock because the sync engine replaces the whole
/// database (delete, then open) while other handles keep the same
/// `Database`. Every operation fetches the current pool and fails with
/// [`DbError::Closed`] between `close()` and `open()`.
#[derive(Debug)]
pub struct Database {
    config: DbConfig,
    pool: RwLock<Option<SqlitePool>>,
}

impl Database {
    /// Creates the handle and opens the database.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::new("./startdeck.db")).await?;
    /// ```
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let db = Database::closed(config);
        db.open().await?;
        Ok(db)
    }

    /// Creates the handle without opening it.
    pub fn closed(config: DbConfig) -> Self {
        Database {
            config,
            pool: RwLock::new(None),
        }
    }

    /// The configuration this database was created with.
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Logical database name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Opens the pool (creating the file if needed) and runs migrations.
    ///
    /// Opening an already open database is a no-op.
    pub async fn open(&self) -> DbResult<()> {
        let mut guard = self.pool.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let location = self.location();
        info!(path = %location, "Opening database");

        let connect_options = match &self.config.database_path {
            Some(path) => SqliteConnectOptions::new()
                .filename(path)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .create_if_missing(true),
            None => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(self.config.max_connections)
            .min_connections(self.config.min_connections)
            .acquire_timeout(self.config.connect_timeout)
            .idle_timeout(self.config.idle_timeout);
        if self.config.is_in_memory() {
            pool_options = pool_options.max_lifetime(None::<Duration>);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = self.config.max_connections,
            "Database pool created"
        );

        if self.config.run_migrations {
            migrations::run_migrations(&pool).await?;
        }

        *guard = Some(pool);
        Ok(())
    }

    /// Closes the pool. The data stays on disk.
    pub async fn close(&self) {
        let pool = self.pool.write().await.take();
        if let Some(pool) = pool {
            info!(path = %self.location(), "Closing database");
            pool.close().await;
        }
    }

    /// True while the pool is open.
    pub async fn is_open(&self) -> bool {
        self.pool.read().await.is_some()
    }

    /// Closes the database and removes its files.
    ///
    /// For an in-memory database this discards all data.
    pub async fn delete(&self) -> DbResult<()> {
        self.close().await;

        let Some(path) = &self.config.database_path else {
            info!("In-memory database discarded");
            return Ok(());
        };

        for file in database_files(path) {
            match tokio::fs::remove_file(&file).await {
                Ok(()) => debug!(file = %file.display(), "Removed database file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "Failed to remove database file");
                    return Err(e.into());
                }
            }
        }

        info!(path = %path.display(), "Database deleted");
        Ok(())
    }

    /// Returns a handle to the current pool.
    ///
    /// ## Errors
    /// [`DbError::Closed`] when the database is not open.
    pub async fn pool(&self) -> DbResult<SqlitePool> {
        self.pool.read().await.clone().ok_or(DbError::Closed)
    }

    /// Runs pending migrations on the open database.
    pub async fn run_migrations(&self) -> DbResult<()> {
        let pool = self.pool().await?;
        migrations::run_migrations(&pool).await
    }

    /// Schema version of the open database.
    pub async fn schema_version(&self) -> DbResult<i64> {
        let pool = self.pool().await?;
        migrations::schema_version(&pool).await
    }

    /// Returns the link repository.
    pub fn links(&self) -> TypedRepository<'_, Link> {
        TypedRepository::new(self)
    }

    /// Returns the note repository.
    pub fn notes(&self) -> TypedRepository<'_, Note> {
        TypedRepository::new(self)
    }

    /// Returns the search engine repository.
    pub fn search_engines(&self) -> TypedRepository<'_, SearchEngine> {
        TypedRepository::new(self)
    }

    /// Returns the option repository.
    pub fn options(&self) -> OptionRepository<'_> {
        OptionRepository::new(self)
    }

    fn location(&self) -> String {
        match &self.config.database_path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }
}

/// The main file plus the WAL side files.
fn database_files(path: &Path) -> Vec<PathBuf> {
    let base = path.as_os_str().to_owned();
    let mut files = vec![path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut side = base.clone();
        side.push(suffix);
        files.push(PathBuf::from(side));
    }
    files
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use startdeck_core::tables;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.is_open().await);
        assert_eq!(db.schema_version().await.unwrap(), migrations::latest_version());
    }

    #[tokio::test]
    async fn test_close_then_reopen_in_memory_keeps_nothing_after_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.put(tables::OPTION, "theme", &json!("dark")).await.unwrap();

        db.delete().await.unwrap();
        assert!(!db.is_open().await);
        assert!(matches!(db.get(tables::OPTION, "theme").await, Err(DbError::Closed)));

        db.open().await.unwrap();
        assert_eq!(db.get(tables::OPTION, "theme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_database_delete_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("startdeck.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.put(tables::OPTION, "theme", &json!("dark")).await.unwrap();
        db.close().await;
        assert!(path.exists());

        db.open().await.unwrap();
        assert_eq!(
            db.get(tables::OPTION, "theme").await.unwrap(),
            Some(json!("dark"))
        );

        db.delete().await.unwrap();
        assert!(!path.exists());

        db.open().await.unwrap();
        assert_eq!(db.get(tables::OPTION, "theme").await.unwrap(), None);
    }

    #[test]
    fn test_database_files() {
        let files = database_files(Path::new("/tmp/a.db"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("/tmp/a.db"),
                PathBuf::from("/tmp/a.db-wal"),
                PathBuf::from("/tmp/a.db-shm"),
            ]
        );
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db").max_connections(10).name("other");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.name, "other");
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
