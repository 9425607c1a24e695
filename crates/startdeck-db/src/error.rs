//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error) / bad snapshot bytes / file removal        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SyncError::Database (startdeck-sync) ← Reported as a SyncNotice       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CliError (apps/cli) ← Printed with an error code                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use startdeck_core::SnapshotError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Record not found in its table.
    #[error("{table} record not found: {key}")]
    NotFound { table: String, key: String },

    /// Table is not part of the schema.
    ///
    /// ## When This Occurs
    /// - A snapshot names a table this build does not know
    /// - A caller passes a misspelled table name
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// The database is closed (between `close()`/`delete()` and `open()`).
    #[error("Database is closed")]
    Closed,

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored value or a snapshot could not be (de)serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A snapshot was rejected during import.
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Snapshot schema version differs and the caller did not accept it.
    #[error("Snapshot schema version {snapshot} differs from local version {local}")]
    VersionMismatch { snapshot: i64, local: i64 },

    /// Removing the database files failed.
    #[error("File system error: {0}")]
    FileSystem(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a table and key.
    pub fn not_found(table: impl Into<String>, key: impl Into<String>) -> Self {
        DbError::NotFound {
            table: table.into(),
            key: key.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::Closed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::Closed,
            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::FileSystem(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
