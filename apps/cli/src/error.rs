//! # CLI Error Type
//!
//! Unified error type for commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the CLI                                │
//! │                                                                         │
//! │  Command Function                                                       │
//! │  CliResult<()>                                                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Database Error? ─── DbError ──────────────┐                            │
//! │         │                                  │                            │
//! │         ▼                                  ▼                            │
//! │  Sync Error? ─────── SyncError ────────► CliError { code, message }     │
//! │         │                                  │                            │
//! │         ▼                                  ▼                            │
//! │  Success                          stderr + exit code 1                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use startdeck_core::ValidationError;
use startdeck_db::DbError;
use startdeck_sync::{SyncError, SyncNotice};

/// Error returned from commands.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct CliError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Sync settings missing or invalid
    NotConfigured,

    /// A pull or push did not complete
    SyncFailed,

    /// The command needs `--yes`
    ConfirmationRequired,

    /// File could not be read or written
    IoError,

    /// Internal error
    Internal,
}

/// Result type for commands.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn not_configured() -> Self {
        CliError::new(
            ErrorCode::NotConfigured,
            "Sync is not configured. Run `startdeck sync configure` first.",
        )
    }

    pub fn confirmation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ConfirmationRequired, message)
    }
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { table, key } => CliError::not_found(&table, &key),
            other => CliError::new(ErrorCode::DatabaseError, other.to_string()),
        }
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        let code = match &err {
            SyncError::RecordNotFound { .. } => ErrorCode::NotFound,
            SyncError::Validation(_) | SyncError::Snapshot(_) => ErrorCode::ValidationError,
            SyncError::Database(_) => ErrorCode::DatabaseError,
            e if e.is_config_error() => ErrorCode::NotConfigured,
            SyncError::Internal(_) => ErrorCode::Internal,
            _ => ErrorCode::SyncFailed,
        };
        CliError::new(code, err.to_string())
    }
}

impl From<SyncNotice> for CliError {
    fn from(notice: SyncNotice) -> Self {
        CliError::new(ErrorCode::SyncFailed, notice.message())
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::new(ErrorCode::ValidationError, err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::new(ErrorCode::Internal, err.to_string())
    }
}
