//! # Sync Error Types
//!
//! Error types for sync operations, and the notices shown to the user.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Validation          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  NotConfigured  │  │  NotFound (404) │  │  Snapshot               │ │
//! │  │  InvalidConfig  │  │  AuthFailed     │  │  EmptyExport            │ │
//! │  │  InvalidUrl     │  │  Http / Timeout │  │  Validation (input)     │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Consistency    │  │ Version format  │  │     Database            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Inconsistent-  │  │  InvalidVersion │  │  Database               │ │
//! │  │  Remote         │  │                 │  │  RecordNotFound         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `pull`, `push`, `apply_remote` and `update` never return these errors.
//! They turn them into a [`SyncNotice`], hand it to the event emitter and
//! return an outcome value instead.

use startdeck_core::{SnapshotError, ValidationError, VersionError};
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// No remote connection is configured.
    #[error("Sync is not configured")]
    NotConfigured,

    /// Invalid configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid server URL.
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The remote file does not exist (HTTP 404).
    #[error("Remote file not found: {path}")]
    NotFound { path: String },

    /// Credentials were rejected (HTTP 401 / 403).
    #[error("Authentication failed (HTTP {status})")]
    AuthFailed { status: u16 },

    /// Any other non-success HTTP status.
    #[error("{method} {path} failed with HTTP {status}")]
    Http {
        method: String,
        path: String,
        status: u16,
    },

    /// The server could not be reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// A snapshot was rejected.
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The local export produced nothing to upload.
    #[error("Local export is empty")]
    EmptyExport,

    /// User input was rejected.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Consistency Errors
    // =========================================================================
    /// The data file was written but the version marker was not.
    #[error("Uploaded data but failed to write the version marker: {0}")]
    InconsistentRemote(String),

    // =========================================================================
    // Version Errors
    // =========================================================================
    /// A remote version marker is not a number.
    #[error("Invalid version marker: {0}")]
    InvalidVersion(#[from] VersionError),

    // =========================================================================
    // Database Errors
    // =========================================================================
    /// Local database failure.
    #[error("Database error: {0}")]
    Database(String),

    /// A record addressed by id does not exist.
    #[error("{table} not found: {id}")]
    RecordNotFound { table: String, id: String },

    /// Failed to (de)serialize a value.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Another sync operation holds the engine lock.
    #[error("Another sync operation is in progress")]
    Locked,

    /// Internal sync engine error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<startdeck_db::DbError> for SyncError {
    fn from(err: startdeck_db::DbError) -> Self {
        match err {
            startdeck_db::DbError::Snapshot(e) => SyncError::Snapshot(e),
            other => SyncError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout(err.to_string())
        } else if err.is_builder() {
            SyncError::InvalidConfig(err.to_string())
        } else {
            SyncError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// True for a missing remote file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound { .. })
    }

    /// True when the server answered 409, i.e. a parent collection is missing.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SyncError::Http { status: 409, .. })
    }

    /// Returns true if this error is transient and a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_) => true,
            SyncError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::NotConfigured
                | SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::AuthFailed { .. }
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// User Notices
// =============================================================================

/// A failure reported to the user through the event emitter.
///
/// ## Severity
/// ```text
/// RestoreFailed / NoBackup   → local data may be broken, reload manually
/// Restored                   → pull failed, previous data is back
/// everything else            → nothing local changed, next sync retries
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    /// Reading the remote version marker failed.
    PullFailed(String),

    /// The remote version marker is not a number.
    InvalidRemoteVersion(String),

    /// The remote snapshot was rejected; local data is untouched.
    RemoteRejected(String),

    /// Applying the remote snapshot failed; the backup was restored.
    Restored { cause: String },

    /// Applying failed and restoring the backup failed too.
    RestoreFailed { cause: String, restore_error: String },

    /// Applying failed and no backup was available.
    NoBackup { cause: String },

    /// Export or data upload failed; the remote is unchanged.
    PushFailed(String),

    /// Data uploaded but the marker was not; the remote may be inconsistent.
    InconsistentRemote(String),

    /// Persisting the local version counter failed.
    UpdateFailed(String),

    /// The connection could not be established from the stored settings.
    ConnectFailed(String),
}

impl SyncNotice {
    /// Human-readable text for a notification.
    pub fn message(&self) -> String {
        match self {
            SyncNotice::PullFailed(e) => format!("Sync failed: could not read the remote version ({})", e),
            SyncNotice::InvalidRemoteVersion(e) => {
                format!("Sync failed: the remote version marker is invalid ({})", e)
            }
            SyncNotice::RemoteRejected(e) => {
                format!("Sync failed: remote data is invalid, local data was kept ({})", e)
            }
            SyncNotice::Restored { cause } => {
                format!("Sync failed, your previous data has been restored ({})", cause)
            }
            SyncNotice::RestoreFailed {
                cause,
                restore_error,
            } => format!(
                "Sync failed and restoring your data failed too ({}; restore: {}). Please reload manually.",
                cause, restore_error
            ),
            SyncNotice::NoBackup { cause } => format!(
                "Sync failed and no backup is available ({}). Please reload manually.",
                cause
            ),
            SyncNotice::PushFailed(e) => format!("Upload failed ({})", e),
            SyncNotice::InconsistentRemote(e) => format!(
                "Upload incomplete: the remote copy may be inconsistent until the next sync ({})",
                e
            ),
            SyncNotice::UpdateFailed(e) => format!("Could not record the change for sync ({})", e),
            SyncNotice::ConnectFailed(e) => format!("Could not connect to the sync server ({})", e),
        }
    }

    /// True when the user has to reload manually.
    pub fn requires_reload(&self) -> bool {
        matches!(
            self,
            SyncNotice::RestoreFailed { .. } | SyncNotice::NoBackup { .. }
        )
    }
}

impl std::fmt::Display for SyncNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}
