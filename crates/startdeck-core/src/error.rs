//! # Error Types
//!
//! Domain-specific error types for startdeck-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  startdeck-core errors (this file)                                     │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  ├── SnapshotError    - Rejected snapshots (never touch local data)    │
//! │  └── VersionError     - Unrecoverable version markers                  │
//! │                                                                         │
//! │  startdeck-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  startdeck-sync errors (separate crate)                                │
//! │  └── SyncError        - Transport, consistency, configuration          │
//! │                                                                         │
//! │  Flow: SnapshotError → SyncError → SyncNotice → UI notification        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Link cannot be found.
    #[error("Link not found: {0}")]
    LinkNotFound(String),

    /// Note cannot be found.
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// Table is not part of the schema.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Snapshot rejected.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Version marker rejected.
    #[error("Version error: {0}")]
    Version(#[from] VersionError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before anything is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., URL without scheme).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Numeric value outside its range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Snapshot Error
// =============================================================================

/// Reasons an incoming (or freshly imported) snapshot is rejected.
///
/// ## When This Occurs
/// Every variant is raised *before* the local database is deleted, so a
/// rejected snapshot never wipes local data.
///
/// ```text
/// remote body ──► Empty? ──► JSON? ──► envelope? ──► name? ──► tables?
///                   │          │          │            │          │
///                   ▼          ▼          ▼            ▼          ▼
///                 Empty    Malformed  MissingEnvelope NameMismatch NoTables
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The body is empty or whitespace only.
    #[error("snapshot is empty")]
    Empty,

    /// The body is not a snapshot document.
    #[error("snapshot is malformed: {0}")]
    Malformed(String),

    /// The `data` envelope is missing.
    #[error("snapshot has no data envelope")]
    MissingEnvelope,

    /// The snapshot belongs to another database.
    #[error("snapshot belongs to database '{found}', expected '{expected}'")]
    NameMismatch { expected: String, found: String },

    /// The snapshot declares a table list with no tables.
    #[error("snapshot declares zero tables")]
    NoTables,

    /// The snapshot carries no row sets at all.
    #[error("snapshot contains no table data")]
    NoData,

    /// A declared table has no row set or a different number of rows.
    #[error("table '{table}' declares {declared} rows but carries {found}")]
    RowCountMismatch {
        table: String,
        declared: u64,
        found: u64,
    },

    /// A row set names a table this database does not have.
    #[error("snapshot contains unknown table '{0}'")]
    UnknownTable(String),
}

// =============================================================================
// Version Error
// =============================================================================

/// A version marker that cannot be turned into a number.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// No integer and no digit run could be found.
    #[error("version '{raw}' is not a number")]
    NotANumber { raw: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SnapshotError::NameMismatch {
            expected: "startdeck".to_string(),
            found: "other".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "snapshot belongs to database 'other', expected 'startdeck'"
        );

        let err = VersionError::NotANumber { raw: "abc".into() };
        assert_eq!(err.to_string(), "version 'abc' is not a number");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "url".to_string(),
        };
        assert_eq!(err.to_string(), "url is required");
    }

    #[test]
    fn test_conversions_into_core_error() {
        let core_err: CoreError = SnapshotError::NoTables.into();
        assert!(matches!(core_err, CoreError::Snapshot(SnapshotError::NoTables)));

        let core_err: CoreError = ValidationError::Required {
            field: "title".into(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
