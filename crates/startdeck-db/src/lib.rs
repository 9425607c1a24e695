//! # startdeck-db: Local Database for StartDeck
//!
//! This crate is the embedded database the sync engine replicates: SQLite
//! through sqlx, holding every logical table as JSON records.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StartDeck Data Flow                              │
//! │                                                                         │
//! │  LinkStore / NoteStore / OptionStore / SyncEngine (startdeck-sync)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  startdeck-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌───────────────┐  ┌──────────────────┐  │   │
//! │  │   │   Database    │  │    records    │  │     transfer     │  │   │
//! │  │   │   (pool.rs)   │  │ get / put /   │  │ export / import  │  │   │
//! │  │   │ open / close  │  │ bulk_put /    │  │ skip + transform │  │   │
//! │  │   │ delete        │  │ delete / list │  │ progress hook    │  │   │
//! │  │   └───────────────┘  └───────────────┘  └──────────────────┘  │   │
//! │  │   ┌───────────────┐  ┌───────────────┐                        │   │
//! │  │   │ repositories  │  │  migrations   │                        │   │
//! │  │   │ typed/options │  │  (embedded)   │                        │   │
//! │  │   └───────────────┘  └───────────────┘                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite: records(table_name, key, value, updated_at)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Configuration and the open / close / delete lifecycle
//! - [`records`] - Keyed record primitives per named table
//! - [`transfer`] - Snapshot export and import
//! - [`repository`] - Typed repositories (links, notes, options)
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use startdeck_db::{Database, DbConfig, ExportOptions};
//!
//! let db = Database::new(DbConfig::new("startdeck.db")).await?;
//! db.links().put(&link).await?;
//! let bytes = db.export(&ExportOptions::pretty(&["cache", "icon"])).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod records;
pub mod repository;
pub mod transfer;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{OptionRepository, TypedRepository};
pub use transfer::{
    ExportOptions, ImportOptions, ImportProgress, ImportSummary, ProgressCallback, RowTransform,
};
