//! # startdeck-core: Pure Rules for StartDeck
//!
//! This crate holds every rule of the StartDeck data layer that can be
//! expressed without I/O: the record types stored in the local database, the
//! snapshot format exchanged with the remote store, the version counter
//! repair rules and the option redaction applied before a snapshot leaves
//! the device.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       StartDeck Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                New-tab UI (external collaborator)               │   │
//! │  │     Links ──► Notes ──► Search engines ──► Wallpaper ──► Sync   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              startdeck-sync (engine + stores)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ startdeck-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  version  │  │ snapshot  │  │  options  │  │   │
//! │  │   │   Link    │  │  parse /  │  │  format / │  │ redaction │  │   │
//! │  │   │   Note    │  │  repair   │  │ validation│  │ preserved │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                startdeck-db (Database Layer)                    │   │
//! │  │          SQLite record tables, export / import, migrations      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Record types and the table registry
//! - [`version`] - Version counter parsing and repair
//! - [`snapshot`] - Snapshot format and validation
//! - [`options`] - Option keys, redaction and sync settings
//! - [`validation`] - Input validation for records
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use startdeck_core::version::{parse_marker, VersionSource};
//!
//! let parsed = parse_marker("v12").unwrap();
//! assert_eq!(parsed.value, 12);
//! assert_eq!(parsed.source, VersionSource::Digits);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod options;
pub mod snapshot;
pub mod types;
pub mod validation;
pub mod version;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, SnapshotError, ValidationError, VersionError};
pub use snapshot::{DatabaseSnapshot, SnapshotMode, SnapshotShape};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Name of the local database, recorded in every snapshot.
///
/// An incoming snapshot that declares a different name is rejected before
/// anything local is touched.
pub const DATABASE_NAME: &str = "startdeck";

/// Default prefix for the remote sync files (`<prefix>-data.json`, ...).
pub const DEFAULT_FILE_PREFIX: &str = "startdeck";

/// Default quiet period before a debounced push fires, in seconds.
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 10;

/// Maximum length of a link title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of a note body.
pub const MAX_NOTE_LENGTH: usize = 20_000;
