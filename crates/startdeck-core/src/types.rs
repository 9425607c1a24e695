//! # Domain Types
//!
//! Record types stored in the local database and the registry of tables.
//!
//! ## Table Registry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Local Tables                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌────────────┐  │
//! │  │    link      │  │    note      │  │   search     │  │  option    │  │
//! │  │  Link (UUID) │  │  Note (UUID) │  │ SearchEngine │  │ key → JSON │  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └────────────┘  │
//! │         synced            synced            synced       synced with    │
//! │                                                          redaction      │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐                                     │
//! │  │    cache     │  │    icon      │   ephemeral: derived data, never    │
//! │  │  UI caches   │  │ favicon blobs│   part of a snapshot                │
//! │  └──────────────┘  └──────────────┘                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every record is stored as JSON under a string key; the typed records below
//! implement [`Record`] so repositories can be written once.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

// =============================================================================
// Table Registry
// =============================================================================

/// Table names.
pub mod tables {
    pub const LINK: &str = "link";
    pub const NOTE: &str = "note";
    pub const SEARCH: &str = "search";
    pub const OPTION: &str = "option";
    pub const CACHE: &str = "cache";
    pub const ICON: &str = "icon";
}

/// Static description of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    /// Table name.
    pub name: &'static str,
    /// Index description written into snapshots (informational).
    pub schema: &'static str,
    /// Derived data that is never exported.
    pub ephemeral: bool,
}

/// Every table of the local database, in export order.
pub const TABLES: &[TableDef] = &[
    TableDef {
        name: tables::LINK,
        schema: "id,title,url,position",
        ephemeral: false,
    },
    TableDef {
        name: tables::NOTE,
        schema: "id,title,updatedAt",
        ephemeral: false,
    },
    TableDef {
        name: tables::SEARCH,
        schema: "id,name",
        ephemeral: false,
    },
    TableDef {
        name: tables::OPTION,
        schema: "key",
        ephemeral: false,
    },
    TableDef {
        name: tables::CACHE,
        schema: "key",
        ephemeral: true,
    },
    TableDef {
        name: tables::ICON,
        schema: "host",
        ephemeral: true,
    },
];

/// Looks up a table definition by name.
pub fn table_def(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().find(|t| t.name == name)
}

/// Names of the tables excluded from every snapshot.
pub fn ephemeral_tables() -> Vec<&'static str> {
    TABLES
        .iter()
        .filter(|t| t.ephemeral)
        .map(|t| t.name)
        .collect()
}

// =============================================================================
// Record Trait
// =============================================================================

/// A typed record stored in one table under a string key.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Table the record lives in.
    const TABLE: &'static str;

    /// Primary key of the record.
    fn key(&self) -> &str;
}

// =============================================================================
// Link
// =============================================================================

/// A bookmark shown on the start page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display title.
    pub title: String,

    /// Target URL.
    pub url: String,

    /// Custom icon URL; the favicon cache is used when absent.
    #[serde(default)]
    pub icon: Option<String>,

    /// Sort position on the page.
    #[serde(default)]
    pub position: i64,

    /// When the link was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Creates a new link with a fresh id.
    pub fn new(title: impl Into<String>, url: impl Into<String>, position: i64) -> Self {
        Link {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            url: url.into(),
            icon: None,
            position,
            created_at: Utc::now(),
        }
    }
}

impl Record for Link {
    const TABLE: &'static str = tables::LINK;

    fn key(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Note
// =============================================================================

/// A sticky note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Optional heading.
    #[serde(default)]
    pub title: String,

    /// Note body.
    pub content: String,

    /// Background colour name.
    #[serde(default = "default_note_color")]
    pub color: String,

    /// Last edit time.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

fn default_note_color() -> String {
    "yellow".to_string()
}

impl Note {
    /// Creates a new note with a fresh id.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Note {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            color: default_note_color(),
            updated_at: Utc::now(),
        }
    }

    /// Replaces the body and bumps the edit time.
    pub fn edit(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.updated_at = Utc::now();
    }
}

impl Record for Note {
    const TABLE: &'static str = tables::NOTE;

    fn key(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Search Engine
// =============================================================================

/// A search shortcut; `%s` in the template is replaced by the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SearchEngine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// URL template containing `%s`.
    pub url_template: String,
}

impl Record for SearchEngine {
    const TABLE: &'static str = tables::SEARCH;

    fn key(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Wait Type
// =============================================================================

/// Which sync operation currently holds the engine lock.
///
/// Serialized as `""`, `"pull"` or `"push"` for the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaitType {
    /// No operation in flight.
    #[default]
    #[serde(rename = "")]
    Idle,
    /// A pull is applying remote data.
    #[serde(rename = "pull")]
    Pull,
    /// A push is uploading local data.
    #[serde(rename = "push")]
    Push,
}

impl WaitType {
    /// Returns the wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitType::Idle => "",
            WaitType::Pull => "pull",
            WaitType::Push => "push",
        }
    }
}

impl std::fmt::Display for WaitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
