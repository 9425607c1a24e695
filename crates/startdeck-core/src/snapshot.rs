//! # Snapshot Format
//!
//! The snapshot is the single document exchanged with the remote store and
//! used for local backups: every exported table with its rows, wrapped in a
//! small envelope naming the database and its schema version.
//!
//! ## Document Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {                                                                      │
//! │    "formatName": "startdeck",                                           │
//! │    "formatVersion": 1,                                                  │
//! │    "data": {                          ◄── envelope (required)           │
//! │      "databaseName": "startdeck",     ◄── must match when present       │
//! │      "databaseVersion": 1,            ◄── schema version of the export  │
//! │      "tables": [ {name, schema, rowCount}, ... ]  ◄── optional (legacy) │
//! │      "data":   [ {tableName, rows: [{key, value}]}, ... ]               │
//! │    }                                                                    │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Validation Modes
//!
//! Both modes require at least one row set, and every declared table must
//! carry a row set holding exactly its declared `rowCount`.
//!
//! - [`SnapshotMode::Strict`] guards an incoming remote snapshot. Row sets
//!   must name registered tables. A document without a table list is only
//!   accepted in the narrow legacy shape: a non-empty `data.data` array whose
//!   entries each carry a string `tableName` and an array of `rows`.
//! - [`SnapshotMode::Lenient`] checks the freshly imported database. A
//!   missing table list is tolerated.
//!
//! Validation works on the raw JSON value before typed deserialization so
//! that every rejection maps to a specific [`SnapshotError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SnapshotError;
use crate::types::table_def;

/// Format name written into every snapshot.
pub const FORMAT_NAME: &str = "startdeck";

/// Current snapshot format version.
pub const FORMAT_VERSION: u32 = 1;

// =============================================================================
// Document Types
// =============================================================================

/// A complete snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSnapshot {
    #[serde(default)]
    pub format_name: String,

    #[serde(default)]
    pub format_version: u32,

    /// The envelope.
    pub data: SnapshotData,
}

/// Envelope holding the database identity and the table contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    /// Name of the exported database.
    #[serde(default)]
    pub database_name: String,

    /// Schema version of the exported database.
    #[serde(default)]
    pub database_version: i64,

    /// Declared tables. Absent in legacy snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableInfo>>,

    /// Row sets in export order.
    #[serde(default)]
    pub data: Vec<TableRows>,
}

/// Declared table entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub name: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub row_count: u64,
}

/// All rows of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRows {
    pub table_name: String,
    pub rows: Vec<SnapshotRow>,
}

/// One stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub key: String,
    pub value: Value,
}

impl DatabaseSnapshot {
    /// Creates an empty snapshot for the named database.
    pub fn new(database_name: impl Into<String>, database_version: i64) -> Self {
        DatabaseSnapshot {
            format_name: FORMAT_NAME.to_string(),
            format_version: FORMAT_VERSION,
            data: SnapshotData {
                database_name: database_name.into(),
                database_version,
                tables: Some(Vec::new()),
                data: Vec::new(),
            },
        }
    }

    /// Appends a table together with its declaration.
    pub fn push_table(&mut self, name: &str, schema: &str, rows: Vec<SnapshotRow>) {
        self.data
            .tables
            .get_or_insert_with(Vec::new)
            .push(TableInfo {
                name: name.to_string(),
                schema: schema.to_string(),
                row_count: rows.len() as u64,
            });
        self.data.data.push(TableRows {
            table_name: name.to_string(),
            rows,
        });
    }

    /// Number of row sets carried by the snapshot.
    pub fn table_count(&self) -> usize {
        self.data.data.len()
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.data.data.iter().map(|t| t.rows.len()).sum()
    }

    /// True when the snapshot carries no row sets at all.
    pub fn is_empty(&self) -> bool {
        self.data.data.is_empty()
    }

    /// Rows of one table, if present.
    pub fn table(&self, name: &str) -> Option<&TableRows> {
        self.data.data.iter().find(|t| t.table_name == name)
    }

    /// Serializes the snapshot.
    pub fn to_bytes(&self, pretty: bool) -> Result<Vec<u8>, serde_json::Error> {
        if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// How strictly a snapshot is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotMode {
    /// Incoming remote data, checked before anything local is deleted.
    Strict,
    /// Re-export of freshly imported data.
    Lenient,
}

/// Which accepted shape a snapshot had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotShape {
    /// Table list present.
    Full,
    /// No table list; row sets only. Callers log a warning.
    Legacy,
}

/// Validates raw snapshot bytes and returns the typed document.
///
/// ## Errors
/// Every failure is a [`SnapshotError`]; see the module docs for the rules.
///
/// ## Example
/// ```rust
/// use startdeck_core::snapshot::{validate_snapshot, SnapshotMode};
/// use startdeck_core::SnapshotError;
///
/// let err = validate_snapshot(br#"{"data":{"tables":{}}}"#, "startdeck", SnapshotMode::Strict)
///     .unwrap_err();
/// assert_eq!(err, SnapshotError::NoTables);
/// ```
pub fn validate_snapshot(
    bytes: &[u8],
    expected_name: &str,
    mode: SnapshotMode,
) -> Result<(DatabaseSnapshot, SnapshotShape), SnapshotError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(SnapshotError::Empty);
    }

    let root: Value =
        serde_json::from_slice(bytes).map_err(|e| SnapshotError::Malformed(e.to_string()))?;
    let root_obj = root
        .as_object()
        .ok_or_else(|| SnapshotError::Malformed("document is not an object".to_string()))?;

    let envelope = match root_obj.get("data") {
        Some(Value::Object(obj)) => obj,
        Some(Value::Null) | None => return Err(SnapshotError::MissingEnvelope),
        Some(_) => {
            return Err(SnapshotError::Malformed(
                "data envelope is not an object".to_string(),
            ))
        }
    };

    match envelope.get("databaseName") {
        None | Some(Value::Null) => {}
        Some(Value::String(found)) if found == expected_name => {}
        Some(Value::String(found)) => {
            return Err(SnapshotError::NameMismatch {
                expected: expected_name.to_string(),
                found: found.clone(),
            })
        }
        Some(_) => {
            return Err(SnapshotError::Malformed(
                "databaseName is not a string".to_string(),
            ))
        }
    }

    let shape = match envelope.get("tables") {
        None | Some(Value::Null) => SnapshotShape::Legacy,
        Some(Value::Array(tables)) if tables.is_empty() => return Err(SnapshotError::NoTables),
        Some(Value::Object(tables)) if tables.is_empty() => return Err(SnapshotError::NoTables),
        Some(_) => SnapshotShape::Full,
    };

    let row_sets = envelope.get("data");
    let has_row_sets = matches!(row_sets, Some(Value::Array(sets)) if !sets.is_empty());
    if !has_row_sets {
        return Err(SnapshotError::NoData);
    }

    if shape == SnapshotShape::Legacy {
        check_legacy_row_sets(row_sets)?;
    }

    let snapshot: DatabaseSnapshot =
        serde_json::from_value(root).map_err(|e| SnapshotError::Malformed(e.to_string()))?;

    check_row_counts(&snapshot)?;
    if mode == SnapshotMode::Strict {
        if let Some(set) = snapshot
            .data
            .data
            .iter()
            .find(|set| table_def(&set.table_name).is_none())
        {
            return Err(SnapshotError::UnknownTable(set.table_name.clone()));
        }
    }

    Ok((snapshot, shape))
}

/// Every declared table must come with exactly its declared rows.
fn check_row_counts(snapshot: &DatabaseSnapshot) -> Result<(), SnapshotError> {
    let Some(declared) = &snapshot.data.tables else {
        return Ok(());
    };

    for info in declared {
        match snapshot.table(&info.name) {
            Some(set) if set.rows.len() as u64 == info.row_count => {}
            set => {
                return Err(SnapshotError::RowCountMismatch {
                    table: info.name.clone(),
                    declared: info.row_count,
                    found: set.map_or(0, |set| set.rows.len() as u64),
                })
            }
        }
    }

    Ok(())
}

/// Legacy documents must consist of well-formed row sets only.
fn check_legacy_row_sets(row_sets: Option<&Value>) -> Result<(), SnapshotError> {
    let Some(Value::Array(sets)) = row_sets else {
        return Err(SnapshotError::NoData);
    };

    for (index, set) in sets.iter().enumerate() {
        let well_formed = set.get("tableName").is_some_and(Value::is_string)
            && set.get("rows").is_some_and(Value::is_array);
        if !well_formed {
            return Err(SnapshotError::Malformed(format!(
                "legacy row set {} needs a tableName and rows",
                index
            )));
        }
    }

    Ok(())
}
