//! # Snapshot Export / Import
//!
//! Whole-database export to a single snapshot document and the destructive
//! import used by the sync engine and local restore.
//!
//! ## Export
//! ```text
//! for table in TABLES (registry order)
//!     skip? ──yes──► next
//!       │no
//!       ▼
//!     SELECT key, value ... ORDER BY rowid
//!       │
//!       ▼
//!     transform(table, key, value) ──► row
//!       │
//!       ▼
//!     snapshot.push_table(table, schema, rows)
//! ```
//!
//! ## Import
//! ```text
//! parse ──► name check ──► version check ──► table check     (nothing written yet)
//!                                                │
//!                  ┌─────────────────────────────┴─────────────┐
//!                  ▼                                           ▼
//!       one transaction (default)             one transaction per table
//!       clear + insert every table            (no_transaction: partial
//!       all or nothing                         imports stay committed)
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use startdeck_core::snapshot::{DatabaseSnapshot, SnapshotRow, TableRows};
use startdeck_core::types::TABLES;
use startdeck_core::SnapshotError;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::records::{clear, ensure_table, upsert};

// =============================================================================
// Options
// =============================================================================

/// Per-row export hook: `(table, key, value) -> (key, value)`.
pub type RowTransform = Arc<dyn Fn(&str, String, Value) -> (String, Value) + Send + Sync>;

/// Import progress hook, called after each table.
pub type ProgressCallback = Arc<dyn Fn(&ImportProgress) + Send + Sync>;

/// Export settings.
#[derive(Clone, Default)]
pub struct ExportOptions {
    /// Indent the JSON output.
    pub pretty_json: bool,
    /// Tables left out of the snapshot.
    pub skip_tables: Vec<String>,
    /// Optional per-row transform.
    pub transform: Option<RowTransform>,
}

impl ExportOptions {
    /// Pretty output, skipping the given tables.
    pub fn pretty(skip_tables: &[&str]) -> Self {
        ExportOptions {
            pretty_json: true,
            skip_tables: skip_tables.iter().map(|t| t.to_string()).collect(),
            transform: None,
        }
    }

    /// Sets the per-row transform.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str, String, Value) -> (String, Value) + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }
}

impl fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportOptions")
            .field("pretty_json", &self.pretty_json)
            .field("skip_tables", &self.skip_tables)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Import settings.
#[derive(Clone, Default)]
pub struct ImportOptions {
    /// Commit each table separately instead of one transaction.
    pub no_transaction: bool,
    /// Remove existing rows of each imported table first.
    pub clear_tables: bool,
    /// Accept a snapshot whose schema version differs from the local one.
    pub accept_version_diff: bool,
    /// Optional progress hook.
    pub progress: Option<ProgressCallback>,
}

impl ImportOptions {
    /// Full destructive replace, tolerating schema differences.
    pub fn replace() -> Self {
        ImportOptions {
            no_transaction: false,
            clear_tables: true,
            accept_version_diff: true,
            progress: None,
        }
    }

    /// Sets the progress hook.
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(&ImportProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(progress));
        self
    }
}

impl fmt::Debug for ImportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportOptions")
            .field("no_transaction", &self.no_transaction)
            .field("clear_tables", &self.clear_tables)
            .field("accept_version_diff", &self.accept_version_diff)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Progress report passed to [`ImportOptions::progress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportProgress {
    pub table: String,
    pub completed_tables: usize,
    pub total_tables: usize,
    pub completed_rows: usize,
    pub total_rows: usize,
}

/// What an import wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub tables: usize,
    pub rows: usize,
    /// Schema version declared by the snapshot.
    pub snapshot_version: i64,
}

// =============================================================================
// Export / Import
// =============================================================================

impl Database {
    /// Builds a snapshot of every table not skipped.
    pub async fn export_snapshot(&self, options: &ExportOptions) -> DbResult<DatabaseSnapshot> {
        let version = self.schema_version().await?;
        let mut snapshot = DatabaseSnapshot::new(self.name(), version);

        for def in TABLES {
            if options.skip_tables.iter().any(|t| t == def.name) {
                continue;
            }

            let rows = self
                .list(def.name)
                .await?
                .into_iter()
                .map(|(key, value)| {
                    let (key, value) = match &options.transform {
                        Some(transform) => transform(def.name, key, value),
                        None => (key, value),
                    };
                    SnapshotRow { key, value }
                })
                .collect();

            snapshot.push_table(def.name, def.schema, rows);
        }

        debug!(
            tables = snapshot.table_count(),
            rows = snapshot.row_count(),
            "Database exported"
        );
        Ok(snapshot)
    }

    /// Exports the database as snapshot bytes.
    pub async fn export(&self, options: &ExportOptions) -> DbResult<Vec<u8>> {
        let snapshot = self.export_snapshot(options).await?;
        Ok(snapshot.to_bytes(options.pretty_json)?)
    }

    /// Imports snapshot bytes.
    ///
    /// ## Errors
    /// - [`DbError::Serialization`] for bytes that are not a snapshot
    /// - [`DbError::Snapshot`] when the snapshot names another database
    /// - [`DbError::VersionMismatch`] unless `accept_version_diff` is set
    /// - [`DbError::UnknownTable`] for tables outside the registry
    ///
    /// All of these are raised before anything is written.
    pub async fn import(&self, bytes: &[u8], options: &ImportOptions) -> DbResult<ImportSummary> {
        let snapshot: DatabaseSnapshot = serde_json::from_slice(bytes)?;
        self.import_snapshot(&snapshot, options).await
    }

    /// Imports an already parsed snapshot.
    pub async fn import_snapshot(
        &self,
        snapshot: &DatabaseSnapshot,
        options: &ImportOptions,
    ) -> DbResult<ImportSummary> {
        let declared_name = &snapshot.data.database_name;
        if !declared_name.is_empty() && declared_name != self.name() {
            return Err(SnapshotError::NameMismatch {
                expected: self.name().to_string(),
                found: declared_name.clone(),
            }
            .into());
        }

        let local_version = self.schema_version().await?;
        let snapshot_version = snapshot.data.database_version;
        if !options.accept_version_diff && snapshot_version != local_version {
            return Err(DbError::VersionMismatch {
                snapshot: snapshot_version,
                local: local_version,
            });
        }

        for set in &snapshot.data.data {
            ensure_table(&set.table_name)?;
        }

        let pool = self.pool().await?;
        let total_tables = snapshot.data.data.len();
        let total_rows = snapshot.row_count();
        let mut completed_rows = 0;

        if options.no_transaction {
            for (index, set) in snapshot.data.data.iter().enumerate() {
                let mut tx = pool
                    .begin()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                completed_rows += write_table(&mut tx, set, options.clear_tables).await?;
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                report(options, set, index, total_tables, completed_rows, total_rows);
            }
        } else {
            let mut tx = pool
                .begin()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            for (index, set) in snapshot.data.data.iter().enumerate() {
                completed_rows += write_table(&mut tx, set, options.clear_tables).await?;
                report(options, set, index, total_tables, completed_rows, total_rows);
            }
            tx.commit()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        }

        info!(
            tables = total_tables,
            rows = completed_rows,
            snapshot_version,
            local_version,
            "Snapshot imported"
        );

        Ok(ImportSummary {
            tables: total_tables,
            rows: completed_rows,
            snapshot_version,
        })
    }
}

async fn write_table(
    conn: &mut sqlx::SqliteConnection,
    set: &TableRows,
    clear_first: bool,
) -> DbResult<usize> {
    if clear_first {
        clear(&mut *conn, &set.table_name).await?;
    }
    for row in &set.rows {
        upsert(&mut *conn, &set.table_name, &row.key, &row.value).await?;
    }
    Ok(set.rows.len())
}

fn report(
    options: &ImportOptions,
    set: &TableRows,
    index: usize,
    total_tables: usize,
    completed_rows: usize,
    total_rows: usize,
) {
    if let Some(progress) = &options.progress {
        progress(&ImportProgress {
            table: set.table_name.clone(),
            completed_tables: index + 1,
            total_tables,
            completed_rows,
            total_rows,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use serde_json::json;
    use startdeck_core::tables;
    use std::sync::Mutex;

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.put(tables::LINK, "l1", &json!({"title": "a"})).await.unwrap();
        db.put(tables::OPTION, "wallpaperType", &json!("file")).await.unwrap();
        db.put(tables::CACHE, "weather", &json!({"t": 20})).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_export_skips_and_transforms() {
        let db = seeded().await;
        let options = ExportOptions::pretty(&[tables::CACHE]).with_transform(|table, key, value| {
            if table == tables::OPTION {
                (key, json!("none"))
            } else {
                (key, value)
            }
        });

        let snapshot = db.export_snapshot(&options).await.unwrap();
        assert!(snapshot.table(tables::CACHE).is_none());
        assert_eq!(snapshot.table(tables::OPTION).unwrap().rows[0].value, json!("none"));
        assert_eq!(snapshot.data.database_name, "startdeck");

        let bytes = db.export(&options).await.unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains('\n'));
    }

    #[tokio::test]
    async fn test_import_replaces_tables() {
        let source = seeded().await;
        let bytes = source.export(&ExportOptions::default()).await.unwrap();

        let target = Database::new(DbConfig::in_memory()).await.unwrap();
        target.put(tables::LINK, "old", &json!({})).await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let options = ImportOptions::replace()
            .with_progress(move |p| sink.lock().unwrap().push(p.completed_tables));

        let summary = target.import(&bytes, &options).await.unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(target.get(tables::LINK, "old").await.unwrap(), None);
        assert_eq!(
            target.get(tables::CACHE, "weather").await.unwrap(),
            Some(json!({"t": 20}))
        );
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_import_rejects_before_writing() {
        let db = seeded().await;

        let mut foreign = DatabaseSnapshot::new("other", 1);
        foreign.push_table(tables::LINK, "", vec![]);
        let err = db
            .import_snapshot(&foreign, &ImportOptions::replace())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Snapshot(SnapshotError::NameMismatch { .. })));

        let mut unknown = DatabaseSnapshot::new("startdeck", 1);
        unknown.push_table(tables::LINK, "", vec![]);
        unknown.push_table("bogus", "", vec![]);
        let err = db
            .import_snapshot(&unknown, &ImportOptions::replace())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UnknownTable(_)));

        let mut newer = DatabaseSnapshot::new("startdeck", 99);
        newer.push_table(tables::LINK, "", vec![]);
        let err = db
            .import_snapshot(&newer, &ImportOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::VersionMismatch { snapshot: 99, .. }));

        assert_eq!(db.count(tables::LINK).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_import_garbage() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(matches!(
            db.import(b"nope", &ImportOptions::replace()).await,
            Err(DbError::Serialization(_))
        ));
    }
}
