//! Snapshot export and import.
//!
//! `export` writes the same redacted snapshot that is uploaded on push;
//! `export --full` writes a local backup that keeps every table and value.
//! `import` replaces the tables present in the file and schedules a push.

use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use super::Output;
use crate::error::CliResult;
use crate::state::AppState;

#[derive(Debug, Subcommand)]
pub enum DataCommand {
    /// Write the local data to a JSON file
    Export {
        path: PathBuf,
        /// Keep cache tables and unredacted options
        #[arg(long)]
        full: bool,
    },
    /// Replace local data with a JSON snapshot
    Import { path: PathBuf },
}

pub async fn run(state: &AppState, command: DataCommand, out: &mut Output<'_>) -> CliResult<()> {
    match command {
        DataCommand::Export { path, full } => {
            let bytes = if full {
                state.engine.export_backup().await?
            } else {
                state.engine.export_snapshot().await?
            };
            tokio::fs::write(&path, &bytes).await?;
            info!(path = %path.display(), bytes = bytes.len(), full, "Snapshot exported");

            let shown = path.display().to_string();
            out.value(
                &json!({ "path": shown, "bytes": bytes.len() }),
                |_| format!("Exported {} bytes to {}", bytes.len(), shown),
            )
        }
        DataCommand::Import { path } => {
            let bytes = tokio::fs::read(&path).await?;
            let summary = state.engine.import_snapshot(&bytes).await?;
            out.value(
                &json!({
                    "tables": summary.tables,
                    "rows": summary.rows,
                    "snapshotVersion": summary.snapshot_version,
                }),
                |_| format!("Imported {} rows from {} tables", summary.rows, summary.tables),
            )
        }
    }
}
