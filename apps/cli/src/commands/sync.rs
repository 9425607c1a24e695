//! # Sync Commands
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Commands                                    │
//! │                                                                         │
//! │  configure   - test, save the WebDAV settings, run a first sync        │
//! │  test        - check that the remote is reachable and writable         │
//! │  pull        - compare versions and sync in either direction           │
//! │  push        - upload the local data unconditionally                   │
//! │  status      - show connection, lock and version state                 │
//! │  disconnect  - forget the WebDAV settings                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::Output;
use crate::error::{CliError, CliResult, ErrorCode};
use crate::state::AppState;
use startdeck_core::options::{keys, SyncSettings};
use startdeck_core::validation::validate_interval;
use startdeck_sync::{
    ApplyOutcome, Credentials, EngineStatus, PullOutcome, PushOutcome, RemoteState, SkipReason,
};

#[derive(Debug, Subcommand)]
pub enum SyncCommand {
    /// Save WebDAV settings and run a first sync
    Configure(ConfigureArgs),
    /// Check that the WebDAV directory is reachable and writable
    Test(ConnectionArgs),
    /// Sync in whichever direction the version markers ask for
    Pull,
    /// Upload the local data now
    Push,
    /// Show the sync state
    Status,
    /// Forget the WebDAV settings
    Disconnect,
}

/// Connection flags; missing ones fall back to the stored settings.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// WebDAV server URL
    #[arg(long)]
    pub url: Option<String>,

    /// WebDAV user name
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// WebDAV password
    #[arg(long, env = "STARTDECK_WEBDAV_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Directory on the server that holds the sync files
    #[arg(long)]
    pub directory: Option<String>,
}

impl ConnectionArgs {
    fn resolve(&self, stored: &SyncSettings) -> CliResult<Credentials> {
        let pick = |flag: &Option<String>, stored: &str| {
            flag.clone().unwrap_or_else(|| stored.to_string())
        };
        let merged = SyncSettings {
            url: pick(&self.url, &stored.url),
            username: pick(&self.username, &stored.username),
            password: pick(&self.password, &stored.password),
            directory: pick(&self.directory, &stored.directory),
            interval_secs: stored.interval_secs,
        };
        merged.require_complete()?;
        Ok(Credentials::from(&merged))
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Seconds to wait after the last edit before pushing
    #[arg(long)]
    pub interval: Option<u64>,

    /// Continue when the remote already has data
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub async fn run(state: &AppState, command: SyncCommand, out: &mut Output<'_>) -> CliResult<()> {
    match command {
        SyncCommand::Configure(args) => configure(state, args, out).await,
        SyncCommand::Test(args) => test(state, args, out).await,
        SyncCommand::Pull => pull(state, out).await,
        SyncCommand::Push => push(state, out).await,
        SyncCommand::Status => status(state, out).await,
        SyncCommand::Disconnect => disconnect(state, out).await,
    }
}

// =============================================================================
// Connection
// =============================================================================

async fn configure(state: &AppState, args: ConfigureArgs, out: &mut Output<'_>) -> CliResult<()> {
    let stored = state.options.sync_settings().await;
    let credentials = args.connection.resolve(&stored)?;
    if let Some(interval) = args.interval {
        validate_interval(interval)?;
    }

    let remote = state.engine.test(&credentials).await?;
    if remote == RemoteState::HasData && !args.yes {
        return Err(CliError::confirmation(
            "The remote directory already has StartDeck data and a newer copy \
             replaces the local one. Re-run with --yes to continue.",
        ));
    }

    for (key, value) in [
        (keys::WEBDAV_URL, &credentials.url),
        (keys::WEBDAV_USERNAME, &credentials.username),
        (keys::WEBDAV_PASSWORD, &credentials.password),
        (keys::WEBDAV_DIRECTORY, &credentials.directory),
    ] {
        state.options.set_item(key, json!(value), true).await?;
    }
    if let Some(interval) = args.interval {
        state
            .options
            .set_item(keys::WEBDAV_INTERVAL, json!(interval), true)
            .await?;
    }
    info!(url = %credentials.url, directory = %credentials.directory, "Sync settings saved");

    state.engine.configure(&credentials).await?;
    let outcome = state.engine.init().await;
    report_pull(outcome, out)
}

async fn test(state: &AppState, args: ConnectionArgs, out: &mut Output<'_>) -> CliResult<()> {
    let stored = state.options.sync_settings().await;
    let credentials = args.resolve(&stored)?;

    let remote = state.engine.test(&credentials).await?;
    let text = match remote {
        RemoteState::Empty => "Connection OK; the remote directory is empty",
        RemoteState::HasData => "Connection OK; the remote directory already has data",
    };
    out.value(&json!({ "state": remote.code(), "message": text }), |_| {
        text.to_string()
    })
}

async fn disconnect(state: &AppState, out: &mut Output<'_>) -> CliResult<()> {
    state.engine.delete_remote_config().await?;
    out.message("Sync disconnected; local data was kept")
}

// =============================================================================
// Transfer
// =============================================================================

async fn pull(state: &AppState, out: &mut Output<'_>) -> CliResult<()> {
    let outcome = state.engine.init().await;
    report_pull(outcome, out)
}

async fn push(state: &AppState, out: &mut Output<'_>) -> CliResult<()> {
    let outcome = state.engine.push().await;
    report_push(outcome, out)
}

fn skipped(reason: SkipReason) -> CliError {
    match reason {
        SkipReason::NotConfigured => CliError::not_configured(),
        SkipReason::Locked => CliError::new(
            ErrorCode::SyncFailed,
            "Another sync operation is in progress",
        ),
    }
}

fn report_push(outcome: PushOutcome, out: &mut Output<'_>) -> CliResult<()> {
    match outcome {
        PushOutcome::Pushed { version } => out.value(
            &json!({ "result": "pushed", "version": version }),
            |_| format!("Pushed local data (version {})", version),
        ),
        PushOutcome::Skipped(reason) => Err(skipped(reason)),
        PushOutcome::Failed(notice) => Err(notice.into()),
    }
}

fn report_pull(outcome: PullOutcome, out: &mut Output<'_>) -> CliResult<()> {
    match outcome {
        PullOutcome::UpToDate { version } => out.value(
            &json!({ "result": "up-to-date", "version": version }),
            |_| format!("Already up to date (version {})", version),
        ),
        PullOutcome::PushedLocal(push) => report_push(push, out),
        PullOutcome::Applied(ApplyOutcome::Applied { version }) => out.value(
            &json!({ "result": "pulled", "version": version }),
            |_| format!("Pulled remote data (version {})", version),
        ),
        PullOutcome::Applied(ApplyOutcome::Skipped(reason)) | PullOutcome::Skipped(reason) => {
            Err(skipped(reason))
        }
        PullOutcome::Applied(
            ApplyOutcome::Rejected(notice)
            | ApplyOutcome::RolledBack(notice)
            | ApplyOutcome::Failed(notice),
        )
        | PullOutcome::Failed(notice) => Err(notice.into()),
    }
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView {
    url: String,
    username: String,
    directory: String,
    interval_secs: u64,
    #[serde(flatten)]
    engine: EngineStatus,
}

async fn status(state: &AppState, out: &mut Output<'_>) -> CliResult<()> {
    let settings = state.options.sync_settings().await;
    let view = StatusView {
        url: settings.url,
        username: settings.username,
        directory: settings.directory,
        interval_secs: settings.interval_secs,
        engine: state.engine.status().await,
    };

    out.value(&view, |v| {
        if !v.engine.configured {
            return "Sync: not configured".to_string();
        }
        let mut lines = vec![
            format!("Sync:      {}/{} as {}", v.url.trim_end_matches('/'), v.directory, v.username),
            format!("Interval:  {}s", v.interval_secs),
            format!(
                "Version:   {}",
                v.engine.local_version.as_deref().unwrap_or("none")
            ),
        ];
        if v.engine.locked {
            lines.push(format!("Busy:      {}", v.engine.wait_type));
        }
        if v.engine.push_pending {
            lines.push("Pending:   push".to_string());
        }
        lines.join("\n")
    })
}
