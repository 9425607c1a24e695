//! # StartDeck CLI
//!
//! Command-line host for the StartDeck storage and sync crates.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Application Startup                                │
//! │                                                                         │
//! │  1. Initialize tracing (stderr)                                         │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  2. Load AppConfig (defaults ◄── startdeck.toml ◄── environment)        │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  3. Open database, load stores, configure the sync engine               │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  4. Run the command                                                     │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  5. Flush a pending push, close the database                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//! ```text
//! lib.rs
//! ├── commands/   (sync, link, note, data)
//! ├── error.rs    (CliError with code + message)
//! └── state.rs    (AppState: database, stores, engine)
//! ```

pub mod commands;
pub mod error;
pub mod state;

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::data::DataCommand;
use commands::link::LinkCommand;
use commands::note::NoteCommand;
use commands::sync::SyncCommand;
use commands::Output;
use error::CliResult;
use state::AppState;
use startdeck_sync::AppConfig;

/// StartDeck: links, notes and settings with WebDAV sync.
#[derive(Debug, Parser)]
#[command(name = "startdeck", version, about)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "STARTDECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// WebDAV synchronization
    #[command(subcommand)]
    Sync(SyncCommand),
    /// Start page links
    #[command(subcommand)]
    Link(LinkCommand),
    /// Sticky notes
    #[command(subcommand)]
    Note(NoteCommand),
    /// Snapshot export and import
    #[command(subcommand)]
    Data(DataCommand),
}

/// Runs one invocation end to end.
pub async fn run(cli: Cli) -> CliResult<()> {
    init_tracing();

    let config = AppConfig::load(cli.config)?;
    let state = AppState::open(config).await?;

    let mut stdout = std::io::stdout().lock();
    let result = {
        let mut out = Output::new(&mut stdout, cli.json);
        execute(&state, cli.command, &mut out).await
    };
    stdout.flush()?;

    state.finish().await;
    result
}

/// Dispatches a parsed command against an open state.
pub async fn execute(state: &AppState, command: Command, out: &mut Output<'_>) -> CliResult<()> {
    match command {
        Command::Sync(cmd) => commands::sync::run(state, cmd, out).await,
        Command::Link(cmd) => commands::link::run(state, cmd, out).await,
        Command::Note(cmd) => commands::note::run(state, cmd, out).await,
        Command::Data(cmd) => commands::data::run(state, cmd, out).await,
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so `--json` output stays parseable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=startdeck_sync=trace` - Trace the sync engine only
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,startdeck=info,sqlx=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
