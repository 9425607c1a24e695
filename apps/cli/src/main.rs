//! # StartDeck Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         startdeck (binary)                              │
//! │                                                                         │
//! │  main.rs ────► parses arguments, runs the command, sets the exit code  │
//! │                                                                         │
//! │  lib.rs ─────► logging, state bootstrap, command dispatch              │
//! │                                                                         │
//! │  commands/ ──► sync, link, note, data                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::process::ExitCode;

use startdeck_cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match startdeck_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
