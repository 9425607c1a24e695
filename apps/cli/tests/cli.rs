//! Command dispatch against an in-memory database and remote.

use clap::Parser;
use serde_json::Value;
use std::sync::Arc;

use startdeck_cli::commands::Output;
use startdeck_cli::error::ErrorCode;
use startdeck_cli::state::AppState;
use startdeck_cli::{execute, Cli};
use startdeck_db::{Database, DbConfig};
use startdeck_sync::{AppConfig, MemoryConnector, MemoryRemote};

const VERSION: &str = "startdeck/startdeck-version.txt";

async fn state(remote: Arc<MemoryRemote>) -> AppState {
    let db = Arc::new(Database::new(DbConfig::in_memory()).await.unwrap());
    AppState::with_database(AppConfig::default(), db, Arc::new(MemoryConnector::new(remote)))
        .await
        .unwrap()
}

/// Parses `args` and runs the command, returning stdout or the error.
async fn run(state: &AppState, args: &[&str]) -> Result<String, startdeck_cli::error::CliError> {
    let cli = Cli::try_parse_from(std::iter::once("startdeck").chain(args.iter().copied())).unwrap();
    let mut buf = Vec::new();
    let result = {
        let mut out = Output::new(&mut buf, cli.json);
        execute(state, cli.command, &mut out).await
    };
    result.map(|()| String::from_utf8(buf).unwrap())
}

async fn run_json(state: &AppState, args: &[&str]) -> Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    serde_json::from_str(&run(state, &full).await.unwrap()).unwrap()
}

const CONFIGURE: &[&str] = &[
    "sync",
    "configure",
    "--url",
    "https://dav.example.com/dav/",
    "--username",
    "alice",
    "--password",
    "secret",
    "--directory",
    "startdeck",
    "--interval",
    "1",
];

#[tokio::test]
async fn test_link_add_list_remove() {
    let state = state(MemoryRemote::new()).await;

    let added = run_json(&state, &["link", "add", "Docs", "https://docs.rs"]).await;
    assert_eq!(added["title"], "Docs");
    let id = added["id"].as_str().unwrap().to_string();

    let listed = run_json(&state, &["link", "list"]).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let text = run(&state, &["link", "remove", &id]).await.unwrap();
    assert!(text.contains(&id));

    let err = run(&state, &["link", "remove", &id]).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_invalid_link_is_validation_error() {
    let state = state(MemoryRemote::new()).await;
    let err = run(&state, &["link", "add", "Docs", "not a url"]).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_note_with_color() {
    let state = state(MemoryRemote::new()).await;

    let note = run_json(&state, &["note", "add", "buy milk", "--color", "blue"]).await;
    assert_eq!(note["color"], "blue");
    assert_eq!(note["content"], "buy milk");

    let text = run(&state, &["note", "list"]).await.unwrap();
    assert!(text.contains("[blue]  buy milk"));
}

#[tokio::test]
async fn test_sync_commands_need_configuration() {
    let state = state(MemoryRemote::new()).await;

    let text = run(&state, &["sync", "status"]).await.unwrap();
    assert_eq!(text.trim(), "Sync: not configured");

    let err = run(&state, &["sync", "push"]).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotConfigured);

    let err = run(&state, &["sync", "test"]).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_configure_pushes_to_empty_remote() {
    let remote = MemoryRemote::new();
    let state = state(remote.clone()).await;

    let result = run_json(&state, CONFIGURE).await;
    assert_eq!(result["result"], "pushed");
    assert!(remote.file(VERSION).await.is_some());

    let status = run_json(&state, &["sync", "status"]).await;
    assert_eq!(status["configured"], true);
    assert_eq!(status["intervalSecs"], 1);
    assert!(status.get("password").is_none());

    run(&state, &["sync", "disconnect"]).await.unwrap();
    let text = run(&state, &["sync", "status"]).await.unwrap();
    assert_eq!(text.trim(), "Sync: not configured");

    state.finish().await;
}

#[tokio::test]
async fn test_configure_against_existing_data_needs_confirmation() {
    let remote = MemoryRemote::new();

    let first = state(remote.clone()).await;
    run(&first, CONFIGURE).await.unwrap();
    run(&first, &["link", "add", "Docs", "https://docs.rs"]).await.unwrap();
    first.finish().await;
    assert_eq!(remote.file_text(VERSION).await.as_deref(), Some("1"));

    let second = state(remote.clone()).await;
    let err = run(&second, CONFIGURE).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfirmationRequired);
    assert!(second.links.list().await.is_empty());

    let mut confirmed = CONFIGURE.to_vec();
    confirmed.push("--yes");
    let result = run_json(&second, &confirmed).await;
    assert_eq!(result["result"], "pulled");
    assert_eq!(result["version"], 1);

    let links = second.links.list().await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].title, "Docs");
    second.finish().await;
}

#[tokio::test]
async fn test_export_then_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.json");
    let path = path.to_str().unwrap();

    let source = state(MemoryRemote::new()).await;
    run(&source, &["link", "add", "Docs", "https://docs.rs"]).await.unwrap();
    run(&source, &["note", "add", "hello"]).await.unwrap();
    let exported = run_json(&source, &["data", "export", path]).await;
    assert!(exported["bytes"].as_u64().unwrap() > 0);

    let target = state(MemoryRemote::new()).await;
    let summary = run_json(&target, &["data", "import", path]).await;
    assert!(summary["rows"].as_u64().unwrap() >= 2);

    let links = run_json(&target, &["link", "list"]).await;
    assert_eq!(links[0]["title"], "Docs");
}

#[tokio::test]
async fn test_import_missing_file_is_io_error() {
    let state = state(MemoryRemote::new()).await;
    let err = run(&state, &["data", "import", "/nonexistent/startdeck.json"])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::IoError);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["startdeck", "note", "list", "--json"]).unwrap();
    assert!(cli.json);
}
