//! WebDAV client and engine tests against an in-process server.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use startdeck_core::options::keys;
use startdeck_core::Link;
use startdeck_db::{Database, DbConfig};
use startdeck_sync::{
    AppConfig, ApplyOutcome, Credentials, NoOpChannel, OptionStore, PullOutcome, PushOutcome,
    RemoteState, RemoteStore, SyncEngine, SyncEngineBuilder, SyncError, WebDavClient,
};

/// `alice:secret`
const AUTHORIZATION: &str = "Basic YWxpY2U6c2VjcmV0";

// =============================================================================
// Fake Server
// =============================================================================

/// Just enough WebDAV: files and collections under `/dav`.
#[derive(Default)]
struct FakeDav {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    requests: Vec<(String, String)>,
}

type Shared = Arc<Mutex<FakeDav>>;

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

async fn handle(
    State(dav): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == AUTHORIZATION);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let path = uri.path().trim_end_matches('/').to_string();
    let mut dav = dav.lock().unwrap();
    dav.requests.push((method.to_string(), uri.path().to_string()));

    match method.as_str() {
        "GET" => match dav.files.get(&path) {
            Some(content) => (StatusCode::OK, content.clone()).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        "PUT" => {
            if !dav.dirs.contains(parent(&path)) {
                return StatusCode::CONFLICT.into_response();
            }
            dav.files.insert(path, body.to_vec());
            StatusCode::CREATED.into_response()
        }
        "DELETE" => match dav.files.remove(&path) {
            Some(_) => StatusCode::NO_CONTENT.into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        "MKCOL" => {
            if dav.dirs.contains(&path) {
                return StatusCode::METHOD_NOT_ALLOWED.into_response();
            }
            if !dav.dirs.contains(parent(&path)) {
                return StatusCode::CONFLICT.into_response();
            }
            dav.dirs.insert(path);
            StatusCode::CREATED.into_response()
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn serve() -> (String, Shared) {
    let dav: Shared = Arc::default();
    dav.lock().unwrap().dirs.insert("/dav".to_string());

    let app = Router::new().fallback(handle).with_state(dav.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/dav/", addr), dav)
}

fn credentials(url: &str, directory: &str) -> Credentials {
    Credentials::new(url, "alice", "secret", directory)
}

fn requests(dav: &Shared) -> Vec<(String, String)> {
    dav.lock().unwrap().requests.clone()
}

async fn device(url: &str, directory: &str) -> (Arc<Database>, Arc<SyncEngine>) {
    let db = Arc::new(Database::new(DbConfig::in_memory()).await.unwrap());
    let options = OptionStore::load(db.clone(), Arc::new(NoOpChannel))
        .await
        .unwrap();
    for (key, value) in [
        (keys::WEBDAV_URL, url),
        (keys::WEBDAV_USERNAME, "alice"),
        (keys::WEBDAV_PASSWORD, "secret"),
        (keys::WEBDAV_DIRECTORY, directory),
    ] {
        options.set_item(key, json!(value), false).await.unwrap();
    }

    let engine = SyncEngineBuilder::new(AppConfig::default())
        .with_database(db.clone())
        .with_options(options)
        .build()
        .unwrap();
    (db, engine)
}

// =============================================================================
// Client
// =============================================================================

#[tokio::test]
async fn test_client_file_lifecycle() {
    let (url, dav) = serve().await;
    let client = WebDavClient::new(&credentials(&url, "sync"), Duration::from_secs(5)).unwrap();

    assert_eq!(client.read("sync/a.txt").await.unwrap(), None);

    client.create_dir_all("sync").await.unwrap();
    client.create_dir_all("sync").await.unwrap();
    client.write("sync/a.txt", b"hello".to_vec()).await.unwrap();
    assert_eq!(
        client.read("sync/a.txt").await.unwrap(),
        Some(b"hello".to_vec())
    );

    client.delete("sync/a.txt").await.unwrap();
    client.delete("sync/a.txt").await.unwrap();
    assert_eq!(client.read("sync/a.txt").await.unwrap(), None);

    assert!(requests(&dav).contains(&("MKCOL".to_string(), "/dav/sync/".to_string())));
}

#[tokio::test]
async fn test_client_creates_nested_directories() {
    let (url, dav) = serve().await;
    let client = WebDavClient::new(&credentials(&url, "a/b/c"), Duration::from_secs(5)).unwrap();

    client.create_dir_all("a/b/c").await.unwrap();

    let mkcols: Vec<String> = requests(&dav)
        .into_iter()
        .filter(|(method, _)| method == "MKCOL")
        .map(|(_, path)| path)
        .collect();
    assert_eq!(mkcols, vec!["/dav/a/", "/dav/a/b/", "/dav/a/b/c/"]);
}

#[tokio::test]
async fn test_client_put_into_missing_directory_conflicts() {
    let (url, _dav) = serve().await;
    let client = WebDavClient::new(&credentials(&url, "x"), Duration::from_secs(5)).unwrap();

    let err = client.write("missing/a.txt", b"1".to_vec()).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_client_wrong_password() {
    let (url, _dav) = serve().await;
    let creds = Credentials::new(&url, "alice", "wrong", "sync");
    let client = WebDavClient::new(&creds, Duration::from_secs(5)).unwrap();

    let err = client.read("sync/a.txt").await.unwrap_err();
    assert!(matches!(err, SyncError::AuthFailed { status: 401 }));
    assert!(err.is_config_error());
}

#[tokio::test]
async fn test_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/dav/", listener.local_addr().unwrap());
    drop(listener);

    let client = WebDavClient::new(&credentials(&url, "x"), Duration::from_secs(5)).unwrap();
    let err = client.read("x/a.txt").await.unwrap_err();
    assert!(err.is_retryable());
}

// =============================================================================
// Engine over WebDAV
// =============================================================================

#[tokio::test]
async fn test_connection_test_over_webdav() {
    let (url, dav) = serve().await;
    let (_db, engine) = device(&url, "startdeck").await;

    assert_eq!(
        engine.test(&credentials(&url, "startdeck")).await.unwrap(),
        RemoteState::Empty
    );
    assert!(dav.lock().unwrap().dirs.contains("/dav/startdeck"));
    assert!(dav.lock().unwrap().files.is_empty());

    let bad = Credentials::new(&url, "alice", "nope", "startdeck");
    let err = engine.test(&bad).await.unwrap_err();
    assert!(matches!(err, SyncError::AuthFailed { .. }));
}

#[tokio::test]
async fn test_push_creates_missing_directory() {
    let (url, dav) = serve().await;
    let (db, engine) = device(&url, "apps/startdeck").await;
    db.links()
        .put(&Link::new("Docs", "https://docs.example.com", 0))
        .await
        .unwrap();
    engine
        .options()
        .set_item(keys::LOCAL_VERSION, json!(3), false)
        .await
        .unwrap();

    assert!(matches!(
        engine.init().await,
        PullOutcome::PushedLocal(PushOutcome::Pushed { version: 3 })
    ));

    let log = requests(&dav);
    let put = |path: &str| ("PUT".to_string(), path.to_string());
    let data = "/dav/apps/startdeck/startdeck-data.json";
    let first = log.iter().position(|r| *r == put(data)).unwrap();
    let last = log.iter().rposition(|r| *r == put(data)).unwrap();
    assert!(first < last);
    assert!(log[first..last].contains(&("MKCOL".to_string(), "/dav/apps/".to_string())));
    assert!(log[first..last]
        .contains(&("MKCOL".to_string(), "/dav/apps/startdeck/".to_string())));

    let marker = log
        .iter()
        .position(|r| *r == put("/dav/apps/startdeck/startdeck-version.txt"))
        .unwrap();
    assert!(marker > last);
    assert_eq!(
        dav.lock()
            .unwrap()
            .files
            .get("/dav/apps/startdeck/startdeck-version.txt")
            .cloned(),
        Some(b"3".to_vec())
    );
    engine.shutdown().await;
}

#[tokio::test]
async fn test_two_devices_over_webdav() {
    let (url, _dav) = serve().await;

    let (db_a, engine_a) = device(&url, "startdeck").await;
    let link = Link::new("Shared", "https://shared.example.com", 0);
    db_a.links().put(&link).await.unwrap();
    engine_a
        .options()
        .set_item(keys::LOCAL_VERSION, json!(7), false)
        .await
        .unwrap();
    assert!(matches!(
        engine_a.init().await,
        PullOutcome::PushedLocal(PushOutcome::Pushed { version: 7 })
    ));

    let (db_b, engine_b) = device(&url, "startdeck").await;
    assert_eq!(
        engine_b.init().await,
        PullOutcome::Applied(ApplyOutcome::Applied { version: 7 })
    );
    assert_eq!(db_b.links().list().await.unwrap(), vec![link]);
    assert_eq!(
        engine_b.options().local_version_text().await.as_deref(),
        Some("7")
    );

    assert_eq!(engine_a.pull().await, PullOutcome::UpToDate { version: 7 });

    engine_a.shutdown().await;
    engine_b.shutdown().await;
}
