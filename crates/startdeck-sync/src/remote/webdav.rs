//! # WebDAV Client
//!
//! [`RemoteStore`] over plain WebDAV with HTTP basic auth.
//!
//! ## Status Mapping
//! ```text
//! ┌──────────┬───────────────────────────────────────────────────────────┐
//! │ Method   │ Response                                                  │
//! ├──────────┼───────────────────────────────────────────────────────────┤
//! │ GET      │ 2xx → bytes   404 → None                                  │
//! │ PUT      │ 2xx → ok      409 → parent collection missing            │
//! │ DELETE   │ 2xx → ok      404 → ok (already gone)                     │
//! │ MKCOL    │ 2xx → ok      405 → ok (already exists)                   │
//! │ any      │ 401/403 → AuthFailed    other → Http { status }           │
//! └──────────┴───────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use super::{Credentials, RemoteConnector, RemoteStore};
use crate::error::{SyncError, SyncResult};

/// WebDAV client bound to one server URL and one account.
pub struct WebDavClient {
    http: Client,
    base: Url,
    username: String,
    password: String,
}

impl WebDavClient {
    /// Creates a client. Only `http` and `https` URLs are accepted.
    pub fn new(credentials: &Credentials, timeout: Duration) -> SyncResult<Self> {
        let base = Url::parse(credentials.url.trim())?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SyncError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                base.scheme()
            )));
        }
        if base.cannot_be_a_base() {
            return Err(SyncError::InvalidUrl(credentials.url.clone()));
        }

        let http = Client::builder().timeout(timeout).build()?;

        Ok(WebDavClient {
            http,
            base,
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        })
    }

    /// Resolves a relative path against the server URL, one segment at a time.
    fn url_for(&self, path: &str, collection: bool) -> SyncResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SyncError::InvalidUrl(self.base.to_string()))?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if collection {
                segments.push("");
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        collection: bool,
        body: Option<Vec<u8>>,
    ) -> SyncResult<reqwest::Response> {
        let url = self.url_for(path, collection)?;
        trace!(%method, %url, "WebDAV request");

        let mut request = self
            .http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = body {
            request = request.body(body);
        }

        Ok(request.send().await?)
    }

    fn status_error(method: &Method, path: &str, status: StatusCode) -> SyncError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::AuthFailed {
                status: status.as_u16(),
            },
            StatusCode::NOT_FOUND => SyncError::NotFound {
                path: path.to_string(),
            },
            _ => SyncError::Http {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
            },
        }
    }

    fn mkcol() -> SyncResult<Method> {
        Method::from_bytes(b"MKCOL").map_err(|e| SyncError::Internal(e.to_string()))
    }

    async fn make_collection(&self, dir: &str) -> SyncResult<()> {
        let method = Self::mkcol()?;
        let response = self.send(method.clone(), dir, true, None).await?;
        let status = response.status();

        if status.is_success() || status == StatusCode::METHOD_NOT_ALLOWED {
            debug!(dir = %dir, status = status.as_u16(), "Collection ready");
            return Ok(());
        }

        Err(Self::status_error(&method, dir, status))
    }
}

#[async_trait]
impl RemoteStore for WebDavClient {
    async fn read(&self, path: &str) -> SyncResult<Option<Vec<u8>>> {
        let response = self.send(Method::GET, path, false, None).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::status_error(&Method::GET, path, status));
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }

    async fn write(&self, path: &str, body: Vec<u8>) -> SyncResult<()> {
        let response = self.send(Method::PUT, path, false, Some(body)).await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Self::status_error(&Method::PUT, path, status));
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> SyncResult<()> {
        let response = self.send(Method::DELETE, path, false, None).await?;
        let status = response.status();

        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(Self::status_error(&Method::DELETE, path, status))
    }

    async fn create_dir_all(&self, dir: &str) -> SyncResult<()> {
        let mut current = String::new();
        for segment in dir.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            self.make_collection(&current).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Connector
// =============================================================================

/// Creates [`WebDavClient`]s with a fixed request timeout.
pub struct WebDavConnector {
    timeout: Duration,
}

impl WebDavConnector {
    pub fn new(timeout: Duration) -> Self {
        WebDavConnector { timeout }
    }
}

impl RemoteConnector for WebDavConnector {
    fn connect(&self, credentials: &Credentials) -> SyncResult<Arc<dyn RemoteStore>> {
        let client: Arc<dyn RemoteStore> = Arc::new(WebDavClient::new(credentials, self.timeout)?);
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> SyncResult<WebDavClient> {
        WebDavClient::new(
            &Credentials::new(url, "alice", "secret", "deck"),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_url_joining() {
        let c = client("https://dav.example.com/remote.php/dav/files/alice/").unwrap();
        assert_eq!(
            c.url_for("deck/startdeck-data.json", false).unwrap().as_str(),
            "https://dav.example.com/remote.php/dav/files/alice/deck/startdeck-data.json"
        );
        assert_eq!(
            c.url_for("a/b", true).unwrap().as_str(),
            "https://dav.example.com/remote.php/dav/files/alice/a/b/"
        );

        let bare = client("http://localhost:8080").unwrap();
        assert_eq!(
            bare.url_for("x.txt", false).unwrap().as_str(),
            "http://localhost:8080/x.txt"
        );
    }

    #[test]
    fn test_segments_are_escaped() {
        let c = client("https://dav.example.com/").unwrap();
        assert_eq!(
            c.url_for("my deck/v.txt", false).unwrap().as_str(),
            "https://dav.example.com/my%20deck/v.txt"
        );
    }

    #[test]
    fn test_rejects_unsupported_urls() {
        assert!(matches!(client("ftp://dav.example.com"), Err(SyncError::InvalidUrl(_))));
        assert!(matches!(client("not a url"), Err(SyncError::InvalidUrl(_))));
        assert!(matches!(client("mailto:a@b"), Err(SyncError::InvalidUrl(_))));
    }

    #[test]
    fn test_status_mapping() {
        let err = WebDavClient::status_error(&Method::GET, "a", StatusCode::FORBIDDEN);
        assert!(matches!(err, SyncError::AuthFailed { status: 403 }));

        let err = WebDavClient::status_error(&Method::PUT, "a", StatusCode::CONFLICT);
        assert!(err.is_conflict());
    }
}
