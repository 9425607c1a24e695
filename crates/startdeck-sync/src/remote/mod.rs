//! # Remote Store
//!
//! The remote side of sync: a directory holding two files per database.
//!
//! ## Remote Layout
//! ```text
//! <server url>/<directory>/
//!   ├── <prefix>-data.json     full snapshot (redacted)
//!   ├── <prefix>-version.txt   decimal version marker
//!   └── <prefix>-init.text     write-access check, written and deleted by test()
//! ```
//!
//! The version marker is always written after the data file, so a reader
//! that sees a marker can trust the data next to it (unless the push was
//! interrupted between the two writes, see `SyncNotice::InconsistentRemote`).
//!
//! Implementations:
//! - [`WebDavClient`] - the real thing, over HTTP
//! - [`MemoryRemote`] - an in-process store used by tests and dry runs

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::SyncResult;
use startdeck_core::options::SyncSettings;

pub mod memory;
pub mod webdav;

pub use memory::{MemoryConnector, MemoryRemote, RemoteOp};
pub use webdav::{WebDavClient, WebDavConnector};

// =============================================================================
// Traits
// =============================================================================

/// File-level access to the remote directory.
///
/// Paths are relative to the server URL and use `/` separators.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads a file. `Ok(None)` when it does not exist.
    async fn read(&self, path: &str) -> SyncResult<Option<Vec<u8>>>;

    /// Creates or replaces a file.
    async fn write(&self, path: &str, body: Vec<u8>) -> SyncResult<()>;

    /// Deletes a file. Deleting a missing file succeeds.
    async fn delete(&self, path: &str) -> SyncResult<()>;

    /// Creates a directory and its parents. Existing directories are fine.
    async fn create_dir_all(&self, dir: &str) -> SyncResult<()>;
}

/// Builds a [`RemoteStore`] for a set of credentials.
pub trait RemoteConnector: Send + Sync {
    /// Creates a client. Does not touch the network.
    fn connect(&self, credentials: &Credentials) -> SyncResult<Arc<dyn RemoteStore>>;
}

// =============================================================================
// Credentials
// =============================================================================

/// WebDAV connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
    pub directory: String,
}

impl Credentials {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        directory: impl Into<String>,
    ) -> Self {
        Credentials {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            directory: directory.into(),
        }
    }
}

impl From<&SyncSettings> for Credentials {
    fn from(settings: &SyncSettings) -> Self {
        Credentials::new(
            settings.url.clone(),
            settings.username.clone(),
            settings.password.clone(),
            settings.directory.clone(),
        )
    }
}

// Keeps the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("directory", &self.directory)
            .finish()
    }
}

// =============================================================================
// Paths
// =============================================================================

/// File names inside the remote directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePaths {
    directory: String,
    prefix: String,
}

impl RemotePaths {
    pub fn new(directory: &str, prefix: &str) -> Self {
        RemotePaths {
            directory: directory.trim_matches('/').to_string(),
            prefix: prefix.to_string(),
        }
    }

    /// The directory, without leading or trailing slashes.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// `<dir>/<prefix>-data.json`
    pub fn data(&self) -> String {
        self.file("data.json")
    }

    /// `<dir>/<prefix>-version.txt`
    pub fn version(&self) -> String {
        self.file("version.txt")
    }

    /// `<dir>/<prefix>-init.text`
    pub fn init_marker(&self) -> String {
        self.file("init.text")
    }

    fn file(&self, suffix: &str) -> String {
        if self.directory.is_empty() {
            format!("{}-{}", self.prefix, suffix)
        } else {
            format!("{}/{}-{}", self.directory, self.prefix, suffix)
        }
    }
}

/// Outcome of a connection test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RemoteState {
    /// Reachable and writable, no version marker yet.
    Empty = 0,
    /// A version marker exists.
    HasData = 1,
}

impl RemoteState {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_paths() {
        let paths = RemotePaths::new("/startdeck/", "startdeck");
        assert_eq!(paths.directory(), "startdeck");
        assert_eq!(paths.data(), "startdeck/startdeck-data.json");
        assert_eq!(paths.version(), "startdeck/startdeck-version.txt");
        assert_eq!(paths.init_marker(), "startdeck/startdeck-init.text");

        let root = RemotePaths::new("", "deck");
        assert_eq!(root.version(), "deck-version.txt");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("https://dav.example", "alice", "hunter2", "deck");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_remote_state_codes() {
        assert_eq!(RemoteState::Empty.code(), 0);
        assert_eq!(RemoteState::HasData.code(), 1);
    }
}
