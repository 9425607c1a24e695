//! In-memory remote store.
//!
//! Keeps files in a map and records every call, so tests can assert on the
//! exact order of remote operations. Reads and writes of selected paths can
//! be made to fail.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{Credentials, RemoteConnector, RemoteStore};
use crate::error::{SyncError, SyncResult};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    Read(String),
    Write(String),
    Delete(String),
    CreateDir(String),
}

impl RemoteOp {
    /// True for calls that change the remote.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, RemoteOp::Read(_))
    }
}

#[derive(Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    ops: Vec<RemoteOp>,
    failing_reads: HashSet<String>,
    failing_writes: HashSet<String>,
}

/// A remote directory held in memory.
#[derive(Default)]
pub struct MemoryRemote {
    state: Mutex<State>,
}

impl MemoryRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seeds a file without recording an operation.
    pub async fn put_file(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.state
            .lock()
            .await
            .files
            .insert(path.to_string(), body.into());
    }

    /// Current content of a file.
    pub async fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().await.files.get(path).cloned()
    }

    /// Current content of a file as text.
    pub async fn file_text(&self, path: &str) -> Option<String> {
        self.file(path)
            .await
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// All recorded operations, oldest first.
    pub async fn ops(&self) -> Vec<RemoteOp> {
        self.state.lock().await.ops.clone()
    }

    pub async fn clear_ops(&self) {
        self.state.lock().await.ops.clear();
    }

    pub async fn has_dir(&self, dir: &str) -> bool {
        self.state.lock().await.dirs.contains(dir)
    }

    /// Makes reads of `path` fail with a connection error.
    pub async fn fail_reads(&self, path: &str) {
        self.state.lock().await.failing_reads.insert(path.to_string());
    }

    /// Makes writes of `path` fail with HTTP 500.
    pub async fn fail_writes(&self, path: &str) {
        self.state
            .lock()
            .await
            .failing_writes
            .insert(path.to_string());
    }

    /// Clears all injected failures.
    pub async fn heal(&self) {
        let mut state = self.state.lock().await;
        state.failing_reads.clear();
        state.failing_writes.clear();
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn read(&self, path: &str) -> SyncResult<Option<Vec<u8>>> {
        let mut state = self.state.lock().await;
        state.ops.push(RemoteOp::Read(path.to_string()));

        if state.failing_reads.contains(path) {
            return Err(SyncError::ConnectionFailed(format!("read of {} failed", path)));
        }

        Ok(state.files.get(path).cloned())
    }

    async fn write(&self, path: &str, body: Vec<u8>) -> SyncResult<()> {
        let mut state = self.state.lock().await;
        state.ops.push(RemoteOp::Write(path.to_string()));

        if state.failing_writes.contains(path) {
            return Err(SyncError::Http {
                method: "PUT".into(),
                path: path.to_string(),
                status: 500,
            });
        }

        state.files.insert(path.to_string(), body);
        Ok(())
    }

    async fn delete(&self, path: &str) -> SyncResult<()> {
        let mut state = self.state.lock().await;
        state.ops.push(RemoteOp::Delete(path.to_string()));
        state.files.remove(path);
        Ok(())
    }

    async fn create_dir_all(&self, dir: &str) -> SyncResult<()> {
        let mut state = self.state.lock().await;
        state.ops.push(RemoteOp::CreateDir(dir.to_string()));
        state.dirs.insert(dir.trim_matches('/').to_string());
        Ok(())
    }
}

/// Hands out the same [`MemoryRemote`] for any credentials.
pub struct MemoryConnector {
    remote: Arc<MemoryRemote>,
}

impl MemoryConnector {
    pub fn new(remote: Arc<MemoryRemote>) -> Self {
        MemoryConnector { remote }
    }
}

impl RemoteConnector for MemoryConnector {
    fn connect(&self, _credentials: &Credentials) -> SyncResult<Arc<dyn RemoteStore>> {
        let remote: Arc<dyn RemoteStore> = self.remote.clone();
        Ok(remote)
    }
}
