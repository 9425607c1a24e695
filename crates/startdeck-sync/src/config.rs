//! # Application Configuration
//!
//! Process-level settings for the StartDeck backend. The WebDAV connection
//! itself (URL, credentials, directory, interval) is user data and lives in
//! the option table, so it syncs with everything else; this file only holds
//! what is specific to one installation.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STARTDECK_DB_PATH=/data/startdeck.db                               │
//! │     STARTDECK_FILE_PREFIX=startdeck                                    │
//! │     STARTDECK_REQUEST_TIMEOUT=30                                       │
//! │     STARTDECK_SYNC_INTERVAL=10                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/startdeck/startdeck.toml (Linux)                         │
//! │     ~/Library/Application Support/app.startdeck.startdeck/ (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/home/me/.local/share/startdeck/startdeck.db"
//!
//! [remote]
//! file_prefix = "startdeck"
//! request_timeout_secs = 30
//! create_directories = true
//!
//! [sync]
//! default_interval_secs = 10
//! database_name = "startdeck"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use startdeck_core::{DATABASE_NAME, DEFAULT_FILE_PREFIX, DEFAULT_SYNC_INTERVAL_SECS};

// =============================================================================
// Database Settings
// =============================================================================

/// Where the local database lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Remote Settings
// =============================================================================

/// WebDAV transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Prefix of the remote files: `<prefix>-data.json`, `<prefix>-version.txt`.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Create the remote directory (MKCOL) when it is missing.
    #[serde(default = "default_true")]
    pub create_directories: bool,
}

fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            file_prefix: default_file_prefix(),
            request_timeout_secs: default_request_timeout(),
            create_directories: default_true(),
        }
    }
}

impl RemoteSettings {
    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// Engine Settings
// =============================================================================

/// Sync engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Debounce period used when the option table has no interval.
    #[serde(default = "default_interval")]
    pub default_interval_secs: u64,

    /// Expected database name of incoming snapshots.
    #[serde(default = "default_database_name")]
    pub database_name: String,
}

fn default_interval() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

fn default_database_name() -> String {
    DATABASE_NAME.to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            default_interval_secs: default_interval(),
            database_name: default_database_name(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Local database settings.
    #[serde(default)]
    pub database: DatabaseSettings,

    /// WebDAV transport settings.
    #[serde(default)]
    pub remote: RemoteSettings,

    /// Sync engine settings.
    #[serde(default)]
    pub sync: EngineSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (startdeck.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let prefix = &self.remote.file_prefix;
        if prefix.is_empty() || prefix.contains('/') {
            return Err(SyncError::InvalidConfig(format!(
                "file_prefix must be a non-empty file name, got: '{}'",
                prefix
            )));
        }

        if self.remote.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        startdeck_core::validation::validate_interval(self.sync.default_interval_secs)
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        if self.sync.database_name.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "database_name must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("STARTDECK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(prefix) = lookup("STARTDECK_FILE_PREFIX") {
            self.remote.file_prefix = prefix;
        }

        if let Some(timeout) = lookup("STARTDECK_REQUEST_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.remote.request_timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid STARTDECK_REQUEST_TIMEOUT"),
            }
        }

        if let Some(interval) = lookup("STARTDECK_SYNC_INTERVAL") {
            match interval.parse::<u64>() {
                Ok(secs) => self.sync.default_interval_secs = secs,
                Err(_) => warn!(value = %interval, "Ignoring invalid STARTDECK_SYNC_INTERVAL"),
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("app", "startdeck", "startdeck")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("startdeck.toml"))
    }

    /// Database file: the configured path or the platform data directory.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database
            .path
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join("startdeck.db")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.remote.file_prefix, "startdeck");
        assert_eq!(config.sync.default_interval_secs, DEFAULT_SYNC_INTERVAL_SECS);
        assert!(config.remote.create_directories);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.remote.file_prefix = "a/b".into();
        assert!(config.validate().is_err());

        config.remote.file_prefix = "deck".into();
        config.sync.default_interval_secs = 0;
        assert!(config.validate().is_err());

        config.sync.default_interval_secs = 5;
        config.remote.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("STARTDECK_DB_PATH", "/tmp/deck.db"),
            ("STARTDECK_FILE_PREFIX", "deck"),
            ("STARTDECK_SYNC_INTERVAL", "not-a-number"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/deck.db")));
        assert_eq!(config.remote.file_prefix, "deck");
        assert_eq!(config.sync.default_interval_secs, DEFAULT_SYNC_INTERVAL_SECS);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("[remote]\nfile_prefix = \"deck\"\n").unwrap();
        assert_eq!(config.remote.file_prefix, "deck");
        assert_eq!(config.remote.request_timeout_secs, 30);
        assert_eq!(config.sync.database_name, "startdeck");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("startdeck.toml");

        let mut config = AppConfig::default();
        config.remote.request_timeout_secs = 12;
        config.save(Some(path.clone())).unwrap();

        let loaded = AppConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.remote.request_timeout_secs, 12);
    }
}
