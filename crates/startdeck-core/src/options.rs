//! # Option Rules
//!
//! Well-known keys of the `option` table, the redaction applied to them
//! before a snapshot leaves the device, and the sync connection settings.
//!
//! ```text
//!   option row ──► redact_row("option", key, value) ──► snapshot
//!
//!   wallpaperType     "file"   ──►  "none"
//!   wallpaperFile     <data>   ──►  ""
//!   anything else     value    ──►  value
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::types::tables;
use crate::DEFAULT_SYNC_INTERVAL_SECS;

/// Option keys.
pub mod keys {
    pub const WEBDAV_URL: &str = "webdavUrl";
    pub const WEBDAV_USERNAME: &str = "webdavUsername";
    pub const WEBDAV_PASSWORD: &str = "webdavPassword";
    pub const WEBDAV_DIRECTORY: &str = "webdavDirectory";
    pub const WEBDAV_INTERVAL: &str = "webdavInterval";

    /// The local version counter.
    pub const LOCAL_VERSION: &str = "localVersion";

    pub const WALLPAPER_TYPE: &str = "wallpaperType";
    pub const WALLPAPER_TYPE_DARK: &str = "wallpaperTypeDark";
    pub const WALLPAPER_FILE: &str = "wallpaperFile";
    pub const WALLPAPER_FILE_DARK: &str = "wallpaperFileDark";
}

/// Wallpaper type marking an uploaded local file.
pub const WALLPAPER_TYPE_FILE: &str = "file";

/// Neutral wallpaper type written in place of [`WALLPAPER_TYPE_FILE`].
pub const WALLPAPER_TYPE_NONE: &str = "none";

const WALLPAPER_TYPE_KEYS: &[&str] = &[keys::WALLPAPER_TYPE, keys::WALLPAPER_TYPE_DARK];
const WALLPAPER_FILE_KEYS: &[&str] = &[keys::WALLPAPER_FILE, keys::WALLPAPER_FILE_DARK];

/// Local-only keys captured before a pull replaces the database.
///
/// All of them except [`keys::LOCAL_VERSION`] are written back afterwards;
/// the version is set to the pulled value instead.
pub const PRESERVED_LOCAL_KEYS: &[&str] = &[
    keys::WALLPAPER_TYPE,
    keys::WALLPAPER_TYPE_DARK,
    keys::WALLPAPER_FILE,
    keys::WALLPAPER_FILE_DARK,
    keys::LOCAL_VERSION,
];

/// The connection keys cleared when sync is disconnected.
pub const CONNECTION_KEYS: &[&str] = &[
    keys::WEBDAV_URL,
    keys::WEBDAV_USERNAME,
    keys::WEBDAV_PASSWORD,
    keys::WEBDAV_DIRECTORY,
];

// =============================================================================
// Redaction
// =============================================================================

/// Redacts one option value for export.
pub fn redact_option(key: &str, value: Value) -> Value {
    if WALLPAPER_FILE_KEYS.contains(&key) {
        return Value::String(String::new());
    }

    if WALLPAPER_TYPE_KEYS.contains(&key) && value.as_str() == Some(WALLPAPER_TYPE_FILE) {
        return Value::String(WALLPAPER_TYPE_NONE.to_string());
    }

    value
}

/// Export transform: redacts rows of the `option` table, passes others through.
pub fn redact_row(table: &str, key: String, value: Value) -> (String, Value) {
    let value = if table == tables::OPTION {
        redact_option(&key, value)
    } else {
        value
    };
    (key, value)
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Connection settings read from the option table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    pub directory: String,
    /// Debounce period in seconds.
    pub interval_secs: u64,
}

impl SyncSettings {
    /// Builds settings from an option lookup.
    ///
    /// Missing or non-string values read as empty; an unusable interval falls
    /// back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<Value>,
    {
        let text = |key: &str| match lookup(key) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };

        let interval_secs = match lookup(keys::WEBDAV_INTERVAL) {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS);

        SyncSettings {
            url: text(keys::WEBDAV_URL),
            username: text(keys::WEBDAV_USERNAME),
            password: text(keys::WEBDAV_PASSWORD),
            directory: text(keys::WEBDAV_DIRECTORY),
            interval_secs,
        }
    }

    /// True when every connection field is set.
    pub fn is_complete(&self) -> bool {
        self.missing_field().is_none()
    }

    /// The first connection field that is empty.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            (keys::WEBDAV_URL, &self.url),
            (keys::WEBDAV_USERNAME, &self.username),
            (keys::WEBDAV_PASSWORD, &self.password),
            (keys::WEBDAV_DIRECTORY, &self.directory),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
    }

    /// Fails with [`ValidationError::Required`] naming the first empty field.
    pub fn require_complete(&self) -> Result<(), ValidationError> {
        match self.missing_field() {
            Some(field) => Err(ValidationError::Required {
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }
}
