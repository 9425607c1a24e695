//! # Validation Module
//!
//! Input validation for records and sync settings.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI / CLI argument parsing                                    │
//! │  └── Types, required arguments                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Stores (startdeck-sync)                                      │
//! │  └── THIS MODULE: record and connection rules                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL, primary key (table_name, key)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use startdeck_core::validation::{validate_link_url, validate_title};
//!
//! validate_title("Rust").unwrap();
//! validate_link_url("https://www.rust-lang.org").unwrap();
//! assert!(validate_link_url("not a url").is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{Link, Note};
use crate::{MAX_NOTE_LENGTH, MAX_TITLE_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Colours a note may use.
pub const NOTE_COLORS: &[&str] = &["yellow", "green", "blue", "pink", "purple", "gray"];

/// Longest accepted sync interval: one day.
pub const MAX_SYNC_INTERVAL_SECS: u64 = 86_400;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a link title.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_TITLE_LENGTH`] characters
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LENGTH,
        });
    }

    Ok(())
}

/// Splits `scheme://rest`, requiring a well-formed scheme and a non-empty rest.
fn split_scheme(url: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = url.split_once("://")?;
    let scheme_ok = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (scheme_ok && !rest.trim().is_empty()).then_some((scheme, rest))
}

/// Validates a bookmark target.
///
/// ## Rules
/// - Must not be empty
/// - Must look like `scheme://...` (any scheme; browsers accept many)
/// - Must not contain whitespace
///
/// ## Example
/// ```rust
/// use startdeck_core::validation::validate_link_url;
///
/// assert!(validate_link_url("chrome://settings").is_ok());
/// assert!(validate_link_url("example.com").is_err());
/// ```
pub fn validate_link_url(url: &str) -> ValidationResult<()> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::Required {
            field: "url".to_string(),
        });
    }

    if url.chars().any(char::is_whitespace) || split_scheme(url).is_none() {
        return Err(ValidationError::InvalidFormat {
            field: "url".to_string(),
            reason: "must be an absolute URL like https://example.com".to_string(),
        });
    }

    Ok(())
}

/// Validates a note body.
pub fn validate_note_content(content: &str) -> ValidationResult<()> {
    if content.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "content".to_string(),
        });
    }

    if content.chars().count() > MAX_NOTE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "content".to_string(),
            max: MAX_NOTE_LENGTH,
        });
    }

    Ok(())
}

/// Validates a note colour against [`NOTE_COLORS`].
pub fn validate_note_color(color: &str) -> ValidationResult<()> {
    if NOTE_COLORS.contains(&color) {
        Ok(())
    } else {
        Err(ValidationError::NotAllowed {
            field: "color".to_string(),
            allowed: NOTE_COLORS.iter().map(|c| c.to_string()).collect(),
        })
    }
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a link before it is stored.
pub fn validate_link(link: &Link) -> ValidationResult<()> {
    validate_title(&link.title)?;
    validate_link_url(&link.url)?;
    if let Some(icon) = &link.icon {
        validate_link_url(icon).map_err(|_| ValidationError::InvalidFormat {
            field: "icon".to_string(),
            reason: "must be an absolute URL".to_string(),
        })?;
    }
    Ok(())
}

/// Validates a note before it is stored.
pub fn validate_note(note: &Note) -> ValidationResult<()> {
    if note.title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LENGTH,
        });
    }
    validate_note_content(&note.content)?;
    validate_note_color(&note.color)
}

// =============================================================================
// Sync Settings Validators
// =============================================================================

/// Validates a WebDAV server URL.
///
/// ## Rules
/// - Scheme must be `http` or `https`
pub fn validate_webdav_url(url: &str) -> ValidationResult<()> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::Required {
            field: "url".to_string(),
        });
    }

    match split_scheme(url) {
        Some((scheme, _)) if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") => {
            Ok(())
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "url".to_string(),
            reason: "must start with http:// or https://".to_string(),
        }),
    }
}

/// Validates the remote directory.
///
/// ## Rules
/// - Must contain at least one path segment
/// - No `.` or `..` segments
pub fn validate_directory(directory: &str) -> ValidationResult<()> {
    let segments: Vec<&str> = directory.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return Err(ValidationError::Required {
            field: "directory".to_string(),
        });
    }

    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(ValidationError::InvalidFormat {
            field: "directory".to_string(),
            reason: "must not contain '.' or '..' segments".to_string(),
        });
    }

    Ok(())
}

/// Validates the push debounce interval in seconds.
pub fn validate_interval(secs: u64) -> ValidationResult<()> {
    if secs == 0 || secs > MAX_SYNC_INTERVAL_SECS {
        return Err(ValidationError::OutOfRange {
            field: "interval".to_string(),
            min: 1,
            max: MAX_SYNC_INTERVAL_SECS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
