//! # Version Counter Rules
//!
//! The version counter decides the sync direction: the remote marker file
//! holds the version of the last pushed snapshot, the option table holds the
//! local one. Both are plain text that may have been written by older
//! clients, so every read goes through the single fallback chain below.
//!
//! ## Fallback Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     parse_or_recover(raw, now)                          │
//! │                                                                         │
//! │  1. raw.trim() parses as an integer      ──► Exact      "42"  → 42      │
//! │  2. first run of ASCII digits in raw     ──► Digits     "v42" → 42      │
//! │  3. the current timestamp in millis      ──► Timestamp  "abc" → now     │
//! │                                                                         │
//! │  parse_marker(raw) stops after step 2 and returns an error instead,    │
//! │  because a remote marker must never be guessed.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter must never regress. [`next_version`] therefore falls back to a
//! timestamp (or the recovered value plus one, whichever is larger) whenever
//! a plain `+1` is impossible.

use chrono::Utc;
use serde_json::Value;

use crate::error::VersionError;

// =============================================================================
// Parsed Version
// =============================================================================

/// Which step of the fallback chain produced a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    /// The text was an integer.
    Exact,
    /// The integer was recovered from the first digit run.
    Digits,
    /// Nothing numeric was found; the current timestamp was substituted.
    Timestamp,
}

/// A version value together with how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedVersion {
    pub value: i64,
    pub source: VersionSource,
}

impl ParsedVersion {
    /// Creates an exact version.
    pub const fn exact(value: i64) -> Self {
        ParsedVersion {
            value,
            source: VersionSource::Exact,
        }
    }

    /// True when the stored text differs from the value and should be rewritten.
    pub fn was_repaired(&self) -> bool {
        self.source != VersionSource::Exact
    }
}

/// Returns the current time in milliseconds, the unit used for fallback versions.
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp_millis()
}

/// Extracts the first run of ASCII digits, e.g. `"v1.2"` → `1`.
fn first_digit_run(raw: &str) -> Option<i64> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let digits: String = raw[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parses a version marker: integer first, then the first digit run.
///
/// ## Errors
/// [`VersionError::NotANumber`] when neither step yields a number. Callers
/// reading a *remote* marker abort on this error.
pub fn parse_marker(raw: &str) -> Result<ParsedVersion, VersionError> {
    if let Ok(value) = raw.trim().parse::<i64>() {
        return Ok(ParsedVersion::exact(value));
    }

    first_digit_run(raw)
        .map(|value| ParsedVersion {
            value,
            source: VersionSource::Digits,
        })
        .ok_or_else(|| VersionError::NotANumber {
            raw: raw.to_string(),
        })
}

/// Parses a version, substituting `now_ms` when nothing numeric is found.
pub fn parse_or_recover(raw: &str, now_ms: i64) -> ParsedVersion {
    parse_marker(raw).unwrap_or(ParsedVersion {
        value: now_ms,
        source: VersionSource::Timestamp,
    })
}

// =============================================================================
// Version Bump
// =============================================================================

/// Result of advancing the local counter by one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    /// The stored value was an integer and was increased by exactly one.
    Incremented { from: i64, to: i64 },
    /// The stored value was unusable; the counter restarts at `to`.
    Reset { to: i64 },
}

impl VersionBump {
    /// The new counter value.
    pub fn value(&self) -> i64 {
        match self {
            VersionBump::Incremented { to, .. } | VersionBump::Reset { to } => *to,
        }
    }

    /// True when the counter had to be reset.
    pub fn is_reset(&self) -> bool {
        matches!(self, VersionBump::Reset { .. })
    }
}

/// Advances the counter stored as `raw` for one local mutation.
///
/// ## Rules
/// - integer `v` → `v + 1`
/// - `v + 1` overflows → reset to `now_ms`
/// - anything else → reset to `max(now_ms, recovered + 1)`, so the value
///   still grows when a digit run larger than the clock was recovered
pub fn next_version(raw: &str, now_ms: i64) -> VersionBump {
    match parse_marker(raw) {
        Ok(ParsedVersion {
            value,
            source: VersionSource::Exact,
        }) => match value.checked_add(1) {
            Some(to) if to > value => VersionBump::Incremented { from: value, to },
            _ => VersionBump::Reset { to: now_ms },
        },
        Ok(recovered) => VersionBump::Reset {
            to: recovered
                .value
                .checked_add(1)
                .map_or(now_ms, |next| next.max(now_ms)),
        },
        Err(_) => VersionBump::Reset { to: now_ms },
    }
}

// =============================================================================
// Stored Representation
// =============================================================================

/// Renders a stored option value as version text.
///
/// Numbers and strings are both accepted because older clients stored the
/// counter as a string. `None` means the counter was never written.
pub fn version_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_parse_marker_exact() {
        assert_eq!(parse_marker("5").unwrap(), ParsedVersion::exact(5));
        assert_eq!(parse_marker(" 17\n").unwrap(), ParsedVersion::exact(17));
    }

    #[test]
    fn test_parse_marker_digit_fallback() {
        let parsed = parse_marker("\"12\"").unwrap();
        assert_eq!(parsed.value, 12);
        assert_eq!(parsed.source, VersionSource::Digits);

        let parsed = parse_marker("v1.2").unwrap();
        assert_eq!(parsed.value, 1);
        assert!(parsed.was_repaired());
    }

    #[test]
    fn test_parse_marker_rejects_garbage() {
        assert_eq!(
            parse_marker("abc"),
            Err(VersionError::NotANumber { raw: "abc".into() })
        );
        assert!(parse_marker("").is_err());
    }

    #[test]
    fn test_parse_or_recover_uses_timestamp() {
        let parsed = parse_or_recover("abc", NOW);
        assert_eq!(parsed.value, NOW);
        assert_eq!(parsed.source, VersionSource::Timestamp);
    }

    #[test]
    fn test_next_version_increments() {
        assert_eq!(
            next_version("3", NOW),
            VersionBump::Incremented { from: 3, to: 4 }
        );
    }

    #[test]
    fn test_next_version_resets_garbage() {
        assert_eq!(next_version("garbage", NOW), VersionBump::Reset { to: NOW });
        assert_eq!(next_version(&i64::MAX.to_string(), NOW), VersionBump::Reset { to: NOW });
    }

    #[test]
    fn test_next_version_never_regresses_below_recovered_digits() {
        let huge = "x9999999999999999";
        let bump = next_version(huge, NOW);
        assert!(bump.is_reset());
        assert!(bump.value() > 9_999_999_999_999_999);
    }

    #[test]
    fn test_monotonic_over_mixed_sequence() {
        let mut stored = "7".to_string();
        let start = parse_or_recover(&stored, NOW).value;
        for (i, corrupt) in ["", "oops", "", "v8"].iter().enumerate() {
            let bump = next_version(&stored, NOW + i as i64);
            stored = bump.value().to_string();
            if !corrupt.is_empty() {
                stored = format!("{}{}", corrupt, stored);
            }
        }
        let end = parse_or_recover(&stored, NOW).value;
        assert!(end > start);
    }

    #[test]
    fn test_version_text() {
        assert_eq!(version_text(&json!(5)), Some("5".to_string()));
        assert_eq!(version_text(&json!("6")), Some("6".to_string()));
        assert_eq!(version_text(&Value::Null), None);
    }
}
