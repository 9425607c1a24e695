//! # Commands Module
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (output helper)
//! ├── sync.rs     ◄─── configure, test, pull, push, status, disconnect
//! ├── link.rs     ◄─── Link add/list/remove
//! ├── note.rs     ◄─── Note add/list/remove
//! └── data.rs     ◄─── Snapshot export/import
//! ```
//!
//! Every command takes the [`AppState`](crate::state::AppState) and an
//! [`Output`]; with `--json` results are printed as JSON instead of text.

pub mod data;
pub mod link;
pub mod note;
pub mod sync;

use serde::Serialize;
use std::io::Write;

use crate::error::CliResult;

/// Where command results go.
pub struct Output<'a> {
    writer: &'a mut dyn Write,
    json: bool,
}

impl<'a> Output<'a> {
    pub fn new(writer: &'a mut dyn Write, json: bool) -> Self {
        Output { writer, json }
    }

    /// Prints `value` as JSON, or the text rendering otherwise.
    pub fn value<T, F>(&mut self, value: &T, text: F) -> CliResult<()>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        if self.json {
            let json = serde_json::to_string_pretty(value)?;
            writeln!(self.writer, "{}", json)?;
        } else {
            let text = text(value);
            if !text.is_empty() {
                writeln!(self.writer, "{}", text)?;
            }
        }
        Ok(())
    }

    /// Prints a status message; in JSON mode as `{"message": ...}`.
    pub fn message(&mut self, message: impl Into<String>) -> CliResult<()> {
        let message = message.into();
        self.value(&serde_json::json!({ "message": message }), |_| message.clone())
    }
}
