//! # Sync Events
//!
//! The single sink through which the engine talks to the UI: status changes
//! of the wait indicator and user-visible failures.
//!
//! ```text
//!   SyncEngine ──► SyncEventEmitter ──► UI notification / status spinner
//!                        │
//!                        ├── emit_wait_type("" | "pull" | "push")
//!                        └── emit_error(SyncNotice)
//! ```
//!
//! Hosts that prefer polling can use `SyncEngine::subscribe()` (a `watch`
//! channel) for the wait type instead.

use startdeck_core::WaitType;

use crate::error::SyncNotice;

/// Trait for emitting sync events to the host.
pub trait SyncEventEmitter: Send + Sync {
    /// The operation holding the engine lock changed.
    fn emit_wait_type(&self, wait_type: WaitType);

    /// A sync failure the user should see.
    fn emit_error(&self, notice: &SyncNotice);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_wait_type(&self, _wait_type: WaitType) {}
    fn emit_error(&self, _notice: &SyncNotice) {}
}
