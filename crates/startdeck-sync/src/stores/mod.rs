//! # Stores
//!
//! In-memory views over the database that the UI reads from. Every mutation
//! goes through the database first, then bumps the sync version so the
//! change is pushed.
//!
//! After a pull replaces the database, the engine calls
//! [`ReloadTarget::reload`] on every registered store so the views match the
//! new data.

use async_trait::async_trait;

use crate::error::SyncResult;

pub mod links;
pub mod notes;
pub mod options;

pub use links::LinkStore;
pub use notes::NoteStore;
pub use options::{NoOpChannel, OptionStore, SettingsChannel};

/// A store whose cached view must be refreshed after a pull.
#[async_trait]
pub trait ReloadTarget: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Re-reads the view from the database.
    async fn reload(&self) -> SyncResult<()>;
}
