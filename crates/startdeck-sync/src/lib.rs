//! # startdeck-sync: WebDAV Sync Engine for StartDeck
//!
//! This crate keeps the local StartDeck database in step with a copy in a
//! WebDAV directory, and provides the stores the UI edits through.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Engine Architecture                         │
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐                     │
//! │  │  LinkStore  │  │  NoteStore  │  │ OptionStore │◄── SettingsChannel  │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘                     │
//! │         │ update()       │ update()       │ settings / localVersion    │
//! │         ▼                ▼                ▼                             │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                          SyncEngine                              │  │
//! │  │                                                                  │  │
//! │  │  init / pull / apply_remote / push / update / flush / test      │  │
//! │  │  lock (AtomicBool) + wait type (watch) + reload targets         │  │
//! │  └───────┬───────────────────────┬───────────────────────┬──────────┘  │
//! │          ▼                       ▼                       ▼              │
//! │  ┌────────────────┐  ┌─────────────────────┐  ┌──────────────────────┐ │
//! │  │  Debouncer     │  │  RemoteStore        │  │  startdeck-db        │ │
//! │  │  trailing push │  │  WebDavClient /     │  │  export / import /   │ │
//! │  │  timer task    │  │  MemoryRemote       │  │  delete / open       │ │
//! │  └────────────────┘  └─────────────────────┘  └──────────────────────┘ │
//! │                                                                         │
//! │  USER NOTIFICATIONS: SyncEventEmitter                                   │
//! │  • emit_wait_type("" | "pull" | "push")                                 │
//! │  • emit_error(SyncNotice)                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - `SyncEngine`, the pull / push protocol
//! - [`remote`] - `RemoteStore` trait, WebDAV client, in-memory store
//! - [`debounce`] - Trailing-edge debouncer task for pushes
//! - [`stores`] - Option, link and note stores
//! - [`events`] - Event emitter trait
//! - [`config`] - Application configuration (TOML + environment)
//! - [`error`] - Sync error types and user notices
//!
//! ## Usage
//!
//! ```rust,ignore
//! use startdeck_sync::{AppConfig, NoOpChannel, OptionStore, SyncEngineBuilder};
//!
//! let config = AppConfig::load_or_default(None);
//! let options = OptionStore::load(db.clone(), Arc::new(NoOpChannel)).await?;
//! let engine = SyncEngineBuilder::new(config)
//!     .with_database(db)
//!     .with_options(options)
//!     .build()?;
//!
//! engine.init().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod events;
pub mod remote;
pub mod stores;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, DatabaseSettings, EngineSettings, RemoteSettings};
pub use debounce::DebounceHandle;
pub use engine::{
    ApplyOutcome, EngineStatus, PullOutcome, PushOutcome, SkipReason, SyncEngine,
    SyncEngineBuilder, UpdateOutcome,
};
pub use error::{SyncError, SyncNotice, SyncResult};
pub use events::{NoOpEmitter, SyncEventEmitter};
pub use remote::{
    Credentials, MemoryConnector, MemoryRemote, RemoteConnector, RemoteOp, RemotePaths,
    RemoteState, RemoteStore, WebDavClient, WebDavConnector,
};
pub use stores::{LinkStore, NoOpChannel, NoteStore, OptionStore, ReloadTarget, SettingsChannel};
