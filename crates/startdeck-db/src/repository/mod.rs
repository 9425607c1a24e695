//! # Repository Module
//!
//! Typed access on top of the record primitives.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories                                         │
//! │                                                                         │
//! │  LinkStore / NoteStore                 OptionStore                      │
//! │       │  db.links().put(&link)              │  db.options().set(k, v)   │
//! │       ▼                                     ▼                           │
//! │  TypedRepository<T: Record>            OptionRepository                 │
//! │  ├── get(id)                           ├── get(key)                     │
//! │  ├── put(&record)                      ├── set(key, value)              │
//! │  ├── delete(id)                        ├── remove(key)                  │
//! │  └── list()                            └── all()                        │
//! │       │                                     │                           │
//! │       └──────────────┬──────────────────────┘                           │
//! │                      ▼                                                  │
//! │       Database::{get, put, delete_record, list}  (records.rs)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories borrow the [`Database`](crate::Database) instead of holding a pool, so they
//! keep working after the sync engine replaces the database.

pub mod option;
pub mod typed;

pub use option::OptionRepository;
pub use typed::TypedRepository;
