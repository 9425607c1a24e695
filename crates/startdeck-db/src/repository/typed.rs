//! # Typed Record Repository
//!
//! One generic repository for every [`Record`] type (links, notes, search
//! engines). The table comes from `T::TABLE`, the key from `Record::key`.

use std::marker::PhantomData;

use startdeck_core::Record;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::pool::Database;

/// Repository for one record type.
#[derive(Debug)]
pub struct TypedRepository<'a, T: Record> {
    db: &'a Database,
    _record: PhantomData<T>,
}

impl<'a, T: Record> TypedRepository<'a, T> {
    /// Creates a repository over the given database.
    pub fn new(db: &'a Database) -> Self {
        TypedRepository {
            db,
            _record: PhantomData,
        }
    }

    /// Gets a record by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<T>> {
        match self.db.get(T::TABLE, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Gets a record by id, failing with [`DbError::NotFound`].
    pub async fn get_required(&self, id: &str) -> DbResult<T> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found(T::TABLE, id))
    }

    /// Inserts or replaces a record.
    pub async fn put(&self, record: &T) -> DbResult<()> {
        let value = serde_json::to_value(record)?;
        self.db.put(T::TABLE, record.key(), &value).await
    }

    /// Deletes a record. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        self.db.delete_record(T::TABLE, id).await
    }

    /// Lists all records in insertion order.
    ///
    /// Rows that no longer deserialize (e.g. written by a newer client) are
    /// skipped with a debug log instead of failing the whole listing.
    pub async fn list(&self) -> DbResult<Vec<T>> {
        let rows = self.db.list(T::TABLE).await?;
        let mut records = Vec::with_capacity(rows.len());

        for (key, value) in rows {
            match serde_json::from_value(value) {
                Ok(record) => records.push(record),
                Err(e) => debug!(table = T::TABLE, key = %key, error = %e, "Skipping unreadable record"),
            }
        }

        Ok(records)
    }
}
