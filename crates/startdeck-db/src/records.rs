//! # Record Primitives
//!
//! Keyed operations on one named table: `get`, `put`, `bulk_put`,
//! `delete_record` and `list`. Values are JSON, stored as text.
//!
//! Writes are upserts on `(table_name, key)` so an updated record keeps its
//! rowid and therefore its position in `list` and in exports.

use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;
use startdeck_core::types::table_def;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::pool::Database;

const UPSERT_SQL: &str = r#"
    INSERT INTO records (table_name, key, value, updated_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (table_name, key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
"#;

/// Fails with [`DbError::UnknownTable`] for names outside the registry.
pub(crate) fn ensure_table(table: &str) -> DbResult<()> {
    table_def(table)
        .map(|_| ())
        .ok_or_else(|| DbError::UnknownTable(table.to_string()))
}

/// Upserts one row on an existing connection or transaction.
pub(crate) async fn upsert(
    conn: &mut SqliteConnection,
    table: &str,
    key: &str,
    value: &Value,
) -> DbResult<()> {
    let text = serde_json::to_string(value)?;
    sqlx::query(UPSERT_SQL)
        .bind(table)
        .bind(key)
        .bind(text)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}

/// Removes every row of one table.
pub(crate) async fn clear(conn: &mut SqliteConnection, table: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM records WHERE table_name = ?1")
        .bind(table)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

impl Database {
    /// Reads one record.
    pub async fn get(&self, table: &str, key: &str) -> DbResult<Option<Value>> {
        ensure_table(table)?;
        let pool = self.pool().await?;

        let text: Option<String> =
            sqlx::query_scalar("SELECT value FROM records WHERE table_name = ?1 AND key = ?2")
                .bind(table)
                .bind(key)
                .fetch_optional(&pool)
                .await?;

        text.map(|t| serde_json::from_str(&t))
            .transpose()
            .map_err(DbError::from)
    }

    /// Inserts or replaces one record.
    pub async fn put(&self, table: &str, key: &str, value: &Value) -> DbResult<()> {
        ensure_table(table)?;
        let pool = self.pool().await?;
        let mut conn = pool.acquire().await?;

        upsert(&mut conn, table, key, value).await?;

        debug!(table = %table, key = %key, "Record stored");
        Ok(())
    }

    /// Inserts or replaces many records in one transaction.
    pub async fn bulk_put(&self, table: &str, rows: &[(String, Value)]) -> DbResult<usize> {
        ensure_table(table)?;
        let pool = self.pool().await?;
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for (key, value) in rows {
            upsert(&mut tx, table, key, value).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(table = %table, count = rows.len(), "Records stored");
        Ok(rows.len())
    }

    /// Deletes one record. Returns whether it existed.
    pub async fn delete_record(&self, table: &str, key: &str) -> DbResult<bool> {
        ensure_table(table)?;
        let pool = self.pool().await?;

        let result = sqlx::query("DELETE FROM records WHERE table_name = ?1 AND key = ?2")
            .bind(table)
            .bind(key)
            .execute(&pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all records of one table in insertion order.
    pub async fn list(&self, table: &str) -> DbResult<Vec<(String, Value)>> {
        ensure_table(table)?;
        let pool = self.pool().await?;

        let rows = sqlx::query(
            "SELECT key, value FROM records WHERE table_name = ?1 ORDER BY rowid ASC",
        )
        .bind(table)
        .fetch_all(&pool)
        .await?;

        rows.into_iter()
            .map(|row| -> DbResult<(String, Value)> {
                let key: String = row.try_get("key")?;
                let text: String = row.try_get("value")?;
                Ok((key, serde_json::from_str(&text)?))
            })
            .collect()
    }

    /// Number of records in one table.
    pub async fn count(&self, table: &str) -> DbResult<i64> {
        ensure_table(table)?;
        let pool = self.pool().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE table_name = ?1")
            .bind(table)
            .fetch_one(&pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use serde_json::json;
    use startdeck_core::tables;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let db = db().await;
        db.put(tables::NOTE, "n1", &json!({"content": "hi"})).await.unwrap();

        assert_eq!(
            db.get(tables::NOTE, "n1").await.unwrap(),
            Some(json!({"content": "hi"}))
        );
        assert!(db.delete_record(tables::NOTE, "n1").await.unwrap());
        assert!(!db.delete_record(tables::NOTE, "n1").await.unwrap());
        assert_eq!(db.get(tables::NOTE, "n1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_keeps_order() {
        let db = db().await;
        let rows = vec![
            ("a".to_string(), json!(1)),
            ("b".to_string(), json!(2)),
            ("c".to_string(), json!(3)),
        ];
        assert_eq!(db.bulk_put(tables::LINK, &rows).await.unwrap(), 3);

        db.put(tables::LINK, "a", &json!(10)).await.unwrap();

        let keys: Vec<String> = db
            .list(tables::LINK)
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(db.count(tables::LINK).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unknown_table_rejected() {
        let db = db().await;
        assert!(matches!(
            db.put("bogus", "k", &json!(1)).await,
            Err(DbError::UnknownTable(_))
        ));
    }
}
