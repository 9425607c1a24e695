//! # Option Repository
//!
//! Key/value access to the `option` table. Values are arbitrary JSON.

use serde_json::Value;
use startdeck_core::tables;

use crate::error::DbResult;
use crate::pool::Database;

/// Repository for the `option` table.
#[derive(Debug, Clone, Copy)]
pub struct OptionRepository<'a> {
    db: &'a Database,
}

impl<'a> OptionRepository<'a> {
    /// Creates a repository over the given database.
    pub fn new(db: &'a Database) -> Self {
        OptionRepository { db }
    }

    /// Reads one option.
    pub async fn get(&self, key: &str) -> DbResult<Option<Value>> {
        self.db.get(tables::OPTION, key).await
    }

    /// Writes one option.
    pub async fn set(&self, key: &str, value: &Value) -> DbResult<()> {
        self.db.put(tables::OPTION, key, value).await
    }

    /// Removes one option.
    pub async fn remove(&self, key: &str) -> DbResult<bool> {
        self.db.delete_record(tables::OPTION, key).await
    }

    /// Reads the given keys; absent keys are left out.
    pub async fn get_many(&self, keys: &[&str]) -> DbResult<Vec<(String, Value)>> {
        let mut found = Vec::new();
        for key in keys {
            if let Some(value) = self.get(key).await? {
                found.push((key.to_string(), value));
            }
        }
        Ok(found)
    }

    /// All options in insertion order.
    pub async fn all(&self) -> DbResult<Vec<(String, Value)>> {
        self.db.list(tables::OPTION).await
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use serde_json::json;

    #[tokio::test]
    async fn test_option_access() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let options = db.options();

        options.set("localVersion", &json!(3)).await.unwrap();
        options.set("theme", &json!("dark")).await.unwrap();

        assert_eq!(options.get("localVersion").await.unwrap(), Some(json!(3)));
        assert_eq!(
            options.get_many(&["theme", "missing"]).await.unwrap(),
            vec![("theme".to_string(), json!("dark"))]
        );
        assert!(options.remove("theme").await.unwrap());
        assert_eq!(options.all().await.unwrap().len(), 1);
    }
}
