//! SQLite-backed world settings storage.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::infrastructure::ports::{ClockPort, RepoError, SettingsRepo};

/// Settings namespace used by this module
pub const MODULE_NAMESPACE: &str = "pf2e-npc-vibes";

/// SQLite implementation of the world key-value settings store.
pub struct SqliteSettingsRepo {
    pool: SqlitePool,
    namespace: String,
    clock: Arc<dyn ClockPort>,
}

impl SqliteSettingsRepo {
    pub async fn new(
        db_path: &str,
        namespace: impl Into<String>,
        clock: Arc<dyn ClockPort>,
    ) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("settings", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS world_settings (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value_json TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("settings", e))?;

        Ok(Self {
            pool,
            namespace: namespace.into(),
            clock,
        })
    }
}

#[async_trait]
impl SettingsRepo for SqliteSettingsRepo {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, RepoError> {
        let row = sqlx::query("SELECT value_json FROM world_settings WHERE namespace = ? AND key = ?")
            .bind(&self.namespace)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("settings_get", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("value_json");
                let value = serde_json::from_str(&json).map_err(RepoError::serialization)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), RepoError> {
        let json = serde_json::to_string(value).map_err(RepoError::serialization)?;
        let now = self.clock.now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO world_settings (namespace, key, value_json, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(namespace, key) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.namespace)
        .bind(key)
        .bind(json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("settings_set", e))?;

        Ok(())
    }
}
