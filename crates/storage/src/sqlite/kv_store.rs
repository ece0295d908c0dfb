use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::Row;

use crate::repository::{KeyValueStore, StorageError, expiry_for};

use super::{SqliteInitError, SqliteRepository};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl SqliteRepository {
    /// Delete every entry whose expiry has passed, returning how many went.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the delete fails.
    pub async fn purge_expired(&self) -> Result<u64, SqliteInitError> {
        let done = sqlx::query("DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1")
            .bind(self.clock.now())
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}

#[async_trait]
impl KeyValueStore for SqliteRepository {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let row = sqlx::query("SELECT value, expires_at FROM kv_entries WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: Option<DateTime<Utc>> = row.try_get("expires_at").map_err(ser)?;
        if expires_at.is_some_and(|at| at <= self.clock.now()) {
            self.remove(key).await?;
            return Ok(None);
        }

        let raw: String = row.try_get("value").map_err(ser)?;
        serde_json::from_str(&raw).map(Some).map_err(ser)
    }

    async fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        let now = self.clock.now();
        let expires_at = expiry_for(now, ttl)?;
        let raw = serde_json::to_string(&value).map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO kv_entries (key, value, expires_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(raw)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
