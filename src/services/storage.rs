use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::models::{storage_key, CachedEventData};
use crate::utils::error::CheckInError;

/// Key/value store backing the offline allow-list cache.
///
/// Values are whole JSON documents; a write replaces the previous document.
#[derive(Clone)]
pub struct LocalStorage {
    pool: SqlitePool,
}

impl LocalStorage {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Single-connection in-memory database; the connection is never recycled.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::migrate!().run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT value FROM local_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Cached allow-list for `event_id`. Unreadable or malformed entries count as a miss.
    pub async fn load_event(&self, event_id: &str) -> Option<CachedEventData> {
        let key = storage_key(event_id);

        let raw = match self.get_item(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(event_id, "No cached event data");
                return None;
            }
            Err(e) => {
                warn!(event_id, error = %e, "Failed to read cached event data");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!(event_id, error = %e, "Ignoring malformed cached event data");
                None
            }
        }
    }

    pub async fn save_event(
        &self,
        event_id: &str,
        data: &CachedEventData,
    ) -> Result<(), CheckInError> {
        let value = serde_json::to_string(data)?;
        self.set_item(&storage_key(event_id), &value).await?;
        Ok(())
    }
}
