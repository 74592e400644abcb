//! SQLite-backed save slots.

use crate::{decode_state, encode_state, StoreError};
use sim_core::EconomyState;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{info, warn};

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/garden.db"
}

/// Async key-value store over a `saves(key, blob)` table.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database and ensure the schema.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // One connection: in-memory databases are per connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS saves (
                key TEXT PRIMARY KEY NOT NULL,
                blob TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        info!(url, "save database ready");
        Ok(Self { pool })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let blob = sqlx::query_scalar::<_, String>("SELECT blob FROM saves WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(blob)
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO saves (key, blob) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET blob = excluded.blob",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Same policy as [`crate::load_state`]: never fails.
    pub async fn load_state(&self, key: &str) -> EconomyState {
        match self.get(key).await {
            Ok(Some(blob)) => decode_state(&blob),
            Ok(None) => EconomyState::default(),
            Err(e) => {
                warn!(error = %e, key, "load failed, starting fresh");
                EconomyState::default()
            }
        }
    }

    pub async fn save_state(&self, key: &str, state: &EconomyState) -> Result<(), StoreError> {
        self.put(key, &encode_state(state)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saves_and_overwrites_slots() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        assert_eq!(store.get("gardenGame").await.unwrap(), None);
        assert_eq!(store.load_state("gardenGame").await, EconomyState::default());

        let mut state = EconomyState::default();
        state.currency = 42;
        store.save_state("gardenGame", &state).await.unwrap();
        state.currency = 43;
        store.save_state("gardenGame", &state).await.unwrap();
        assert_eq!(store.load_state("gardenGame").await, state);
        assert_eq!(store.load_state("other").await, EconomyState::default());
    }

    #[tokio::test]
    async fn corrupt_blob_loads_fresh() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        store.put("gardenGame", "[1,2,3]").await.unwrap();
        assert_eq!(store.load_state("gardenGame").await, EconomyState::default());
    }

    #[test]
    fn url_is_sqlite() {
        assert!(default_sqlite_url().starts_with("sqlite://"));
    }
}
