//! # Settings Repository
//!
//! A flat key/value table for runtime configuration: the low-stock alert
//! threshold, the Telegram chat binding, store identity. Writes are
//! upserts; reads of a missing key return `None` and callers fall back to
//! their defaults.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreResult;

/// Settings key for the `/alertas` low-stock threshold.
pub const LOW_STOCK_THRESHOLD_KEY: &str = "low_stock_threshold";
/// Settings key for the Telegram bot token.
pub const TELEGRAM_BOT_TOKEN_KEY: &str = "telegram_bot_token";
/// Settings key for the Telegram target chat.
pub const TELEGRAM_CHAT_ID_KEY: &str = "telegram_chat_id";

/// Repository for settings operations.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets a setting value, `None` if the key was never set.
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value)
    }

    /// Sets a setting value (insert or overwrite).
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        debug!(key, value, "setting updated");

        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The low-stock threshold, falling back to the given default when the
    /// key is unset or not a number.
    pub async fn low_stock_threshold(&self, default: i64) -> StoreResult<i64> {
        let value = self.get(LOW_STOCK_THRESHOLD_KEY).await?;

        Ok(value
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn get_set_and_overwrite() {
        let db = db().await;

        assert!(db.settings().get("store_name").await.unwrap().is_none());

        db.settings().set("store_name", "BotiGest").await.unwrap();
        assert_eq!(
            db.settings().get("store_name").await.unwrap().as_deref(),
            Some("BotiGest")
        );

        db.settings().set("store_name", "La Botica").await.unwrap();
        assert_eq!(
            db.settings().get("store_name").await.unwrap().as_deref(),
            Some("La Botica")
        );
    }

    #[tokio::test]
    async fn threshold_falls_back_on_missing_or_garbage() {
        let db = db().await;

        assert_eq!(db.settings().low_stock_threshold(10).await.unwrap(), 10);

        db.settings().set(LOW_STOCK_THRESHOLD_KEY, "25").await.unwrap();
        assert_eq!(db.settings().low_stock_threshold(10).await.unwrap(), 25);

        db.settings().set(LOW_STOCK_THRESHOLD_KEY, "mucho").await.unwrap();
        assert_eq!(db.settings().low_stock_threshold(10).await.unwrap(), 10);
    }
}
