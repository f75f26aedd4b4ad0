use async_trait::async_trait;
use serde_json::Value;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{KvError, KvStore};

/// Durable backend: a single `kv_store` table of JSONB documents keyed by
/// text. Keeps the same ordering contract as [`super::MemoryKv`].
#[derive(Debug, Clone)]
pub struct PostgresKv {
    pool: PgPool,
}

impl PostgresKv {
    pub async fn connect(database_url: &str) -> Result<Self, KvError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// `LIKE` treats `%`, `_` and the escape character specially, and keys embed
/// user-supplied emails, so escape the prefix before building the pattern.
fn like_pattern(prefix: &str) -> String {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("{escaped}%")
}

#[async_trait]
impl KvStore for PostgresKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, KvError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("value")))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), KvError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>, KvError> {
        let rows =
            sqlx::query(r"SELECT value FROM kv_store WHERE key LIKE $1 ESCAPE '\' ORDER BY key")
                .bind(like_pattern(prefix))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|row| row.get("value")).collect())
    }

    async fn delete(&self, key: &str) -> Result<bool, KvError> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
