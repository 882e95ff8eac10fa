use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::order::OrderSubmission;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite, Transaction,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Fixed key the order fallback log is stored under.
pub const ORDER_LOG_KEY: &str = "crochet_orders";

/// Mirrors the typical per-origin quota of browser local storage.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("value for '{key}' needs {needed} bytes, quota is {limit} bytes")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },
    #[error("failed to serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("local store backend failure: {0}")]
    Backend(#[from] sqlx::Error),
}

/// Best-effort local log of submitted orders, independent of notification delivery.
#[async_trait]
pub trait FallbackRecorder: Send + Sync {
    async fn append(&self, submission: &OrderSubmission) -> Result<(), StorageError>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
    quota_bytes: usize,
    // Deferred transactions cannot upgrade a shared lock once another
    // reader holds one, so read-modify-write of the order log is serialized.
    order_log_lock: Arc<Mutex<()>>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self {
            pool,
            quota_bytes: DEFAULT_QUOTA_BYTES,
            order_log_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = sqlx::query_scalar("SELECT value FROM local_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_quota(key, value)?;
        let mut tx = self.pool.begin().await?;
        upsert(&mut tx, key, value).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn remove_item(&self, key: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM local_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reads the order log. Missing or corrupt data reads as an empty log.
    pub async fn load_orders(&self) -> Result<Vec<OrderSubmission>, StorageError> {
        let raw = self.get_item(ORDER_LOG_KEY).await?;
        Ok(decode_order_log(raw.as_deref()))
    }

    /// Appends `submission` to the order log and returns the new log length.
    pub async fn append_order(&self, submission: &OrderSubmission) -> Result<usize, StorageError> {
        let _guard = self.order_log_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM local_store WHERE key = ?")
                .bind(ORDER_LOG_KEY)
                .fetch_optional(&mut *tx)
                .await?;

        let mut orders = decode_order_log(raw.as_deref());
        orders.push(submission.clone());
        let encoded = serde_json::to_string(&orders)?;
        self.check_quota(ORDER_LOG_KEY, &encoded)?;

        upsert(&mut tx, ORDER_LOG_KEY, &encoded).await?;
        tx.commit().await?;
        debug!(
            project_id = %submission.project_id,
            entries = orders.len(),
            "order appended to local fallback log"
        );
        Ok(orders.len())
    }

    pub async fn clear_orders(&self) -> Result<usize, StorageError> {
        let _guard = self.order_log_lock.lock().await;
        let existing = self.load_orders().await?.len();
        self.remove_item(ORDER_LOG_KEY).await?;
        Ok(existing)
    }

    fn check_quota(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let needed = key.len() + value.len();
        if needed > self.quota_bytes {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                needed,
                limit: self.quota_bytes,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FallbackRecorder for Storage {
    async fn append(&self, submission: &OrderSubmission) -> Result<(), StorageError> {
        self.append_order(submission).await.map(|_| ())
    }
}

async fn upsert(
    tx: &mut Transaction<'_, Sqlite>,
    key: &str,
    value: &str,
) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO local_store (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn decode_order_log(raw: Option<&str>) -> Vec<OrderSubmission> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<OrderSubmission>>(raw) {
        Ok(orders) => orders,
        Err(error) => {
            warn!(%error, key = ORDER_LOG_KEY, "discarding corrupt order log");
            Vec::new()
        }
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
