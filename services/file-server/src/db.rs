use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use merkle::Hash32;
use sqlx::PgPool;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::persistence::{self, Persistence, PersistenceError};

/// Connect to Postgres, retrying a fixed number of times.
pub async fn connect_with_retry(url: &str, attempts: u32, interval: Duration) -> Result<PgPool> {
    let mut last_err = None;
    for attempt in 1..=attempts {
        match PgPool::connect(url).await {
            Ok(pool) => {
                info!(attempt, "postgres: connected");
                return Ok(pool);
            }
            Err(e) => {
                warn!(attempt, attempts, "postgres: connect failed: {e}");
                last_err = Some(e);
                if attempt < attempts {
                    sleep(interval).await;
                }
            }
        }
    }
    let err = last_err
        .map(anyhow::Error::from)
        .unwrap_or_else(|| anyhow::anyhow!("no connection attempts made"));
    Err(err).with_context(|| format!("Failed to connect to Postgres after {attempts} attempts"))
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("Postgres ping failed")?;
    Ok(())
}

pub struct PgPersistence {
    pool: PgPool,
}

impl PgPersistence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Persistence for PgPersistence {
    async fn store(&self, name: &str, content: &[u8]) -> persistence::Result<()> {
        sqlx::query("INSERT INTO file_storage (file_name, file_content) VALUES ($1, $2)")
            .bind(name)
            .bind(content)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch(&self, name: &str) -> persistence::Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as(
            r#"
            SELECT file_content
            FROM file_storage
            WHERE file_name = $1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(content,)| content))
    }

    async fn record_leaf_digest(&self, digest: &Hash32) -> persistence::Result<i64> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO leaf_digests (digest) VALUES ($1) RETURNING id")
                .bind(digest.as_slice())
                .fetch_one(&self.pool)
                .await?;
        Ok(id)
    }

    async fn list_leaf_digests(&self) -> persistence::Result<Vec<Hash32>> {
        let rows: Vec<(i64, Vec<u8>)> =
            sqlx::query_as("SELECT id, digest FROM leaf_digests ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(id, bytes)| {
                let len = bytes.len();
                bytes.try_into().map_err(|_| {
                    PersistenceError::Corrupt(format!("leaf_digests row {id} holds {len} bytes"))
                })
            })
            .collect()
    }
}
