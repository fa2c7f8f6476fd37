//! Durable storage collaborator: file bytes by name and the leaf digest ledger.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use merkle::Hash32;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

#[async_trait]
pub trait Persistence: Send + Sync {
    async fn store(&self, name: &str, content: &[u8]) -> Result<()>;

    /// Most recent content stored under `name`
    async fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Append a digest to the ledger and return its row id
    async fn record_leaf_digest(&self, digest: &Hash32) -> Result<i64>;

    /// Every recorded digest, oldest first
    async fn list_leaf_digests(&self) -> Result<Vec<Hash32>>;
}

#[async_trait]
impl<T: Persistence + ?Sized> Persistence for Box<T> {
    async fn store(&self, name: &str, content: &[u8]) -> Result<()> {
        (**self).store(name, content).await
    }

    async fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>> {
        (**self).fetch(name).await
    }

    async fn record_leaf_digest(&self, digest: &Hash32) -> Result<i64> {
        (**self).record_leaf_digest(digest).await
    }

    async fn list_leaf_digests(&self) -> Result<Vec<Hash32>> {
        (**self).list_leaf_digests().await
    }
}

#[derive(Default)]
struct Tables {
    files: HashMap<String, Vec<u8>>,
    digests: Vec<Hash32>,
}

/// In-memory persistence (for testing and running without Postgres)
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> PersistenceError {
    PersistenceError::Storage(format!("lock poisoned: {e}"))
}

#[async_trait]
impl Persistence for InMemoryPersistence {
    async fn store(&self, name: &str, content: &[u8]) -> Result<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.files.insert(name.to_string(), content.to_vec());
        Ok(())
    }

    async fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.files.get(name).cloned())
    }

    async fn record_leaf_digest(&self, digest: &Hash32) -> Result<i64> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.digests.push(*digest);
        Ok(tables.digests.len() as i64)
    }

    async fn list_leaf_digests(&self) -> Result<Vec<Hash32>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.digests.clone())
    }
}
