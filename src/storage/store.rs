//! The store handle shared by the engine and the HTTP layer.

use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::OwnedMutexGuard;

use crate::error_handling::DatabaseError;
use crate::models::DomainRecord;
use crate::storage::domains::{list_domain_names, load_domain};
use crate::storage::locks::DomainLocks;
use crate::storage::servers::load_servers;

/// Pool plus per-domain lock table.
///
/// Cheap to clone; clones share both.
#[derive(Clone)]
pub struct DomainStore {
    pool: SqlitePool,
    locks: DomainLocks,
}

impl DomainStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: DomainLocks::new(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Serializes lookups of one domain; see [`DomainLocks`].
    pub async fn lock(&self, domain: &str) -> OwnedMutexGuard<()> {
        self.locks.acquire(domain).await
    }

    /// Starts a pass transaction holding the database write lock.
    ///
    /// Passes read before they write; concurrent passes of other domains
    /// wait here on the busy timeout rather than failing at their first write.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, DatabaseError> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(DatabaseError::SqlError)
    }

    /// Loads a domain row and its servers, or `None` if never looked up.
    pub async fn load_domain_with_servers(
        &self,
        name: &str,
    ) -> Result<Option<DomainRecord>, DatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::SqlError)?;
        let Some(mut record) = load_domain(&mut conn, name).await? else {
            return Ok(None);
        };
        record.servers = load_servers(&mut conn, name).await?;
        Ok(Some(record))
    }

    pub async fn list_domain_names(&self) -> Result<Vec<String>, DatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::SqlError)?;
        list_domain_names(&mut conn).await
    }
}
