//! # tenderbox-db
//!
//! Storage layer for tenderbox.
//!
//! This crate provides:
//! - Connection pool management
//! - PostgreSQL implementations of the file index, proposal store, audit log
//!   and token resolver
//! - A filesystem blob store
//!
//! ## Example
//!
//! ```rust,ignore
//! use tenderbox_db::{Database, PoolConfig};
//!
//! let db = Database::connect("postgres://localhost/tenderbox", PoolConfig::default()).await?;
//! let proposal = db.proposals.get("p-1").await?;
//! ```

pub mod activities;
pub mod blob_storage;
pub mod files;
pub mod pool;
pub mod proposals;
pub mod tokens;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

pub use tenderbox_core::*;

pub use activities::PgAuditLog;
pub use blob_storage::{validate_key, FilesystemBlobStore};
pub use files::PgFileIndex;
pub use pool::{create_pool, log_pool_metrics, PoolConfig};
pub use proposals::PgProposalStore;
pub use tokens::{hash_token, PgActorResolver};

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub files: PgFileIndex,
    /// Parent proposals (read-only).
    pub proposals: PgProposalStore,
    pub activities: PgAuditLog,
    /// Bearer token registry.
    pub tokens: PgActorResolver,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            files: PgFileIndex::new(pool.clone()),
            proposals: PgProposalStore::new(pool.clone()),
            activities: PgAuditLog::new(pool.clone()),
            tokens: PgActorResolver::new(pool.clone()),
            pool,
        }
    }

    /// Connect with the given pool configuration.
    pub async fn connect(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
