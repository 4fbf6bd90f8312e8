//! Read-only access to the `proposals` table.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use tenderbox_core::{Proposal, ProposalStatus, ProposalStore, Result};

/// PostgreSQL implementation of [`ProposalStore`].
#[derive(Clone)]
pub struct PgProposalStore {
    pool: PgPool,
}

impl PgProposalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProposalStore for PgProposalStore {
    async fn get(&self, id: &str) -> Result<Option<Proposal>> {
        let row = sqlx::query("SELECT id, created_by_uid, status FROM proposals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Proposal {
                id: row.try_get("id")?,
                created_by_uid: row.try_get("created_by_uid")?,
                status: ProposalStatus::from(row.try_get::<String, _>("status")?.as_str()),
            })),
            None => Ok(None),
        }
    }

    async fn ids_created_by(&self, uid: &str) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT id FROM proposals WHERE created_by_uid = $1 ORDER BY id",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
