//! Append-only audit trail backed by the `activities` table.

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool, Row};

use tenderbox_core::{AuditEvent, AuditEventType, AuditLog, Error, Result, Role};

/// PostgreSQL implementation of [`AuditLog`].
#[derive(Clone)]
pub struct PgAuditLog {
    pool: PgPool,
}

impl PgAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recent events for a proposal, newest first.
    pub async fn list_for_proposal(&self, proposal_id: &str, limit: i64) -> Result<Vec<AuditEvent>> {
        let rows = sqlx::query(
            r#"SELECT id, type, details, performed_by_uid, performed_by_name,
                      performed_by_role, timestamp, proposal_id, file_id
               FROM activities
               WHERE proposal_id = $1
               ORDER BY timestamp DESC, id DESC
               LIMIT $2"#,
        )
        .bind(proposal_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(event_from_row).collect()
    }
}

pub(crate) async fn insert_event<'c, E>(executor: E, event: &AuditEvent) -> Result<()>
where
    E: PgExecutor<'c>,
{
    sqlx::query(
        r#"INSERT INTO activities (id, type, details, performed_by_uid, performed_by_name,
                                   performed_by_role, timestamp, proposal_id, file_id)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
    )
    .bind(event.id)
    .bind(event.event_type.as_str())
    .bind(&event.details)
    .bind(&event.performed_by_uid)
    .bind(&event.performed_by_name)
    .bind(event.performed_by_role.to_string())
    .bind(event.timestamp)
    .bind(&event.proposal_id)
    .bind(event.file_id)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn append(&self, event: &AuditEvent) -> Result<()> {
        insert_event(&self.pool, event).await
    }
}

fn event_from_row(row: &sqlx::postgres::PgRow) -> Result<AuditEvent> {
    let event_type = row
        .try_get::<String, _>("type")?
        .parse::<AuditEventType>()
        .map_err(Error::Serialization)?;
    let performed_by_role = row
        .try_get::<String, _>("performed_by_role")?
        .parse::<Role>()
        .map_err(Error::Serialization)?;

    Ok(AuditEvent {
        id: row.try_get("id")?,
        event_type,
        details: row.try_get("details")?,
        performed_by_uid: row.try_get("performed_by_uid")?,
        performed_by_name: row.try_get("performed_by_name")?,
        performed_by_role,
        timestamp: row.try_get("timestamp")?,
        proposal_id: row.try_get("proposal_id")?,
        file_id: row.try_get("file_id")?,
    })
}
