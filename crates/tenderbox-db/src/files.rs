//! File metadata index backed by the `files` table.

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tenderbox_core::{
    Error, FileFilter, FileIndex, FileQuery, FileRecord, FileType, Result, Role, WriteBatch,
};

use crate::activities::insert_event;

const FILE_COLUMNS: &str = "id, file_name, original_name, url, mime_type, file_size, \
     proposal_id, file_type, link_description, uploaded_at, \
     uploaded_by_uid, uploaded_by_name, uploaded_by_role";

/// PostgreSQL implementation of [`FileIndex`].
#[derive(Clone)]
pub struct PgFileIndex {
    pool: PgPool,
}

impl PgFileIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) async fn insert_file<'c, E>(executor: E, record: &FileRecord) -> Result<()>
where
    E: PgExecutor<'c>,
{
    sqlx::query(
        r#"INSERT INTO files (id, file_name, original_name, url, mime_type, file_size,
                              proposal_id, file_type, link_description, uploaded_at,
                              uploaded_by_uid, uploaded_by_name, uploaded_by_role)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
    )
    .bind(record.id)
    .bind(&record.file_name)
    .bind(&record.original_name)
    .bind(&record.url)
    .bind(&record.mime_type)
    .bind(record.file_size)
    .bind(&record.proposal_id)
    .bind(record.file_type.map(|t| t.as_str()))
    .bind(&record.link_description)
    .bind(record.uploaded_at)
    .bind(&record.uploaded_by_uid)
    .bind(&record.uploaded_by_name)
    .bind(record.uploaded_by_role.to_string())
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl FileIndex for PgFileIndex {
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {} FROM files WHERE id = $1", FILE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().and_then(readable_row))
    }

    async fn query(&self, query: FileQuery) -> Result<Vec<FileRecord>> {
        let order = "ORDER BY uploaded_at DESC, id DESC LIMIT";
        let rows = match &query.filter {
            FileFilter::All => {
                let sql = format!("SELECT {} FROM files {} $1", FILE_COLUMNS, order);
                sqlx::query(&sql)
                    .bind(query.limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            FileFilter::Proposal(id) => {
                let sql = format!(
                    "SELECT {} FROM files WHERE proposal_id = $1 {} $2",
                    FILE_COLUMNS, order
                );
                sqlx::query(&sql)
                    .bind(id)
                    .bind(query.limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            FileFilter::ProposalIn(ids) => {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                let sql = format!(
                    "SELECT {} FROM files WHERE proposal_id = ANY($1) {} $2",
                    FILE_COLUMNS, order
                );
                sqlx::query(&sql)
                    .bind(ids.as_slice())
                    .bind(query.limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!(
            subsystem = "db",
            component = "files",
            op = "query",
            filter = ?query.filter,
            limit = query.limit,
            result_count = rows.len(),
            "File index query"
        );
        Ok(rows.iter().filter_map(readable_row).collect())
    }

    async fn insert(&self, record: &FileRecord) -> Result<()> {
        insert_file(&self.pool, record).await
    }

    async fn commit_batch(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for file in &batch.files {
            insert_file(&mut *tx, file).await?;
        }
        for event in &batch.events {
            insert_event(&mut *tx, event).await?;
        }
        tx.commit().await?;

        info!(
            subsystem = "db",
            component = "files",
            op = "commit_batch",
            files = batch.files.len(),
            events = batch.events.len(),
            "Committed write batch"
        );
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Convert a row, or skip it with a warning when its tags are unreadable.
fn readable_row(row: &sqlx::postgres::PgRow) -> Option<FileRecord> {
    match file_from_row(row) {
        Ok(record) => Some(record),
        Err(e) => {
            let id: Option<Uuid> = row.try_get("id").ok();
            warn!(
                subsystem = "db",
                component = "files",
                file_id = ?id,
                error = %e,
                "Skipping unreadable file row"
            );
            None
        }
    }
}

fn file_from_row(row: &sqlx::postgres::PgRow) -> Result<FileRecord> {
    let file_type = row
        .try_get::<Option<String>, _>("file_type")?
        .map(|s| s.parse::<FileType>())
        .transpose()
        .map_err(Error::Serialization)?;
    let uploaded_by_role = row
        .try_get::<String, _>("uploaded_by_role")?
        .parse::<Role>()
        .map_err(Error::Serialization)?;

    Ok(FileRecord {
        id: row.try_get("id")?,
        file_name: row.try_get("file_name")?,
        original_name: row.try_get("original_name")?,
        url: row.try_get("url")?,
        mime_type: row.try_get("mime_type")?,
        file_size: row.try_get("file_size")?,
        proposal_id: row.try_get("proposal_id")?,
        file_type,
        link_description: row.try_get("link_description")?,
        uploaded_at: row.try_get("uploaded_at")?,
        uploaded_by_uid: row.try_get("uploaded_by_uid")?,
        uploaded_by_name: row.try_get("uploaded_by_name")?,
        uploaded_by_role,
    })
}
