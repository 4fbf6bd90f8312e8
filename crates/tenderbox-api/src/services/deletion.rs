//! Deletion coordinator.
//!
//! Order: authorize, delete the blob (best effort), delete the metadata
//! (authoritative), then audit. A crash between the two deletes can leave an
//! orphaned blob but never a record that points at nothing.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use tenderbox_core::{
    can_delete, Actor, AuditEventType, BlobStore, Error, FileIndex, FileRecord, Result,
};

use crate::services::AuditAppender;

const NOT_FOUND: &str = "File metadata not found in database.";

#[derive(Clone)]
pub struct DeletionCoordinator {
    files: Arc<dyn FileIndex>,
    blobs: Arc<dyn BlobStore>,
    audit: AuditAppender,
}

impl DeletionCoordinator {
    pub fn new(files: Arc<dyn FileIndex>, blobs: Arc<dyn BlobStore>, audit: AuditAppender) -> Self {
        Self { files, blobs, audit }
    }

    /// Delete a record and its blob. Returns the removed record.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<FileRecord> {
        let record = self
            .files
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))?;

        if !can_delete(&record, actor) {
            return Err(Error::Forbidden(
                "Permission denied. You can only delete files you uploaded, or you must be a director."
                    .to_string(),
            ));
        }

        if let Some(key) = record.blob_key() {
            match self.blobs.delete(key).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => warn!(
                    subsystem = "api",
                    component = "deletion",
                    file_id = %id,
                    storage_key = %key,
                    "Blob already absent, deleting metadata anyway"
                ),
                Err(e) => warn!(
                    subsystem = "api",
                    component = "deletion",
                    file_id = %id,
                    storage_key = %key,
                    error = %e,
                    "Blob delete failed, deleting metadata anyway"
                ),
            }
        }

        if !self.files.delete(id).await? {
            // Another request removed it between our read and delete.
            return Err(Error::NotFound(NOT_FOUND.to_string()));
        }

        self.audit
            .append(
                AuditEventType::deleted(&record),
                actor,
                format!("{} deleted: {}", record.kind_label(), record.original_name),
                record.proposal_id.clone(),
                None,
            )
            .await;

        info!(
            subsystem = "api",
            component = "deletion",
            file_id = %id,
            actor_uid = %actor.uid,
            role = %actor.role,
            "Record deleted"
        );
        Ok(record)
    }
}
