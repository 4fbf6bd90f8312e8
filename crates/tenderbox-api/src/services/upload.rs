//! Upload coordinator: validates a multi-file upload and stores each file.
//!
//! Validation and authorization happen for the whole call before any blob is
//! written. After that each file runs its own pipeline (blob write, public
//! URL, metadata insert, audit event) on a spawned task. Pipelines are
//! independent: one failing does not undo the others, and a dropped request
//! does not cancel them.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use tracing::{error, info};

use tenderbox_core::models::proposal_suffix;
use tenderbox_core::{
    ensure_proposal_owner, generate_storage_key, resolve_upload_category, validate_file_type,
    Actor, AuditEventType, BlobStore, Error, FileIndex, FileRecord, FileType, ProposalStore,
    Result,
};

use crate::services::AuditAppender;
use crate::state::UploadLimits;

/// One file part as received.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub proposal_id: Option<String>,
    /// Explicit category; the actor's role default applies when absent.
    pub file_type: Option<FileType>,
    pub files: Vec<IncomingFile>,
}

/// Records created by an upload, in submission order.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub created: Vec<FileRecord>,
    pub submitted: usize,
}

impl UploadOutcome {
    pub fn is_partial(&self) -> bool {
        self.created.len() < self.submitted
    }

    pub fn message(&self) -> String {
        if self.is_partial() {
            format!(
                "{} of {} file(s) uploaded successfully.",
                self.created.len(),
                self.submitted
            )
        } else {
            format!("{} file(s) uploaded successfully.", self.created.len())
        }
    }
}

#[derive(Clone)]
pub struct UploadCoordinator {
    files: Arc<dyn FileIndex>,
    blobs: Arc<dyn BlobStore>,
    proposals: Arc<dyn ProposalStore>,
    audit: AuditAppender,
    limits: UploadLimits,
}

/// Everything one pipeline needs, owned so it can move onto a task.
#[derive(Clone)]
struct Pipeline {
    files: Arc<dyn FileIndex>,
    blobs: Arc<dyn BlobStore>,
    audit: AuditAppender,
    actor: Actor,
    proposal_id: Option<String>,
    category: FileType,
}

impl UploadCoordinator {
    pub fn new(
        files: Arc<dyn FileIndex>,
        blobs: Arc<dyn BlobStore>,
        proposals: Arc<dyn ProposalStore>,
        audit: AuditAppender,
        limits: UploadLimits,
    ) -> Self {
        Self {
            files,
            blobs,
            proposals,
            audit,
            limits,
        }
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Reject an upload whose file set breaks the count, type or size limits.
    pub fn validate(&self, files: &[IncomingFile]) -> Result<()> {
        if files.is_empty() {
            return Err(Error::MissingFiles);
        }
        if files.len() > self.limits.max_files {
            return Err(Error::TooManyFiles {
                max: self.limits.max_files,
            });
        }
        for file in files {
            validate_file_type(&file.original_name, &file.content_type)?;
            if file.data.len() as u64 > self.limits.max_file_bytes {
                return Err(Error::FileTooLarge {
                    name: file.original_name.clone(),
                    max_bytes: self.limits.max_file_bytes,
                });
            }
        }
        Ok(())
    }

    pub async fn upload(&self, actor: &Actor, request: UploadRequest) -> Result<UploadOutcome> {
        self.validate(&request.files)?;

        let proposal_id = request.proposal_id;
        if let Some(id) = proposal_id.as_deref() {
            ensure_proposal_owner(
                self.proposals.as_ref(),
                actor,
                id,
                "You can only add files to your own proposals.",
            )
            .await?;
        }
        let category = resolve_upload_category(actor, request.file_type, proposal_id.as_deref())?;

        let pipeline = Pipeline {
            files: self.files.clone(),
            blobs: self.blobs.clone(),
            audit: self.audit.clone(),
            actor: actor.clone(),
            proposal_id,
            category,
        };

        let submitted = request.files.len();
        let tasks = request.files.into_iter().map(|file| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.store(file).await })
        });
        let results = join_all(tasks).await;

        let mut created = Vec::with_capacity(submitted);
        for result in results {
            match result {
                Ok(Ok(record)) => created.push(record),
                Ok(Err(_)) => {}
                Err(join_err) => error!(
                    subsystem = "api",
                    component = "upload",
                    error = %join_err,
                    "Upload pipeline task aborted"
                ),
            }
        }

        info!(
            subsystem = "api",
            component = "upload",
            actor_uid = %actor.uid,
            proposal_id = ?pipeline.proposal_id,
            category = %category,
            submitted,
            result_count = created.len(),
            "Upload finished"
        );

        if created.is_empty() {
            return Err(Error::Storage(format!(
                "all {} upload pipeline(s) failed",
                submitted
            )));
        }
        Ok(UploadOutcome { created, submitted })
    }
}

impl Pipeline {
    async fn store(self, file: IncomingFile) -> Result<FileRecord> {
        let key = generate_storage_key(self.proposal_id.as_deref(), &file.original_name);
        let size = file.data.len() as i64;

        if let Err(e) = self.blobs.save(&key, &file.content_type, file.data).await {
            error!(
                subsystem = "api",
                component = "upload",
                storage_key = %key,
                original_name = %file.original_name,
                error = %e,
                "Blob write failed"
            );
            return Err(e);
        }

        let record = FileRecord {
            id: uuid::Uuid::now_v7(),
            url: self.blobs.public_url(&key),
            file_name: Some(key),
            original_name: file.original_name,
            mime_type: file.content_type,
            file_size: size,
            proposal_id: self.proposal_id.clone(),
            file_type: Some(self.category),
            link_description: None,
            uploaded_at: chrono::Utc::now(),
            uploaded_by_uid: self.actor.uid.clone(),
            uploaded_by_name: self.actor.name.clone(),
            uploaded_by_role: self.actor.role,
        };

        if let Err(e) = self.files.insert(&record).await {
            error!(
                subsystem = "api",
                component = "upload",
                file_id = %record.id,
                storage_key = ?record.file_name,
                error = %e,
                "Metadata insert failed after blob write"
            );
            return Err(e);
        }

        let details = format!(
            "File uploaded: {}{} ({})",
            record.original_name,
            proposal_suffix(self.proposal_id.as_deref()),
            self.category
        );
        self.audit
            .append(
                AuditEventType::FileUploaded,
                &self.actor,
                details,
                self.proposal_id.clone(),
                Some(record.id),
            )
            .await;

        Ok(record)
    }
}
