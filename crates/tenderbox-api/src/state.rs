//! Shared application state handed to every handler.

use std::sync::Arc;

use tenderbox_core::{ActorResolver, AuditLog, BlobStore, FileIndex, ProposalStore};

use crate::services::{
    AuditAppender, DeletionCoordinator, LinkBatchWriter, ListingService, UploadCoordinator,
};

/// Per-call upload ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_bytes: u64,
    pub max_files: usize,
}

/// Collaborators the services are built from.
#[derive(Clone)]
pub struct Collaborators {
    pub files: Arc<dyn FileIndex>,
    pub blobs: Arc<dyn BlobStore>,
    pub proposals: Arc<dyn ProposalStore>,
    pub audit: Arc<dyn AuditLog>,
    pub actors: Arc<dyn ActorResolver>,
}

#[derive(Clone)]
pub struct AppState {
    pub actors: Arc<dyn ActorResolver>,
    pub listing: ListingService,
    pub uploads: UploadCoordinator,
    pub links: LinkBatchWriter,
    pub deletions: DeletionCoordinator,
    pub limits: UploadLimits,
}

impl AppState {
    pub fn new(collaborators: Collaborators, limits: UploadLimits) -> Self {
        let Collaborators {
            files,
            blobs,
            proposals,
            audit,
            actors,
        } = collaborators;
        let audit = AuditAppender::new(audit);

        Self {
            actors,
            listing: ListingService::new(files.clone(), proposals.clone()),
            uploads: UploadCoordinator::new(
                files.clone(),
                blobs.clone(),
                proposals.clone(),
                audit.clone(),
                limits,
            ),
            links: LinkBatchWriter::new(files.clone(), proposals),
            deletions: DeletionCoordinator::new(files, blobs, audit),
            limits,
        }
    }
}
