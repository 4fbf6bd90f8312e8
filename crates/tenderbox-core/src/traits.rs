//! Core traits for tenderbox collaborators.
//!
//! These traits define the interfaces that concrete stores must satisfy.
//! Services receive them as `Arc<dyn Trait>` so that in-memory fakes can
//! stand in for PostgreSQL and the filesystem in tests.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// METADATA INDEX
// =============================================================================

/// Which records a [`FileQuery`] selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFilter {
    /// Every record.
    All,
    /// Records attached to one proposal.
    Proposal(String),
    /// Records attached to any of the given proposals.
    ///
    /// Callers keep the list within [`crate::defaults::PARENT_ID_BATCH_LIMIT`].
    ProposalIn(Vec<String>),
}

/// Query over the metadata index, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    pub filter: FileFilter,
    pub limit: i64,
}

impl FileQuery {
    pub fn new(filter: FileFilter, limit: i64) -> Self {
        Self { filter, limit }
    }
}

/// Records committed together by [`FileIndex::commit_batch`].
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub files: Vec<FileRecord>,
    pub events: Vec<AuditEvent>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: FileRecord, event: AuditEvent) {
        self.files.push(file);
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.events.is_empty()
    }
}

/// Metadata index holding one record per uploaded file or link.
#[async_trait]
pub trait FileIndex: Send + Sync {
    /// Fetch a record by ID.
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>>;

    /// Query records ordered by `uploaded_at` descending.
    async fn query(&self, query: FileQuery) -> Result<Vec<FileRecord>>;

    /// Insert a single record.
    async fn insert(&self, record: &FileRecord) -> Result<()>;

    /// Commit file records and audit events atomically: all or nothing.
    async fn commit_batch(&self, batch: WriteBatch) -> Result<()>;

    /// Delete a record. Returns false when no record had that ID.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// BLOB STORE
// =============================================================================

/// Object storage for uploaded file contents.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under `key`.
    async fn save(&self, key: &str, content_type: &str, data: Bytes) -> Result<()>;

    /// Delete the blob under `key`.
    ///
    /// A missing blob must surface as an error for which
    /// [`crate::Error::is_not_found`] is true.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Public URL under which the blob is served.
    fn public_url(&self, key: &str) -> String;
}

// =============================================================================
// PARENT ENTITY STORE
// =============================================================================

/// Read access to proposals, owned by the proposal system.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Fetch a proposal by ID.
    async fn get(&self, id: &str) -> Result<Option<Proposal>>;

    /// IDs of proposals created by `uid`.
    async fn ids_created_by(&self, uid: &str) -> Result<Vec<String>>;
}

// =============================================================================
// AUDIT LOG
// =============================================================================

/// Durable, append-only activity log.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, event: &AuditEvent) -> Result<()>;
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

/// Resolves a bearer token to the acting user.
#[async_trait]
pub trait ActorResolver: Send + Sync {
    /// `Ok(None)` when the token is unknown or revoked.
    async fn resolve(&self, token: &str) -> Result<Option<Actor>>;
}
