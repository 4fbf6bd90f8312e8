//! In-memory collaborators for deterministic testing.
//!
//! Each fake implements one of the collaborator traits and supports simple
//! fault injection so tests can exercise partial-failure paths.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tenderbox_core::mock::{MemoryBlobStore, MemoryFileIndex};
//!
//! let blobs = MemoryBlobStore::new();
//! blobs.fail_saves_matching("broken");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Actor, AuditEvent, FileRecord, Proposal};
use crate::traits::{
    ActorResolver, AuditLog, BlobStore, FileFilter, FileIndex, FileQuery, ProposalStore,
    WriteBatch,
};

// =============================================================================
// METADATA INDEX
// =============================================================================

#[derive(Default)]
struct IndexFaults {
    fail_batches: bool,
    fail_queries: bool,
    fail_inserts_named: HashSet<String>,
}

/// In-memory [`FileIndex`].
///
/// Batch commits write their audit events into the attached
/// [`MemoryAuditLog`], mirroring a database where both live side by side.
#[derive(Default)]
pub struct MemoryFileIndex {
    records: Mutex<HashMap<Uuid, FileRecord>>,
    audit: Option<Arc<MemoryAuditLog>>,
    faults: Mutex<IndexFaults>,
}

impl MemoryFileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route batch-committed audit events into `log`.
    pub fn with_audit_log(mut self, log: Arc<MemoryAuditLog>) -> Self {
        self.audit = Some(log);
        self
    }

    /// Make every `commit_batch` fail without persisting anything.
    pub fn fail_batches(&self) {
        self.faults.lock().expect("lock poisoned").fail_batches = true;
    }

    /// Make every `query` fail.
    pub fn fail_queries(&self) {
        self.faults.lock().expect("lock poisoned").fail_queries = true;
    }

    /// Make `insert` fail for records with this original name.
    pub fn fail_inserts_named(&self, original_name: &str) {
        self.faults
            .lock()
            .expect("lock poisoned")
            .fail_inserts_named
            .insert(original_name.to_string());
    }

    /// Seed a record directly.
    pub fn seed(&self, record: FileRecord) {
        self.records
            .lock()
            .expect("lock poisoned")
            .insert(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.records.lock().expect("lock poisoned").contains_key(&id)
    }
}

#[async_trait]
impl FileIndex for MemoryFileIndex {
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>> {
        Ok(self.records.lock().expect("lock poisoned").get(&id).cloned())
    }

    async fn query(&self, query: FileQuery) -> Result<Vec<FileRecord>> {
        if self.faults.lock().expect("lock poisoned").fail_queries {
            return Err(Error::Internal("injected query failure".to_string()));
        }
        let records = self.records.lock().expect("lock poisoned");
        let mut matched: Vec<FileRecord> = records
            .values()
            .filter(|r| match &query.filter {
                FileFilter::All => true,
                FileFilter::Proposal(id) => r.proposal_id.as_deref() == Some(id.as_str()),
                FileFilter::ProposalIn(ids) => r
                    .proposal_id
                    .as_ref()
                    .map(|p| ids.contains(p))
                    .unwrap_or(false),
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        matched.truncate(query.limit.max(0) as usize);
        Ok(matched)
    }

    async fn insert(&self, record: &FileRecord) -> Result<()> {
        if self
            .faults
            .lock()
            .expect("lock poisoned")
            .fail_inserts_named
            .contains(&record.original_name)
        {
            return Err(Error::Internal("injected insert failure".to_string()));
        }
        self.seed(record.clone());
        Ok(())
    }

    async fn commit_batch(&self, batch: WriteBatch) -> Result<()> {
        if self.faults.lock().expect("lock poisoned").fail_batches {
            return Err(Error::Internal("injected batch failure".to_string()));
        }
        let mut records = self.records.lock().expect("lock poisoned");
        for file in batch.files {
            records.insert(file.id, file);
        }
        if let Some(log) = &self.audit {
            log.events.lock().expect("lock poisoned").extend(batch.events);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self
            .records
            .lock()
            .expect("lock poisoned")
            .remove(&id)
            .is_some())
    }
}

// =============================================================================
// BLOB STORE
// =============================================================================

/// Stored blob with its content type.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub content_type: String,
    pub data: Bytes,
}

/// In-memory [`BlobStore`].
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, StoredBlob>>,
    fail_saves_matching: Mutex<Vec<String>>,
    fail_deletes: Mutex<bool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `save` for keys containing `fragment`.
    pub fn fail_saves_matching(&self, fragment: &str) {
        self.fail_saves_matching
            .lock()
            .expect("lock poisoned")
            .push(fragment.to_string());
    }

    /// Fail every `delete` with a non-NotFound error.
    pub fn fail_deletes(&self) {
        *self.fail_deletes.lock().expect("lock poisoned") = true;
    }

    pub fn get(&self, key: &str) -> Option<StoredBlob> {
        self.blobs.lock().expect("lock poisoned").get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().expect("lock poisoned").contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a blob behind the service's back.
    pub fn evict(&self, key: &str) {
        self.blobs.lock().expect("lock poisoned").remove(key);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(&self, key: &str, content_type: &str, data: Bytes) -> Result<()> {
        let failing = self
            .fail_saves_matching
            .lock()
            .expect("lock poisoned")
            .iter()
            .any(|f| key.contains(f.as_str()));
        if failing {
            return Err(Error::Storage(format!("injected save failure for {}", key)));
        }
        self.blobs.lock().expect("lock poisoned").insert(
            key.to_string(),
            StoredBlob {
                content_type: content_type.to_string(),
                data,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if *self.fail_deletes.lock().expect("lock poisoned") {
            return Err(Error::Storage(format!("injected delete failure for {}", key)));
        }
        match self.blobs.lock().expect("lock poisoned").remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!("blob {}", key))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://blobs/{}", key)
    }
}

// =============================================================================
// PARENT ENTITY STORE
// =============================================================================

/// In-memory [`ProposalStore`] that counts lookups.
#[derive(Default)]
pub struct MemoryProposalStore {
    proposals: Mutex<HashMap<String, Proposal>>,
    failing: Mutex<HashSet<String>>,
    get_calls: AtomicUsize,
}

impl MemoryProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, proposal: Proposal) {
        self.proposals
            .lock()
            .expect("lock poisoned")
            .insert(proposal.id.clone(), proposal);
    }

    pub fn remove(&self, id: &str) {
        self.proposals.lock().expect("lock poisoned").remove(id);
    }

    /// Make lookups of `id` fail.
    pub fn fail_lookups_for(&self, id: &str) {
        self.failing
            .lock()
            .expect("lock poisoned")
            .insert(id.to_string());
    }

    /// Number of `get` calls made so far.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Current value without counting as a lookup.
    pub fn snapshot(&self, id: &str) -> Option<Proposal> {
        self.proposals.lock().expect("lock poisoned").get(id).cloned()
    }
}

#[async_trait]
impl ProposalStore for MemoryProposalStore {
    async fn get(&self, id: &str) -> Result<Option<Proposal>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().expect("lock poisoned").contains(id) {
            return Err(Error::Internal(format!("injected lookup failure for {}", id)));
        }
        Ok(self.snapshot(id))
    }

    async fn ids_created_by(&self, uid: &str) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .proposals
            .lock()
            .expect("lock poisoned")
            .values()
            .filter(|p| p.created_by_uid == uid)
            .map(|p| p.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

// =============================================================================
// AUDIT LOG
// =============================================================================

/// In-memory [`AuditLog`].
#[derive(Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<AuditEvent>>,
    fail: Mutex<bool>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every append fail.
    pub fn fail_appends(&self) {
        *self.fail.lock().expect("lock poisoned") = true;
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, event: &AuditEvent) -> Result<()> {
        if *self.fail.lock().expect("lock poisoned") {
            return Err(Error::Internal("injected audit failure".to_string()));
        }
        self.events
            .lock()
            .expect("lock poisoned")
            .push(event.clone());
        Ok(())
    }
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

/// Token table for tests.
#[derive(Default)]
pub struct StaticActorResolver {
    tokens: Mutex<HashMap<String, Actor>>,
}

impl StaticActorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, token: &str, actor: Actor) -> Self {
        self.tokens
            .lock()
            .expect("lock poisoned")
            .insert(token.to_string(), actor);
        self
    }
}

#[async_trait]
impl ActorResolver for StaticActorResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Actor>> {
        Ok(self.tokens.lock().expect("lock poisoned").get(token).cloned())
    }
}
