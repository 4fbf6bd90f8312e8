//! Listing service: picks the source query for a GET and filters it.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use tenderbox_core::defaults::{LIST_SOURCE_LIMIT, PARENT_ID_BATCH_LIMIT};
use tenderbox_core::{
    can_view, ensure_proposal_owner, filter_visible, Actor, Error, FileFilter, FileIndex,
    FileQuery, FileRecord, FileView, ParentLookup, ProposalStore, Result,
};

#[derive(Clone)]
pub struct ListingService {
    files: Arc<dyn FileIndex>,
    proposals: Arc<dyn ProposalStore>,
}

impl ListingService {
    pub fn new(files: Arc<dyn FileIndex>, proposals: Arc<dyn ProposalStore>) -> Self {
        Self { files, proposals }
    }

    /// Single record with access flags.
    pub async fn get_one(&self, id: Uuid, actor: &Actor) -> Result<FileView> {
        let record = self
            .files
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound("File not found".to_string()))?;

        let mut lookup = ParentLookup::new(self.proposals.as_ref());
        if !can_view(&record, actor, None, &mut lookup).await {
            return Err(Error::Forbidden(
                "Access denied. You do not have permission to view this file.".to_string(),
            ));
        }
        Ok(FileView::new(record, actor))
    }

    /// Records attached to one proposal.
    pub async fn list_for_proposal(&self, proposal_id: &str, actor: &Actor) -> Result<Vec<FileView>> {
        ensure_proposal_owner(
            self.proposals.as_ref(),
            actor,
            proposal_id,
            "Access denied. You can only view files from your own proposals.",
        )
        .await?;

        let records = self
            .files
            .query(FileQuery::new(
                FileFilter::Proposal(proposal_id.to_string()),
                LIST_SOURCE_LIMIT,
            ))
            .await?;

        let mut lookup = ParentLookup::new(self.proposals.as_ref());
        Ok(filter_visible(records, actor, &mut lookup).await)
    }

    /// Role-appropriate listing with no parameters.
    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<FileView>> {
        let records = if actor.is_bdm() {
            self.records_for_owned_proposals(actor).await?
        } else {
            self.files
                .query(FileQuery::new(FileFilter::All, LIST_SOURCE_LIMIT))
                .await?
        };

        let mut lookup = ParentLookup::new(self.proposals.as_ref());
        Ok(filter_visible(records, actor, &mut lookup).await)
    }

    /// Newest records across every proposal the BDM created, paged by the
    /// index's batch-query limit.
    async fn records_for_owned_proposals(&self, actor: &Actor) -> Result<Vec<FileRecord>> {
        let ids = self.proposals.ids_created_by(&actor.uid).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for chunk in ids.chunks(PARENT_ID_BATCH_LIMIT) {
            let page = self
                .files
                .query(FileQuery::new(
                    FileFilter::ProposalIn(chunk.to_vec()),
                    LIST_SOURCE_LIMIT,
                ))
                .await?;
            records.extend(page);
        }

        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        records.truncate(LIST_SOURCE_LIMIT as usize);

        debug!(
            subsystem = "api",
            component = "listing",
            actor_uid = %actor.uid,
            proposals = ids.len(),
            pages = ids.len().div_ceil(PARENT_ID_BATCH_LIMIT),
            result_count = records.len(),
            "Merged owned-proposal pages"
        );
        Ok(records)
    }
}
