//! Link batch writer.
//!
//! All accepted links and their audit events are committed in one batch, so
//! either every record is visible afterwards or none is.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use tenderbox_core::defaults::LINK_MIME_TYPE;
use tenderbox_core::models::proposal_suffix;
use tenderbox_core::{
    ensure_proposal_owner, Actor, AuditEvent, AuditEventType, Error, FileIndex, FileRecord,
    FileType, ProposalStore, Result, WriteBatch,
};

/// One external link as submitted.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct LinkInput {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// JSON body of a link batch.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkBatchRequest {
    pub links: Option<Vec<LinkInput>>,
    pub proposal_id: Option<String>,
}

#[derive(Clone)]
pub struct LinkBatchWriter {
    files: Arc<dyn FileIndex>,
    proposals: Arc<dyn ProposalStore>,
}

impl LinkBatchWriter {
    pub fn new(files: Arc<dyn FileIndex>, proposals: Arc<dyn ProposalStore>) -> Self {
        Self { files, proposals }
    }

    /// Persist every link that has a url. Entries without one are skipped.
    pub async fn add_links(&self, actor: &Actor, request: LinkBatchRequest) -> Result<Vec<FileRecord>> {
        let links = match request.links {
            Some(links) if !links.is_empty() => links,
            _ => return Err(Error::NoLinksProvided),
        };
        let proposal_id = request.proposal_id.filter(|id| !id.is_empty());

        if let Some(id) = proposal_id.as_deref() {
            ensure_proposal_owner(
                self.proposals.as_ref(),
                actor,
                id,
                "You can only add links to your own proposals.",
            )
            .await?;
        }

        let submitted = links.len();
        let mut batch = WriteBatch::new();
        let mut created = Vec::with_capacity(submitted);

        for link in links {
            let Some(url) = link.url.filter(|u| !u.is_empty()) else {
                debug!(subsystem = "api", component = "link_batch", "Skipping link without url");
                continue;
            };
            let label = link.title.filter(|t| !t.is_empty()).unwrap_or_else(|| url.clone());

            let record = FileRecord {
                id: Uuid::now_v7(),
                file_name: None,
                original_name: label.clone(),
                url,
                mime_type: LINK_MIME_TYPE.to_string(),
                file_size: 0,
                proposal_id: proposal_id.clone(),
                file_type: Some(FileType::Link),
                link_description: Some(link.description.unwrap_or_default()),
                uploaded_at: chrono::Utc::now(),
                uploaded_by_uid: actor.uid.clone(),
                uploaded_by_name: actor.name.clone(),
                uploaded_by_role: actor.role,
            };
            let event = AuditEvent::new(
                AuditEventType::LinkAdded,
                actor,
                format!("Link added: {}{}", label, proposal_suffix(proposal_id.as_deref())),
                proposal_id.clone(),
                Some(record.id),
            );
            created.push(record.clone());
            batch.add(record, event);
        }

        self.files.commit_batch(batch).await?;

        info!(
            subsystem = "api",
            component = "link_batch",
            actor_uid = %actor.uid,
            proposal_id = ?proposal_id,
            submitted,
            result_count = created.len(),
            "Link batch committed"
        );
        Ok(created)
    }
}
