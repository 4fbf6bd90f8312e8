//! Access policy for files and links attached to proposals.
//!
//! Two families of rules live here and are kept apart on purpose:
//!
//! - **View policy** ([`decide`]): fail-closed. A lookup failure, a missing
//!   parent for a BDM, or an unhandled category all deny.
//! - **Upload category policies** ([`enforce_estimation_uploader`],
//!   [`downgrade_project_category`]): the estimation rule rejects, the
//!   project rule silently reclassifies when no proposal is named.
//!
//! Deletion rights are not part of either; see [`crate::models::can_delete`].

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Actor, FileRecord, FileType, Proposal, Role};
use crate::traits::ProposalStore;

// =============================================================================
// VIEW POLICY
// =============================================================================

/// Outcome of looking up a record's parent proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentResolution<'a> {
    /// The record names no proposal.
    NoParent,
    /// The record names a proposal that no longer exists.
    Missing,
    Found(&'a Proposal),
    /// The proposal store errored.
    LookupFailed,
}

/// Proposal ID governing a record: its own, else the caller's context.
pub fn effective_parent_id<'a>(file: &'a FileRecord, context_id: Option<&'a str>) -> Option<&'a str> {
    file.proposal_id.as_deref().or(context_id)
}

/// Whether `actor` may see `file`, given its resolved parent.
pub fn decide(file: &FileRecord, actor: &Actor, parent: ParentResolution<'_>) -> bool {
    if parent == ParentResolution::LookupFailed {
        return false;
    }

    // BDM isolation dominates every other rule.
    let owned_parent = match parent {
        ParentResolution::Found(proposal) if proposal.is_owned_by(actor) => Some(proposal),
        _ => None,
    };
    if actor.role == Role::Bdm && owned_parent.is_none() {
        return false;
    }

    if parent == ParentResolution::NoParent {
        return true;
    }

    match file.file_type {
        None | Some(FileType::Project) | Some(FileType::Link) => true,
        Some(FileType::Estimation) => match actor.role {
            Role::Estimator | Role::Coo | Role::Director => true,
            Role::Bdm => owned_parent
                .map(|p| p.status.lifts_estimation_embargo())
                .unwrap_or(false),
        },
        Some(FileType::General) => false,
    }
}

#[derive(Debug, Clone)]
enum CachedParent {
    Found(Proposal),
    Missing,
    Failed,
}

/// Request-scoped memo of parent proposal lookups.
///
/// Each distinct proposal ID is fetched at most once per instance, failures
/// included. Create one per request and drop it with the request.
pub struct ParentLookup<'a> {
    store: &'a dyn ProposalStore,
    cache: HashMap<String, CachedParent>,
}

impl<'a> ParentLookup<'a> {
    pub fn new(store: &'a dyn ProposalStore) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    /// Resolve a proposal ID, consulting the store only on a cache miss.
    pub async fn resolve(&mut self, id: Option<&str>) -> ParentResolution<'_> {
        let Some(id) = id else {
            return ParentResolution::NoParent;
        };

        if !self.cache.contains_key(id) {
            let entry = match self.store.get(id).await {
                Ok(Some(proposal)) => CachedParent::Found(proposal),
                Ok(None) => CachedParent::Missing,
                Err(e) => {
                    warn!(
                        subsystem = "policy",
                        component = "parent_lookup",
                        proposal_id = %id,
                        error = %e,
                        "Parent proposal lookup failed, denying dependent records"
                    );
                    CachedParent::Failed
                }
            };
            self.cache.insert(id.to_string(), entry);
        }

        match self.cache.get(id) {
            Some(CachedParent::Found(p)) => ParentResolution::Found(p),
            Some(CachedParent::Missing) => ParentResolution::Missing,
            Some(CachedParent::Failed) | None => ParentResolution::LookupFailed,
        }
    }

    /// Number of distinct proposal IDs looked up so far.
    pub fn lookups(&self) -> usize {
        self.cache.len()
    }
}

/// Resolve the parent and apply [`decide`].
pub async fn can_view(
    file: &FileRecord,
    actor: &Actor,
    context_id: Option<&str>,
    lookup: &mut ParentLookup<'_>,
) -> bool {
    let parent_id = effective_parent_id(file, context_id);
    let parent = lookup.resolve(parent_id).await;
    let allowed = decide(file, actor, parent);
    debug!(
        subsystem = "policy",
        file_id = %file.id,
        actor_uid = %actor.uid,
        role = %actor.role,
        allowed,
        "View decision"
    );
    allowed
}

// =============================================================================
// OWNERSHIP
// =============================================================================

/// BDMs may only attach to or list proposals they created.
///
/// Other roles pass unconditionally. A nonexistent proposal is treated the
/// same as someone else's.
pub async fn ensure_proposal_owner(
    store: &dyn ProposalStore,
    actor: &Actor,
    proposal_id: &str,
    denied_message: &str,
) -> Result<()> {
    if actor.role != Role::Bdm {
        return Ok(());
    }
    match store.get(proposal_id).await? {
        Some(proposal) if proposal.is_owned_by(actor) => Ok(()),
        _ => Err(Error::Forbidden(denied_message.to_string())),
    }
}

// =============================================================================
// UPLOAD CATEGORY POLICIES
// =============================================================================

/// Strict: only estimators may upload estimation files.
pub fn enforce_estimation_uploader(actor: &Actor, category: FileType) -> Result<()> {
    if category == FileType::Estimation && actor.role != Role::Estimator {
        return Err(Error::Forbidden(
            "Only Estimators can upload Estimation files.".to_string(),
        ));
    }
    Ok(())
}

/// Permissive: non-BDM project uploads become general files, unless they
/// target a proposal, which is rejected.
pub fn downgrade_project_category(
    actor: &Actor,
    category: FileType,
    proposal_id: Option<&str>,
) -> Result<FileType> {
    if category != FileType::Project || actor.role == Role::Bdm {
        return Ok(category);
    }
    if proposal_id.is_some() {
        return Err(Error::Forbidden(
            "Only BDMs can upload Project files to proposals.".to_string(),
        ));
    }
    debug!(
        subsystem = "policy",
        actor_uid = %actor.uid,
        role = %actor.role,
        "Reclassifying project upload as general"
    );
    Ok(FileType::General)
}

/// Category for an upload: requested or role default, then both category
/// policies in order.
pub fn resolve_upload_category(
    actor: &Actor,
    requested: Option<FileType>,
    proposal_id: Option<&str>,
) -> Result<FileType> {
    let category = requested.unwrap_or_else(|| FileType::default_for(actor.role));
    if category == FileType::Link {
        return Err(Error::InvalidInput(
            "Links are added with a JSON body, not uploaded".to_string(),
        ));
    }
    enforce_estimation_uploader(actor, category)?;
    downgrade_project_category(actor, category, proposal_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProposalStatus;
    use chrono::Utc;
    use uuid::Uuid;

    const ALL_TYPES: [Option<FileType>; 5] = [
        None,
        Some(FileType::Project),
        Some(FileType::Estimation),
        Some(FileType::General),
        Some(FileType::Link),
    ];

    fn file(file_type: Option<FileType>, proposal_id: Option<&str>) -> FileRecord {
        FileRecord {
            id: Uuid::now_v7(),
            file_name: Some("k".to_string()),
            original_name: "f.pdf".to_string(),
            url: "http://blobs/k".to_string(),
            mime_type: "application/pdf".to_string(),
            file_size: 1,
            proposal_id: proposal_id.map(str::to_string),
            file_type,
            link_description: None,
            uploaded_at: Utc::now(),
            uploaded_by_uid: "someone".to_string(),
            uploaded_by_name: "Someone".to_string(),
            uploaded_by_role: Role::Estimator,
        }
    }

    fn proposal(owner: &str, status: ProposalStatus) -> Proposal {
        Proposal {
            id: "p1".to_string(),
            created_by_uid: owner.to_string(),
            status,
        }
    }

    fn actor(uid: &str, role: Role) -> Actor {
        Actor::new(uid, role, "Name")
    }

    #[test]
    fn test_unlinked_non_estimation_visible_to_non_bdm() {
        for role in [Role::Estimator, Role::Coo, Role::Director] {
            for ft in ALL_TYPES {
                if ft == Some(FileType::Estimation) {
                    continue;
                }
                assert!(decide(&file(ft, None), &actor("x", role), ParentResolution::NoParent));
            }
        }
    }

    #[test]
    fn test_unlinked_estimation_visible_to_non_bdm() {
        for role in [Role::Estimator, Role::Coo, Role::Director] {
            let f = file(Some(FileType::Estimation), None);
            assert!(decide(&f, &actor("x", role), ParentResolution::NoParent));
        }
    }

    #[test]
    fn test_bdm_denied_on_foreign_proposal_for_every_type() {
        let p = proposal("owner", ProposalStatus::Won);
        for ft in ALL_TYPES {
            let f = file(ft, Some("p1"));
            assert!(!decide(&f, &actor("intruder", Role::Bdm), ParentResolution::Found(&p)));
        }
    }

    #[test]
    fn test_bdm_denied_without_parent() {
        for ft in ALL_TYPES {
            assert!(!decide(&file(ft, None), &actor("u1", Role::Bdm), ParentResolution::NoParent));
            assert!(!decide(&file(ft, Some("p1")), &actor("u1", Role::Bdm), ParentResolution::Missing));
        }
    }

    #[test]
    fn test_estimation_embargo_for_owning_bdm() {
        let bdm = actor("u1", Role::Bdm);
        let f = file(Some(FileType::Estimation), Some("p1"));

        let draft = proposal("u1", ProposalStatus::Draft);
        assert!(!decide(&f, &bdm, ParentResolution::Found(&draft)));

        let won = proposal("u1", ProposalStatus::Won);
        assert!(decide(&f, &bdm, ParentResolution::Found(&won)));

        let submitted = proposal("u1", ProposalStatus::SubmittedToClient);
        assert!(decide(&f, &bdm, ParentResolution::Found(&submitted)));

        let approved = proposal("u1", ProposalStatus::Approved);
        assert!(decide(&f, &bdm, ParentResolution::Found(&approved)));
    }

    #[test]
    fn test_owning_bdm_sees_project_and_links() {
        let bdm = actor("u1", Role::Bdm);
        let p = proposal("u1", ProposalStatus::Draft);
        for ft in [None, Some(FileType::Project), Some(FileType::Link)] {
            assert!(decide(&file(ft, Some("p1")), &bdm, ParentResolution::Found(&p)));
        }
    }

    #[test]
    fn test_general_file_on_proposal_is_default_denied() {
        let p = proposal("u1", ProposalStatus::Won);
        let f = file(Some(FileType::General), Some("p1"));
        for role in [Role::Bdm, Role::Estimator, Role::Coo, Role::Director] {
            assert!(!decide(&f, &actor("u1", role), ParentResolution::Found(&p)));
        }
    }

    #[test]
    fn test_orphaned_file_falls_through_for_non_bdm() {
        let coo = actor("c1", Role::Coo);
        assert!(decide(&file(Some(FileType::Project), Some("gone")), &coo, ParentResolution::Missing));
        assert!(decide(&file(Some(FileType::Estimation), Some("gone")), &coo, ParentResolution::Missing));
        assert!(!decide(&file(Some(FileType::General), Some("gone")), &coo, ParentResolution::Missing));
    }

    #[test]
    fn test_lookup_failure_denies_everyone() {
        for role in [Role::Bdm, Role::Estimator, Role::Coo, Role::Director] {
            for ft in ALL_TYPES {
                let f = file(ft, Some("p1"));
                assert!(!decide(&f, &actor("u1", role), ParentResolution::LookupFailed));
            }
        }
    }

    #[test]
    fn test_effective_parent_prefers_record() {
        let f = file(None, Some("own"));
        assert_eq!(effective_parent_id(&f, Some("ctx")), Some("own"));
        let f = file(None, None);
        assert_eq!(effective_parent_id(&f, Some("ctx")), Some("ctx"));
        assert_eq!(effective_parent_id(&f, None), None);
    }

    #[test]
    fn test_default_categories() {
        assert_eq!(
            resolve_upload_category(&actor("b", Role::Bdm), None, Some("p1")).unwrap(),
            FileType::Project
        );
        assert_eq!(
            resolve_upload_category(&actor("e", Role::Estimator), None, Some("p1")).unwrap(),
            FileType::Estimation
        );
        assert_eq!(
            resolve_upload_category(&actor("c", Role::Coo), None, None).unwrap(),
            FileType::General
        );
    }

    #[test]
    fn test_estimation_upload_is_strict() {
        for role in [Role::Bdm, Role::Coo, Role::Director] {
            let err = resolve_upload_category(&actor("x", role), Some(FileType::Estimation), None)
                .unwrap_err();
            assert!(matches!(err, Error::Forbidden(_)));
        }
    }

    #[test]
    fn test_project_upload_downgrades_without_proposal() {
        let director = actor("d", Role::Director);
        assert_eq!(
            resolve_upload_category(&director, Some(FileType::Project), None).unwrap(),
            FileType::General
        );
        let err = resolve_upload_category(&director, Some(FileType::Project), Some("p1")).unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn test_link_category_rejected_for_uploads() {
        let err = resolve_upload_category(&actor("c", Role::Coo), Some(FileType::Link), None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
