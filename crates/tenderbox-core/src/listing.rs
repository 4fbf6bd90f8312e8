//! Listing filter: applies the view policy across a batch of records.

use tracing::debug;

use crate::models::{Actor, FileRecord, FileView};
use crate::policy::{can_view, ParentLookup};

/// Keep the records `actor` may see, in input order, with access flags.
///
/// Denied records are dropped outright so their existence does not leak.
/// Parent proposals are resolved through `lookup`, which fetches each
/// distinct proposal once; a failed lookup only removes the records that
/// hang off that proposal.
pub async fn filter_visible(
    files: Vec<FileRecord>,
    actor: &Actor,
    lookup: &mut ParentLookup<'_>,
) -> Vec<FileView> {
    let input = files.len();
    let mut visible = Vec::with_capacity(input);

    for file in files {
        if can_view(&file, actor, None, lookup).await {
            visible.push(FileView::new(file, actor));
        }
    }

    debug!(
        subsystem = "policy",
        component = "listing",
        actor_uid = %actor.uid,
        role = %actor.role,
        input,
        result_count = visible.len(),
        parent_lookups = lookup.lookups(),
        "Filtered listing"
    );
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryProposalStore;
    use crate::models::{FileType, Proposal, ProposalStatus, Role};
    use crate::policy::{decide, ParentResolution};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn file(n: i64, file_type: FileType, proposal_id: Option<&str>, uploader: &str) -> FileRecord {
        FileRecord {
            id: Uuid::now_v7(),
            file_name: Some(format!("k{}", n)),
            original_name: format!("f{}.pdf", n),
            url: format!("http://blobs/k{}", n),
            mime_type: "application/pdf".to_string(),
            file_size: n,
            proposal_id: proposal_id.map(str::to_string),
            file_type: Some(file_type),
            link_description: None,
            uploaded_at: Utc::now() - Duration::seconds(n),
            uploaded_by_uid: uploader.to_string(),
            uploaded_by_name: "U".to_string(),
            uploaded_by_role: Role::Estimator,
        }
    }

    fn store() -> MemoryProposalStore {
        let store = MemoryProposalStore::new();
        store.insert(Proposal {
            id: "p1".to_string(),
            created_by_uid: "u1".to_string(),
            status: ProposalStatus::Draft,
        });
        store.insert(Proposal {
            id: "p2".to_string(),
            created_by_uid: "u2".to_string(),
            status: ProposalStatus::Won,
        });
        store
    }

    #[tokio::test]
    async fn test_bdm_sees_only_own_non_embargoed_records() {
        let store = store();
        let bdm = Actor::new("u1", Role::Bdm, "Bea");
        let files = vec![
            file(1, FileType::Project, Some("p1"), "u1"),
            file(2, FileType::Estimation, Some("p1"), "e1"),
            file(3, FileType::Project, Some("p2"), "u2"),
            file(4, FileType::General, None, "c1"),
            file(5, FileType::Link, Some("p1"), "u1"),
        ];

        let mut lookup = ParentLookup::new(&store);
        let visible = filter_visible(files, &bdm, &mut lookup).await;

        let names: Vec<_> = visible.iter().map(|v| v.record.original_name.as_str()).collect();
        assert_eq!(names, vec!["f1.pdf", "f5.pdf"]);
        assert!(visible[0].access.can_download);
        assert!(!visible[1].access.can_download);
        assert!(visible.iter().all(|v| v.access.can_view && v.access.can_delete));
    }

    #[tokio::test]
    async fn test_one_fetch_per_distinct_parent() {
        let store = store();
        let coo = Actor::new("c1", Role::Coo, "Cy");
        let files = (0..6)
            .map(|n| file(n, FileType::Project, Some(if n % 2 == 0 { "p1" } else { "p2" }), "u1"))
            .collect();

        let mut lookup = ParentLookup::new(&store);
        let visible = filter_visible(files, &coo, &mut lookup).await;

        assert_eq!(visible.len(), 6);
        assert_eq!(store.get_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_parent_only_drops_its_records() {
        let store = store();
        store.fail_lookups_for("p2");
        let director = Actor::new("d1", Role::Director, "Dee");
        let files = vec![
            file(1, FileType::Project, Some("p2"), "u2"),
            file(2, FileType::Project, Some("p1"), "u1"),
            file(3, FileType::Estimation, Some("p2"), "e1"),
            file(4, FileType::General, None, "c1"),
        ];

        let mut lookup = ParentLookup::new(&store);
        let visible = filter_visible(files, &director, &mut lookup).await;

        let sizes: Vec<_> = visible.iter().map(|v| v.record.file_size).collect();
        assert_eq!(sizes, vec![2, 4]);
        assert_eq!(store.get_calls(), 2);
        assert!(visible.iter().all(|v| v.access.can_delete));
    }

    #[tokio::test]
    async fn test_never_returns_a_denied_record() {
        let store = store();
        let types = [FileType::Project, FileType::Estimation, FileType::General, FileType::Link];
        let parents = [None, Some("p1"), Some("p2"), Some("gone")];
        let mut files = Vec::new();
        let mut n = 0;
        for ft in types {
            for parent in parents {
                n += 1;
                files.push(file(n, ft, parent, "u9"));
            }
        }

        for role in [Role::Bdm, Role::Estimator, Role::Coo, Role::Director] {
            let actor = Actor::new("u1", role, "A");
            let mut lookup = ParentLookup::new(&store);
            let visible = filter_visible(files.clone(), &actor, &mut lookup).await;

            for view in &visible {
                let parent_id = view.record.proposal_id.as_deref();
                let proposal = match parent_id {
                    Some(id) => store.snapshot(id),
                    None => None,
                };
                let parent = match (parent_id, proposal.as_ref()) {
                    (None, _) => ParentResolution::NoParent,
                    (Some(_), Some(p)) => ParentResolution::Found(p),
                    (Some(_), None) => ParentResolution::Missing,
                };
                assert!(decide(&view.record, &actor, parent));
                assert_eq!(view.access.can_delete, view.record.uploaded_by_uid == "u1" || role == Role::Director);
            }
        }
    }

    #[tokio::test]
    async fn test_preserves_input_order() {
        let store = store();
        let estimator = Actor::new("e1", Role::Estimator, "Eve");
        let files: Vec<_> = (1..=5).map(|n| file(n, FileType::Estimation, Some("p1"), "e1")).collect();
        let ids: Vec<_> = files.iter().map(|f| f.id).collect();

        let mut lookup = ParentLookup::new(&store);
        let visible = filter_visible(files, &estimator, &mut lookup).await;

        let out: Vec<_> = visible.iter().map(|v| v.record.id).collect();
        assert_eq!(out, ids);
    }
}
