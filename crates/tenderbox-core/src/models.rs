//! Core data models for tenderbox.
//!
//! These types are shared across all tenderbox crates and represent
//! the core domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ACTOR TYPES
// =============================================================================

/// Organisational role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Business development manager. Owns proposals.
    Bdm,
    Estimator,
    Coo,
    Director,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bdm => write!(f, "bdm"),
            Self::Estimator => write!(f, "estimator"),
            Self::Coo => write!(f, "coo"),
            Self::Director => write!(f, "director"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bdm" => Ok(Self::Bdm),
            "estimator" => Ok(Self::Estimator),
            "coo" => Ok(Self::Coo),
            "director" => Ok(Self::Director),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// The authenticated user performing a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Actor {
    pub uid: String,
    pub role: Role,
    pub name: String,
}

impl Actor {
    pub fn new(uid: impl Into<String>, role: Role, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            role,
            name: name.into(),
        }
    }

    pub fn is_bdm(&self) -> bool {
        self.role == Role::Bdm
    }

    pub fn is_director(&self) -> bool {
        self.role == Role::Director
    }
}

// =============================================================================
// PROPOSAL TYPES
// =============================================================================

/// Lifecycle state of a proposal.
///
/// Values the proposal system introduces later are carried through `Other`
/// so that reads never fail on an unfamiliar status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProposalStatus {
    Draft,
    PendingEstimation,
    EstimationComplete,
    PendingApproval,
    Approved,
    SubmittedToClient,
    Won,
    Lost,
    Archived,
    Other(String),
}

impl ProposalStatus {
    /// Whether the originating BDM may see estimation files.
    ///
    /// Estimation data stays embargoed until the proposal has passed
    /// director approval.
    pub fn lifts_estimation_embargo(&self) -> bool {
        matches!(self, Self::Approved | Self::SubmittedToClient | Self::Won)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::PendingEstimation => "pending_estimation",
            Self::EstimationComplete => "estimation_complete",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::SubmittedToClient => "submitted_to_client",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Archived => "archived",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ProposalStatus {
    fn from(s: &str) -> Self {
        match s {
            "draft" => Self::Draft,
            "pending_estimation" => Self::PendingEstimation,
            "estimation_complete" => Self::EstimationComplete,
            "pending_approval" => Self::PendingApproval,
            "approved" => Self::Approved,
            "submitted_to_client" => Self::SubmittedToClient,
            "won" => Self::Won,
            "lost" => Self::Lost,
            "archived" => Self::Archived,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for ProposalStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProposalStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// The parent entity a file or link is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub created_by_uid: String,
    pub status: ProposalStatus,
}

impl Proposal {
    pub fn is_owned_by(&self, actor: &Actor) -> bool {
        self.created_by_uid == actor.uid
    }
}

// =============================================================================
// FILE TYPES
// =============================================================================

/// Category tag of a file record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// Project documents, uploaded by the proposal's BDM.
    Project,
    /// Estimation workbooks, uploaded by estimators.
    Estimation,
    General,
    /// External URL; no blob behind it.
    Link,
}

impl FileType {
    /// Default upload category for a role when the request names none.
    pub fn default_for(role: Role) -> Self {
        match role {
            Role::Bdm => Self::Project,
            Role::Estimator => Self::Estimation,
            Role::Coo | Role::Director => Self::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Estimation => "estimation",
            Self::General => "general",
            Self::Link => "link",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "project" => Ok(Self::Project),
            "estimation" => Ok(Self::Estimation),
            "general" => Ok(Self::General),
            "link" => Ok(Self::Link),
            _ => Err(format!("Invalid file type: {}", s)),
        }
    }
}

/// Metadata for an uploaded file or an external link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    /// Blob storage key; `None` for links.
    pub file_name: Option<String>,
    pub original_name: String,
    pub url: String,
    pub mime_type: String,
    pub file_size: i64,
    pub proposal_id: Option<String>,
    /// `None` only for legacy rows written before categories existed.
    pub file_type: Option<FileType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by_uid: String,
    pub uploaded_by_name: String,
    pub uploaded_by_role: Role,
}

impl FileRecord {
    pub fn is_link(&self) -> bool {
        self.file_type == Some(FileType::Link)
    }

    /// Storage key of the blob behind this record, if it has one.
    pub fn blob_key(&self) -> Option<&str> {
        if self.is_link() {
            return None;
        }
        self.file_name.as_deref().filter(|k| !k.is_empty())
    }

    /// Display label used in audit details.
    pub fn kind_label(&self) -> &'static str {
        if self.is_link() {
            "Link"
        } else {
            "File"
        }
    }
}

// =============================================================================
// ACCESS TYPES
// =============================================================================

/// Per-request permission flags for a visible record. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub can_view: bool,
    pub can_download: bool,
    pub can_delete: bool,
}

impl AccessDecision {
    /// Flags for a record that already passed the view policy.
    pub fn for_visible(file: &FileRecord, actor: &Actor) -> Self {
        Self {
            can_view: true,
            can_download: !file.is_link(),
            can_delete: can_delete(file, actor),
        }
    }
}

/// Deletion right: uploader or director. Independent of the view policy.
pub fn can_delete(file: &FileRecord, actor: &Actor) -> bool {
    file.uploaded_by_uid == actor.uid || actor.is_director()
}

/// A record as returned to a caller, with derived permission flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FileView {
    #[serde(flatten)]
    pub record: FileRecord,
    #[serde(flatten)]
    pub access: AccessDecision,
}

impl FileView {
    pub fn new(record: FileRecord, actor: &Actor) -> Self {
        let access = AccessDecision::for_visible(&record, actor);
        Self { record, access }
    }
}

// =============================================================================
// AUDIT TYPES
// =============================================================================

/// Kind of audited mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    FileUploaded,
    LinkAdded,
    FileDeleted,
    LinkDeleted,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileUploaded => "file_uploaded",
            Self::LinkAdded => "link_added",
            Self::FileDeleted => "file_deleted",
            Self::LinkDeleted => "link_deleted",
        }
    }

    /// Deletion event matching the record's kind.
    pub fn deleted(file: &FileRecord) -> Self {
        if file.is_link() {
            Self::LinkDeleted
        } else {
            Self::FileDeleted
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditEventType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "file_uploaded" => Ok(Self::FileUploaded),
            "link_added" => Ok(Self::LinkAdded),
            "file_deleted" => Ok(Self::FileDeleted),
            "link_deleted" => Ok(Self::LinkDeleted),
            _ => Err(format!("Invalid audit event type: {}", s)),
        }
    }
}

/// Append-only activity log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub event_type: AuditEventType,
    pub details: String,
    pub performed_by_uid: String,
    pub performed_by_name: String,
    pub performed_by_role: Role,
    pub timestamp: DateTime<Utc>,
    pub proposal_id: Option<String>,
    pub file_id: Option<Uuid>,
}

impl AuditEvent {
    pub fn new(
        event_type: AuditEventType,
        actor: &Actor,
        details: impl Into<String>,
        proposal_id: Option<String>,
        file_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type,
            details: details.into(),
            performed_by_uid: actor.uid.clone(),
            performed_by_name: actor.name.clone(),
            performed_by_role: actor.role,
            timestamp: Utc::now(),
            proposal_id,
            file_id,
        }
    }
}

/// Suffix appended to audit details when a proposal is involved.
pub fn proposal_suffix(proposal_id: Option<&str>) -> String {
    proposal_id
        .map(|id| format!(" for proposal {}", id))
        .unwrap_or_default()
}
