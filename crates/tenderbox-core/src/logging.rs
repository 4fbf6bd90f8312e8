//! Structured logging schema and field name constants for tenderbox.
//!
//! All crates use these names for structured `tracing` fields so log
//! aggregation can query the same keys across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | A storage fault failed an operation or upload pipeline |
//! | WARN  | Tolerated fault: missing blob, audit append failure, parent lookup failure |
//! | INFO  | Lifecycle events, completed mutations |
//! | DEBUG | Policy decisions, query shapes, config choices |
//! | TRACE | Per-record iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "policy", "storage"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "upload", "link_batch", "deletion", "listing", "audit", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// File record UUID.
pub const FILE_ID: &str = "file_id";

/// Proposal ID a record is attached to.
pub const PROPOSAL_ID: &str = "proposal_id";

/// UID of the acting user.
pub const ACTOR_UID: &str = "actor_uid";

/// Role of the acting user.
pub const ROLE: &str = "role";

/// Blob storage key.
pub const STORAGE_KEY: &str = "storage_key";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records returned.
pub const RESULT_COUNT: &str = "result_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Every field name above, for schema checks and log pipeline configuration.
pub const ALL_FIELDS: &[&str] = &[
    REQUEST_ID,
    SUBSYSTEM,
    COMPONENT,
    OPERATION,
    FILE_ID,
    PROPOSAL_ID,
    ACTOR_UID,
    ROLE,
    STORAGE_KEY,
    DURATION_MS,
    RESULT_COUNT,
    ERROR_MSG,
];
