//! Centralized default constants for tenderbox.
//!
//! Limits that shape request handling live here so the API, the stores and
//! the tests agree on them.

// =============================================================================
// UPLOADS
// =============================================================================

/// Maximum number of files accepted by one upload call.
pub const MAX_FILES_PER_UPLOAD: usize = 10;

/// Default per-file size ceiling in megabytes (`MAX_FILE_SIZE_MB`).
pub const MAX_FILE_SIZE_MB: u64 = 1000;

/// Multipart field carrying file parts.
pub const UPLOAD_FILES_FIELD: &str = "files";

/// Storage-key prefix for files not attached to a proposal.
pub const GENERAL_KEY_PREFIX: &str = "general";

/// Longest sanitized name or prefix placed in a storage key segment, in bytes.
/// Keeps every segment well under the common 255-byte filesystem limit.
pub const MAX_KEY_SEGMENT_BYTES: usize = 150;

/// MIME type recorded for external links.
pub const LINK_MIME_TYPE: &str = "text/url";

// =============================================================================
// LISTING
// =============================================================================

/// Records read from the index before the listing filter narrows them.
pub const LIST_SOURCE_LIMIT: i64 = 500;

/// Maximum proposal IDs per `ProposalIn` index query.
pub const PARENT_ID_BATCH_LIMIT: usize = 30;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_limits() {
        assert_eq!(MAX_FILES_PER_UPLOAD, 10);
        assert_eq!(MAX_FILE_SIZE_MB, 1000);
    }

    #[test]
    fn test_listing_limits() {
        assert_eq!(LIST_SOURCE_LIMIT, 500);
        assert!(PARENT_ID_BATCH_LIMIT > 0);
    }
}
