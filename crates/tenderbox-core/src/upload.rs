//! Upload validation and storage key generation.
//!
//! A file is accepted when either its extension or its declared MIME type is
//! on the allow-list. Storage keys are built from the proposal, a millisecond
//! timestamp, a random suffix and the sanitized original name.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::defaults::{GENERAL_KEY_PREFIX, MAX_KEY_SEGMENT_BYTES};
use crate::error::{Error, Result};

/// Allowed file extensions (case-insensitive, exact match).
static ALLOWED_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "pdf", "docx", "xlsx", "xls", "dwg", // documents and drawings
        "jpg", "jpeg", "png", "gif", // images
    ]
    .into_iter()
    .collect()
});

/// Allowed declared MIME types.
static ALLOWED_MIME_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "application/pdf",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.ms-excel",
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/gif",
        // CAD
        "application/acad",
        "application/x-acad",
        "image/vnd.dwg",
    ]
    .into_iter()
    .collect()
});

static UNSAFE_KEY_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9.\-_]").expect("valid regex"));

/// Lowercased final extension of `filename`, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Whether an upload passes the extension-or-MIME allow-list.
pub fn is_allowed_type(filename: &str, mime_type: &str) -> bool {
    let ext_ok = extension_of(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(ext.as_str()))
        .unwrap_or(false);
    let mime_ok = ALLOWED_MIME_TYPES.contains(mime_type.to_lowercase().trim());
    ext_ok || mime_ok
}

/// Reject files that fail both allow-list checks.
pub fn validate_file_type(filename: &str, mime_type: &str) -> Result<()> {
    if is_allowed_type(filename, mime_type) {
        return Ok(());
    }
    Err(Error::InvalidFileType(format!(
        "{}: only PDF, DOCX, XLSX, DWG, and images are allowed",
        filename
    )))
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_KEY_CHARS.replace_all(name, "_").into_owned()
}

/// Longest extension kept intact when a name is shortened.
const MAX_KEPT_EXTENSION_BYTES: usize = 16;

/// Shorten an already sanitized (ASCII) name to `max` bytes, keeping a short
/// final extension when there is one.
fn truncate_sanitized(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_KEPT_EXTENSION_BYTES
                && ext.len() + 2 <= max =>
        {
            let stem_len = (max - ext.len() - 1).min(stem.len());
            format!("{}.{}", &stem[..stem_len], ext)
        }
        _ => name[..max].to_string(),
    }
}

fn key_prefix(proposal_id: Option<&str>) -> String {
    let Some(id) = proposal_id else {
        return GENERAL_KEY_PREFIX.to_string();
    };
    let sanitized = truncate_sanitized(&sanitize_filename(id), MAX_KEY_SEGMENT_BYTES);
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        return "_".to_string();
    }
    sanitized
}

/// Build a collision-resistant storage key for an upload.
///
/// Format: `{proposal-or-general}/{unix-millis}-{random}-{sanitized-name}`.
/// The prefix and name are each capped at [`MAX_KEY_SEGMENT_BYTES`].
pub fn generate_storage_key(proposal_id: Option<&str>, original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!(
        "{}/{}-{}-{}",
        key_prefix(proposal_id),
        millis,
        suffix,
        truncate_sanitized(&sanitize_filename(original_name), MAX_KEY_SEGMENT_BYTES)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_or_mime_suffices() {
        assert!(is_allowed_type("plan.PDF", "application/octet-stream"));
        assert!(is_allowed_type("scan", "image/png"));
        assert!(is_allowed_type("drawing.dwg", ""));
        assert!(!is_allowed_type("run.exe", "application/x-msdownload"));
        assert!(!is_allowed_type("notes.txt", "text/plain"));
    }

    #[test]
    fn test_extension_must_match_exactly() {
        assert!(!is_allowed_type("archive.pdfx", "application/zip"));
        assert!(!is_allowed_type(".pdf", "text/plain"));
        assert!(is_allowed_type("budget.v2.xlsx", "application/zip"));
    }

    #[test]
    fn test_validate_file_type_error() {
        let err = validate_file_type("virus.bat", "text/plain").unwrap_err();
        assert!(matches!(err, Error::InvalidFileType(_)));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Site Plan (v2).pdf"), "Site_Plan__v2_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("ok-name_1.xlsx"), "ok-name_1.xlsx");
    }

    #[test]
    fn test_storage_key_shape() {
        let key = generate_storage_key(Some("p1"), "Bid Sheet.xlsx");
        let (prefix, rest) = key.split_once('/').unwrap();
        assert_eq!(prefix, "p1");
        assert!(rest.ends_with("-Bid_Sheet.xlsx"));
        let mut parts = rest.splitn(3, '-');
        assert!(parts.next().unwrap().parse::<i64>().is_ok());
        assert!(parts.next().unwrap().parse::<u32>().unwrap() < 1_000_000);
    }

    #[test]
    fn test_storage_key_general_prefix() {
        let key = generate_storage_key(None, "a.pdf");
        assert!(key.starts_with("general/"));
    }

    #[test]
    fn test_storage_key_prefix_cannot_escape() {
        assert!(generate_storage_key(Some(".."), "a.pdf").starts_with("_/"));
        assert!(generate_storage_key(Some("../x"), "a.pdf").starts_with(".._x/"));
        assert_eq!(generate_storage_key(Some("a/b"), "c.pdf").matches('/').count(), 1);
    }

    #[test]
    fn test_storage_key_segments_fit_filesystem_limits() {
        let long_name = format!("{}.pdf", "a".repeat(296));
        let long_id = "p".repeat(300);
        let key = generate_storage_key(Some(&long_id), &long_name);

        for segment in key.split('/') {
            assert!(segment.len() <= 255, "segment is {} bytes", segment.len());
        }
        let (prefix, rest) = key.split_once('/').unwrap();
        assert_eq!(prefix.len(), MAX_KEY_SEGMENT_BYTES);
        let name = rest.splitn(3, '-').nth(2).unwrap();
        assert_eq!(name.len(), MAX_KEY_SEGMENT_BYTES);
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_truncate_sanitized() {
        assert_eq!(truncate_sanitized("short.pdf", 20), "short.pdf");
        assert_eq!(truncate_sanitized("abcdefghij.pdf", 10), "abcdef.pdf");
        assert_eq!(truncate_sanitized("abcdefghijkl", 5), "abcde");
        // extension too long to keep
        let ext = "x".repeat(20);
        assert_eq!(truncate_sanitized(&format!("ab.{}", ext), 10).len(), 10);
        // dot-only prefixes still collapse
        assert_eq!(key_prefix(Some(&".".repeat(300))), "_");
    }
}
