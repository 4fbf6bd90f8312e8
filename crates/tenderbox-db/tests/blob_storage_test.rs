//! Filesystem blob store behaviour against a temporary directory.

use bytes::Bytes;
use tempfile::TempDir;
use tenderbox_db::{generate_storage_key, BlobStore, FilesystemBlobStore};

fn store() -> (TempDir, FilesystemBlobStore) {
    let dir = TempDir::new().expect("tempdir");
    let store = FilesystemBlobStore::new(dir.path(), "http://localhost:3000/blobs");
    (dir, store)
}

#[tokio::test]
async fn test_save_then_read_back() {
    let (dir, store) = store();
    let key = "p1/1700000000000-7-plan.pdf";

    store
        .save(key, "application/pdf", Bytes::from_static(b"%PDF-1.7"))
        .await
        .unwrap();

    assert_eq!(std::fs::read(dir.path().join(key)).unwrap(), b"%PDF-1.7");
    assert!(!dir.path().join("p1/1700000000000-7-plan.pdf.tmp").exists());
}

#[tokio::test]
async fn test_long_original_name_saves() {
    let (dir, store) = store();
    let key = generate_storage_key(Some("p1"), &format!("{}.pdf", "a".repeat(240)));

    store
        .save(&key, "application/pdf", Bytes::from_static(b"long"))
        .await
        .unwrap();

    assert!(key.ends_with(".pdf"));
    assert_eq!(std::fs::read(dir.path().join(&key)).unwrap(), b"long");
}

#[cfg(unix)]
#[tokio::test]
async fn test_saved_blob_is_not_executable() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, store) = store();
    let key = "general/1-2-a.png";
    store.save(key, "image/png", Bytes::from_static(b"png")).await.unwrap();

    let mode = std::fs::metadata(dir.path().join(key))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o644);
}

#[tokio::test]
async fn test_delete_missing_blob_reports_not_found() {
    let (_dir, store) = store();
    let err = store.delete("p1/never-written.pdf").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_removes_blob() {
    let (dir, store) = store();
    let key = "p1/1-1-x.pdf";
    store.save(key, "application/pdf", Bytes::from_static(b"x")).await.unwrap();

    store.delete(key).await.unwrap();

    assert!(!dir.path().join(key).exists());
    assert!(store.delete(key).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_traversal_keys_are_rejected() {
    let (dir, store) = store();
    let err = store
        .save("../escape.pdf", "application/pdf", Bytes::from_static(b"x"))
        .await
        .unwrap_err();

    assert!(!err.is_not_found());
    assert!(!dir.path().parent().unwrap().join("escape.pdf").exists());
}

#[tokio::test]
async fn test_validate_round_trip() {
    let (dir, store) = store();
    store.validate().await.unwrap();
    assert!(!dir.path().join(".health-check").exists());
}
