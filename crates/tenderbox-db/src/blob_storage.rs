//! Filesystem blob store.
//!
//! Blobs live under a base directory at their storage key. Writes are atomic
//! (temp file + rename) and land with 0644 permissions. Public URLs are the
//! configured base URL joined with the key; serving them is left to whatever
//! fronts that URL.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tenderbox_db::FilesystemBlobStore;
//!
//! let store = FilesystemBlobStore::new("/var/lib/tenderbox/blobs", "https://cdn.example.com/blobs");
//! store.validate().await?;
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use tenderbox_core::{BlobStore, Error, Result};

/// [`BlobStore`] over a local directory.
#[derive(Debug, Clone)]
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    public_base_url: String,
}

/// Reject keys that could resolve outside the base directory.
pub fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(Error::InvalidInput(format!("invalid storage key: {:?}", key)));
    }
    Ok(())
}

impl FilesystemBlobStore {
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn full_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    /// Write, read back and delete a scratch file.
    ///
    /// Run at startup so permission and mount problems surface before the
    /// first upload does.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("scratch.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_back = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_back != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }

    async fn write_atomic(&self, full_path: &Path, data: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut temp_name = full_path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let result = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, full_path).await
        }
        .await;

        if result.is_err() {
            let _ = fs::remove_file(&temp_path).await;
            return result;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn save(&self, key: &str, content_type: &str, data: Bytes) -> Result<()> {
        let full_path = self.full_path(key)?;
        debug!(
            subsystem = "storage",
            component = "filesystem",
            op = "save",
            storage_key = %key,
            content_type,
            size = data.len(),
            "Writing blob"
        );

        self.write_atomic(&full_path, &data).await.map_err(|e| {
            warn!(
                subsystem = "storage",
                component = "filesystem",
                storage_key = %key,
                error = %e,
                "Blob write failed"
            );
            Error::Storage(format!("write {}: {}", key, e))
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_path = self.full_path(key)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("blob {}", key)))
            }
            Err(e) => Err(Error::Storage(format!("delete {}: {}", key, e))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
