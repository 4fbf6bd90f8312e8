//! Server configuration read from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/tenderbox` |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `FILE_STORAGE_PATH` | `/var/lib/tenderbox/blobs` |
//! | `PUBLIC_BLOB_BASE_URL` | `http://localhost:3000/blobs` |
//! | `SERVE_BLOBS` | `true` |
//! | `MAX_FILE_SIZE_MB` | `1000` |
//! | `ALLOWED_ORIGINS` | empty (any origin) |
//! | `DB_MAX_CONNECTIONS` | `10` |

use std::path::PathBuf;
use std::str::FromStr;

use tenderbox_core::defaults::{MAX_FILES_PER_UPLOAD, MAX_FILE_SIZE_MB};
use tracing::warn;

use crate::state::UploadLimits;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub file_storage_path: PathBuf,
    pub public_blob_base_url: String,
    /// Mount the blob directory at `/blobs`.
    pub serve_blobs: bool,
    pub max_file_size_mb: u64,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub db_max_connections: u32,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            database_url: text("DATABASE_URL", "postgres://localhost/tenderbox"),
            host: text("HOST", "0.0.0.0"),
            port: parse_or(&lookup, "PORT", 3000),
            file_storage_path: PathBuf::from(text("FILE_STORAGE_PATH", "/var/lib/tenderbox/blobs")),
            public_blob_base_url: text("PUBLIC_BLOB_BASE_URL", "http://localhost:3000/blobs"),
            serve_blobs: lookup("SERVE_BLOBS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            max_file_size_mb: parse_or(&lookup, "MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10),
        }
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_bytes: self.max_file_bytes(),
            max_files: MAX_FILES_PER_UPLOAD,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(variable = key, value = %raw, default = %default, "Invalid number, using default");
                default
            }
        },
        None => default,
    }
}
