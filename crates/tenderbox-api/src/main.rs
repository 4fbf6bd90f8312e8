//! tenderbox-api - HTTP API server for proposal files and links.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tenderbox_api::{build_router, AppState, Collaborators, RouterOptions, ServerConfig};
use tenderbox_db::{log_pool_metrics, Database, FilesystemBlobStore, PoolConfig};

/// Multipart framing allowance on top of the file payload ceiling.
const BODY_OVERHEAD_BYTES: u64 = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "tenderbox_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tenderbox_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("tenderbox-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env();

    let db = Database::connect(
        &config.database_url,
        PoolConfig::new().max_connections(config.db_max_connections),
    )
    .await?;
    db.migrate().await?;
    log_pool_metrics(db.pool());
    info!(subsystem = "db", "Database ready");

    let blobs = FilesystemBlobStore::new(&config.file_storage_path, &config.public_blob_base_url);
    if let Err(e) = blobs.validate().await {
        anyhow::bail!(
            "Blob storage at {} is not usable: {}",
            config.file_storage_path.display(),
            e
        );
    }
    info!(
        subsystem = "storage",
        path = %config.file_storage_path.display(),
        public_base_url = %config.public_blob_base_url,
        "Blob storage ready"
    );

    let limits = config.upload_limits();
    let state = AppState::new(
        Collaborators {
            files: Arc::new(db.files.clone()),
            blobs: Arc::new(blobs),
            proposals: Arc::new(db.proposals.clone()),
            audit: Arc::new(db.activities.clone()),
            actors: Arc::new(db.tokens.clone()),
        },
        limits,
    );

    let max_body_bytes = limits
        .max_file_bytes
        .saturating_mul(limits.max_files as u64)
        .saturating_add(BODY_OVERHEAD_BYTES);
    let app = build_router(
        state,
        RouterOptions {
            allowed_origins: config.allowed_origins.clone(),
            blob_dir: config
                .serve_blobs
                .then(|| config.file_storage_path.clone()),
            max_body_bytes: usize::try_from(max_body_bytes).unwrap_or(usize::MAX),
        },
    );

    let addr: SocketAddr = config.bind_address().parse()?;
    info!(
        max_file_size_mb = config.max_file_size_mb,
        max_files = limits.max_files,
        "Starting server on {}",
        addr
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
