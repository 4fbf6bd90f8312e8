//! Router assembly.

use std::path::PathBuf;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use uuid::Uuid;

use tenderbox_core::{AccessDecision, FileRecord, FileType, FileView, Role};

use crate::handlers::{self, files, system};
use crate::services::{LinkBatchRequest, LinkInput};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tenderbox File API",
        description = "Proposal file and link storage with role-based access"
    ),
    paths(
        files::list_files,
        files::create_files,
        files::delete_file,
        system::health
    ),
    components(schemas(
        FileRecord,
        FileView,
        AccessDecision,
        FileType,
        Role,
        LinkInput,
        LinkBatchRequest,
        system::HealthResponse
    )),
    tags(
        (name = "Files", description = "Files and links attached to proposals"),
        (name = "System", description = "Service status")
    )
)]
pub struct ApiDoc;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Router settings that are not part of the service state.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// Directory served under `/blobs`, when blobs are served locally.
    pub blob_dir: Option<PathBuf>,
    pub max_body_bytes: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            blob_dir: None,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(subsystem = "api", origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

pub fn build_router(state: AppState, options: RouterOptions) -> Router {
    let mut app = Router::new()
        .route(
            "/api/files",
            get(handlers::list_files)
                .post(handlers::create_files)
                .delete(handlers::delete_file)
                .fallback(handlers::method_not_allowed),
        )
        .route("/health", get(handlers::health))
        .route("/openapi.json", get(handlers::openapi_json));

    if let Some(dir) = options.blob_dir {
        app = app.nest_service("/blobs", ServeDir::new(dir));
    }

    app.layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(&options.allowed_origins))
        .layer(RequestBodyLimitLayer::new(options.max_body_bytes))
        .with_state(state)
}
