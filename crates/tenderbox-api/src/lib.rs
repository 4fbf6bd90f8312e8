//! # tenderbox-api
//!
//! HTTP surface for tenderbox: the `/api/files` endpoint family plus health
//! and OpenAPI routes. The binary in `main.rs` wires PostgreSQL and the
//! filesystem blob store into [`AppState`]; tests wire in-memory fakes.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod services;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResponse};
pub use router::{build_router, RouterOptions};
pub use state::{AppState, Collaborators, UploadLimits};
