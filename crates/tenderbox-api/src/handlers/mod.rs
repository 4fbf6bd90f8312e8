//! HTTP handlers for tenderbox-api.

pub mod files;
pub mod system;

pub use files::{create_files, delete_file, list_files, method_not_allowed};
pub use system::{health, openapi_json};
