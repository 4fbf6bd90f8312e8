//! # tenderbox-core
//!
//! Core types, traits, and access policy for the tenderbox file service.
//!
//! This crate holds the domain model, the collaborator traits that storage
//! backends implement, and the pure authorization rules. It performs no I/O
//! of its own.

pub mod defaults;
pub mod error;
pub mod listing;
pub mod logging;
pub mod models;
pub mod policy;
pub mod traits;
pub mod upload;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use listing::filter_visible;
pub use models::*;
pub use policy::{
    can_view, decide, ensure_proposal_owner, resolve_upload_category, ParentLookup,
    ParentResolution,
};
pub use traits::*;
pub use upload::{generate_storage_key, sanitize_filename, validate_file_type};
