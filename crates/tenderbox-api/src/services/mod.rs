//! Request-level services for the file API.
//!
//! Each service owns the collaborators it needs and implements one
//! operation family end to end; handlers only translate HTTP.

pub mod audit;
pub mod deletion;
pub mod links;
pub mod listing;
pub mod upload;

pub use audit::AuditAppender;
pub use deletion::DeletionCoordinator;
pub use links::{LinkBatchRequest, LinkBatchWriter, LinkInput};
pub use listing::ListingService;
pub use upload::{IncomingFile, UploadCoordinator, UploadOutcome, UploadRequest};
