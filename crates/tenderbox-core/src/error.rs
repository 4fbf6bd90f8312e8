//! Error types for tenderbox.

use thiserror::Error;

/// Result type alias using tenderbox's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tenderbox operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Blob store operation failed (anything other than a missing key)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request body could not be parsed
    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),

    /// Upload carried no files
    #[error("No files were uploaded")]
    MissingFiles,

    /// Link batch carried no links
    #[error("No links provided in the request body")]
    NoLinksProvided,

    /// Uploaded file failed both the extension and the MIME allow-list
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    /// Uploaded file exceeds the per-file size ceiling
    #[error("File too large: {name} exceeds {max_bytes} bytes")]
    FileTooLarge { name: String, max_bytes: u64 },

    /// Upload carried more files than a single call accepts
    #[error("Too many files: at most {max} files per upload")]
    TooManyFiles { max: usize },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (authenticated but not authorized)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error reports a missing resource.
    ///
    /// Blob deletes rely on this to treat an already-absent blob as a no-op.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("file 42".to_string());
        assert_eq!(err.to_string(), "Not found: file 42");
    }

    #[test]
    fn test_error_display_file_too_large() {
        let err = Error::FileTooLarge {
            name: "plan.pdf".to_string(),
            max_bytes: 1024,
        };
        assert_eq!(
            err.to_string(),
            "File too large: plan.pdf exceeds 1024 bytes"
        );
    }

    #[test]
    fn test_error_display_too_many_files() {
        let err = Error::TooManyFiles { max: 10 };
        assert_eq!(err.to_string(), "Too many files: at most 10 files per upload");
    }

    #[test]
    fn test_error_display_forbidden() {
        let err = Error::Forbidden("not your proposal".to_string());
        assert_eq!(err.to_string(), "Forbidden: not your proposal");
    }

    #[test]
    fn test_is_not_found_variants() {
        assert!(Error::NotFound("x".into()).is_not_found());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(Error::Io(io).is_not_found());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        assert!(!Error::Io(io).is_not_found());
        assert!(!Error::Storage("bucket offline".into()).is_not_found());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
