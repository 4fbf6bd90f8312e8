//! HTTP error mapping and the response envelope.
//!
//! Every response body has the shape `{success, data|error, message?}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use tenderbox_core::Error;

/// Successful response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    MethodNotAllowed(String),
    PayloadTooLarge(String),
    UnsupportedMediaType(String),
    /// Storage or other internal fault; the cause is logged, not returned.
    Internal(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::InvalidInput(msg) | Error::InvalidRequestBody(msg) => ApiError::BadRequest(msg),
            Error::MissingFiles => ApiError::BadRequest("No files were uploaded.".to_string()),
            Error::NoLinksProvided => {
                ApiError::BadRequest("No links provided in the request body.".to_string())
            }
            Error::InvalidFileType(msg) => {
                ApiError::UnsupportedMediaType(format!("Invalid file type: {}", msg))
            }
            Error::FileTooLarge { name, max_bytes } => ApiError::PayloadTooLarge(format!(
                "File too large: {}. Max size is {}MB.",
                name,
                max_bytes / (1024 * 1024)
            )),
            Error::TooManyFiles { max } => ApiError::PayloadTooLarge(format!(
                "Too many files. Max {} files allowed at once.",
                max
            )),
            other => ApiError::Internal(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed with internal error");
                let message = match &err {
                    Error::Storage(_) => "Storage operation failed.",
                    Error::Database(_) => "Database operation failed.",
                    _ => "Unexpected server error.",
                };
                ErrorBody {
                    success: false,
                    error: "Internal Server Error".to_string(),
                    message: Some(message.to_string()),
                }
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::MethodNotAllowed(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::UnsupportedMediaType(msg) => ErrorBody {
                success: false,
                error: msg,
                message: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
