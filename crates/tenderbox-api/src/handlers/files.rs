//! `/api/files` handlers: list, upload or add links, delete.

use axum::{
    body::to_bytes,
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::BytesMut;
use serde::Deserialize;
use tracing::{debug, info};
use utoipa::IntoParams;
use uuid::Uuid;

use tenderbox_core::defaults::UPLOAD_FILES_FIELD;
use tenderbox_core::{Error, FileRecord, FileType, FileView};

use crate::auth::RequireActor;
use crate::error::{ApiError, ApiResponse};
use crate::services::{IncomingFile, LinkBatchRequest, UploadRequest};
use crate::state::{AppState, UploadLimits};

/// Cap on a JSON link batch body.
pub const MAX_JSON_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListFilesQuery {
    /// Return this single record.
    pub file_id: Option<String>,
    /// Return the records attached to this proposal.
    pub proposal_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteFileQuery {
    /// ID of the record to delete.
    pub id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// List records, or fetch one.
#[utoipa::path(get, path = "/api/files", tag = "Files",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "Visible records with access flags"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "No such record")
    ))]
pub async fn list_files(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Query(query): Query<ListFilesQuery>,
) -> Result<Response, ApiError> {
    if let Some(file_id) = non_empty(query.file_id) {
        let id = Uuid::parse_str(&file_id)
            .map_err(|_| ApiError::NotFound("File not found".to_string()))?;
        let view: FileView = state.listing.get_one(id, &actor).await?;
        return Ok(Json(ApiResponse::data(view)).into_response());
    }

    let views = match non_empty(query.proposal_id) {
        Some(proposal_id) => state.listing.list_for_proposal(&proposal_id, &actor).await?,
        None => state.listing.list_all(&actor).await?,
    };
    debug!(
        subsystem = "api",
        actor_uid = %actor.uid,
        result_count = views.len(),
        "Listed files"
    );
    Ok(Json(ApiResponse::data(views)).into_response())
}

/// Add links (JSON body) or upload files (multipart body).
#[utoipa::path(post, path = "/api/files", tag = "Files",
    request_body(content = LinkBatchRequest, description = "JSON link batch, or multipart/form-data with `files`, `proposalId`, `fileType`"),
    responses(
        (status = 201, description = "Created records"),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Not permitted"),
        (status = 413, description = "Too many or too large files"),
        (status = 415, description = "Unsupported file or content type"),
        (status = 500, description = "Storage failure")
    ))]
pub async fn create_files(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    request: Request,
) -> Result<(StatusCode, Json<ApiResponse<Vec<FileRecord>>>), ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.contains("application/json") {
        let body = to_bytes(request.into_body(), MAX_JSON_BODY_BYTES)
            .await
            .map_err(|_| ApiError::PayloadTooLarge("Request body too large.".to_string()))?;
        let links: LinkBatchRequest = if body.is_empty() {
            LinkBatchRequest::default()
        } else {
            serde_json::from_slice(&body).map_err(|_| {
                Error::InvalidRequestBody("Invalid JSON format for adding links.".to_string())
            })?
        };

        let created = state.links.add_links(&actor, links).await?;
        let message = format!("{} link(s) added successfully.", created.len());
        return Ok((StatusCode::CREATED, Json(ApiResponse::with_message(created, message))));
    }

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(format!("File upload error: {}", e)))?;
        let upload = read_upload(multipart, state.limits).await?;
        let outcome = state.uploads.upload(&actor, upload).await?;
        let message = outcome.message();
        return Ok((
            StatusCode::CREATED,
            Json(ApiResponse::with_message(outcome.created, message)),
        ));
    }

    Err(ApiError::UnsupportedMediaType(
        "Unsupported content type. Use application/json for links or multipart/form-data for uploads."
            .to_string(),
    ))
}

/// Stream multipart parts into an upload request, enforcing the count and
/// per-file size ceilings as bytes arrive.
async fn read_upload(mut multipart: Multipart, limits: UploadLimits) -> Result<UploadRequest, ApiError> {
    let mut request = UploadRequest::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("File upload error: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            UPLOAD_FILES_FIELD => {
                if request.files.len() >= limits.max_files {
                    return Err(Error::TooManyFiles {
                        max: limits.max_files,
                    }
                    .into());
                }
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();

                let mut data = BytesMut::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("File upload error: {}", e)))?
                {
                    if (data.len() + chunk.len()) as u64 > limits.max_file_bytes {
                        return Err(Error::FileTooLarge {
                            name: original_name,
                            max_bytes: limits.max_file_bytes,
                        }
                        .into());
                    }
                    data.extend_from_slice(&chunk);
                }

                request.files.push(IncomingFile {
                    original_name,
                    content_type,
                    data: data.freeze(),
                });
            }
            "proposalId" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("File upload error: {}", e)))?;
                request.proposal_id = non_empty(Some(value));
            }
            "fileType" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("File upload error: {}", e)))?;
                request.file_type = match non_empty(Some(value)) {
                    Some(tag) => Some(tag.parse::<FileType>().map_err(ApiError::BadRequest)?),
                    None => None,
                };
            }
            other => debug!(subsystem = "api", field = %other, "Ignoring multipart field"),
        }
    }

    Ok(request)
}

/// Delete one record and its blob.
#[utoipa::path(delete, path = "/api/files", tag = "Files",
    params(DeleteFileQuery),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Missing id"),
        (status = 403, description = "Not the uploader or a director"),
        (status = 404, description = "No such record")
    ))]
pub async fn delete_file(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    Query(query): Query<DeleteFileQuery>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let raw_id = non_empty(query.id)
        .ok_or_else(|| ApiError::BadRequest("File ID required in query parameters.".to_string()))?;
    let id = Uuid::parse_str(&raw_id)
        .map_err(|_| ApiError::NotFound("File metadata not found in database.".to_string()))?;

    let removed = state.deletions.delete(id, &actor).await?;
    info!(subsystem = "api", file_id = %id, actor_uid = %actor.uid, "Delete request completed");
    Ok(Json(ApiResponse::message(format!(
        "{} deleted successfully.",
        removed.kind_label()
    ))))
}

/// Any other method on `/api/files`.
pub async fn method_not_allowed(
    RequireActor(_actor): RequireActor,
    method: Method,
) -> ApiError {
    ApiError::MethodNotAllowed(format!("Method {} not allowed.", method))
}
