use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::files::NewUpload;
use crate::models::file::{FileListResponse, FileResponse, UpdateVisibilityRequest};
use crate::state::AppState;

/// Room for multipart framing on top of the payload ceiling, so oversized
/// files reach the size check and get a `VALIDATION_ERROR` instead of a bare 413.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = max_upload_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Encrypts and stores the `file` multipart field. The MIME type is taken from \
        the part's `Content-Type` when present, otherwise guessed from the filename. \
        New files are private.",
    request_body(content_type = "multipart/form-data", description = "File upload"),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Storage backend failure (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(owner = %auth_user.principal))]
pub async fn upload_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<NewUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue; // Ignore unknown fields.
        }

        let original_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
        let mime_type = match field.content_type() {
            Some(declared) => declared.to_string(),
            None => mime_guess::from_path(&original_name)
                .first_or_octet_stream()
                .to_string(),
        };
        let data = read_field(field, state.files.max_upload_size()).await?;

        upload = Some(NewUpload {
            original_name,
            mime_type,
            data,
        });
    }

    let upload = upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let view = state.files.upload(auth_user.principal, upload).await?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(view))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List your files",
    description = "Returns every file owned by the caller, newest first.",
    responses(
        (status = 200, description = "File list", body = FileListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Storage backend failure (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner = %auth_user.principal))]
pub async fn list_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<FileListResponse>, AppError> {
    let views = state.files.list(auth_user.principal).await?;
    Ok(Json(FileListResponse::from(views)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a file",
    description = "Returns the decrypted content as an attachment. Owners can always download; \
        other users only when the file is public.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stored data is corrupt (DECRYPTION_ERROR)", body = ErrorBody),
        (status = 502, description = "Storage backend failure (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(principal = %auth_user.principal, file_id))]
pub async fn download_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_file_id(&file_id)?;
    let file = state.files.download(auth_user.principal, id).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &file.mime_type)
        .header(header::CONTENT_LENGTH, file.data.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&file.original_name),
        )
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from(file.data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Files",
    operation_id = "updateFileVisibility",
    summary = "Change a file's visibility",
    description = "Owner only. Public files can be downloaded by any authenticated user.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    request_body = UpdateVisibilityRequest,
    responses(
        (status = 200, description = "Updated file", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(principal = %auth_user.principal, file_id))]
pub async fn update_visibility(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    AppJson(payload): AppJson<UpdateVisibilityRequest>,
) -> Result<Json<FileResponse>, AppError> {
    let id = parse_file_id(&file_id)?;
    let view = state
        .files
        .set_visibility(auth_user.principal, id, payload.visibility)
        .await?;
    Ok(Json(FileResponse::from(view)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Owner only. Removes the encrypted blob, then the record.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Storage backend failure (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(principal = %auth_user.principal, file_id))]
pub async fn delete_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_file_id(&file_id)?;
    state.files.delete(auth_user.principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_file_id(raw: &str) -> Result<Uuid, AppError> {
    tracing::Span::current().record("file_id", raw);
    Uuid::parse_str(raw).map_err(|_| AppError::Validation("Invalid file ID".into()))
}

/// Read a multipart field into memory, refusing to buffer past the ceiling.
async fn read_field(
    mut field: axum::extract::multipart::Field<'_>,
    max_size: u64,
) -> Result<Vec<u8>, AppError> {
    let mut data = Vec::new();

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (data.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(data)
}

/// Build a safe attachment `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
