//! Multipart upload intake and serving of locally stored files.

use actix_multipart::Multipart;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{HttpResponse, web};
use futures::StreamExt;

use kindred_core::domain::Upload;
use kindred_core::ports::StorageError;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Name of the multipart field carrying the file.
pub const UPLOAD_FIELD: &str = "file";

/// Read the `file` field of a multipart body, refusing anything over `max_bytes`.
///
/// The declared part content type wins; when a client sends none (or a
/// generic octet-stream) it is guessed from the file name.
pub async fn read_upload(mut payload: Multipart, max_bytes: usize) -> AppResult<Upload> {
    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?;
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let declared = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .filter(|mime| mime != "application/octet-stream");
        let content_type = declared
            .or_else(|| {
                file_name
                    .as_deref()
                    .and_then(|name| mime_guess::from_path(name).first_raw())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?;
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::BadRequest(format!(
                    "File exceeds the {} MB upload limit",
                    max_bytes / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(Upload {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(AppError::BadRequest(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

/// GET /uploads/{path}
pub async fn serve_upload(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let key = path.into_inner();
    let not_found = || AppError::NotFound(format!("File {key} not found"));

    let file = match state.uploads.resolve(&key) {
        Ok(file) => file,
        Err(StorageError::InvalidKey(_)) => return Err(not_found()),
        Err(e) => return Err(AppError::Internal(e.to_string())),
    };

    let bytes = match tokio::fs::read(&file).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(AppError::Internal(format!("Failed to read upload: {e}"))),
    };

    let mime = mime_guess::from_path(&file).first_or_octet_stream();
    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, mime.essence_str().to_string()))
        .insert_header((CACHE_CONTROL, "public, max-age=86400"))
        .body(bytes))
}
