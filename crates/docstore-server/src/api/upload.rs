//! File upload endpoint
//!
//! Accepts `multipart/form-data` with the file in a field named `file`.
//! Acceptance and format inference are left to the core ingestion adapter;
//! the raw upload is not kept.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, State,
    },
    Json,
};
use docstore_core::{DocumentError, FileUpload, UploadRejection, MAX_UPLOAD_BYTES};

use super::documents::DocumentResponse;
use crate::error::ApiError;
use crate::AppState;

/// Handler for `POST /api/upload`
pub async fn handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut upload: Option<FileUpload> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue; // ignore unknown fields
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let declared_type = field.content_type().map(|c| c.to_string());
        let bytes = read_capped(field, MAX_UPLOAD_BYTES).await?;

        upload = Some(FileUpload {
            bytes,
            filename,
            declared_type,
        });
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    tracing::info!(
        "Upload received: {} ({} bytes, {:?})",
        upload.filename,
        upload.size(),
        upload.declared_type
    );

    let document = state.service.ingest_file(&upload).await?;
    Ok(Json(DocumentResponse::new(document)))
}

/// Read a field chunk by chunk, giving up as soon as it passes `limit`.
async fn read_capped(mut field: Field<'_>, limit: usize) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        bytes.extend_from_slice(&chunk);
        if bytes.len() > limit {
            tracing::debug!("Upload passed {} bytes, rejecting", limit);
            return Err(DocumentError::UnsupportedFileType(UploadRejection::TooLarge {
                size: bytes.len(),
                limit,
            })
            .into());
        }
    }
    Ok(bytes)
}
