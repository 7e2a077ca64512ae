//! Document CRUD endpoints under `/api/documents`

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use docstore_core::{Document, DocumentId, DocumentPayload};
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

/// Response carrying a single document
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub success: bool,
    pub document: Document,
}

impl DocumentResponse {
    pub fn new(document: Document) -> Self {
        Self {
            success: true,
            document,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub success: bool,
    pub documents: Vec<Document>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Ids that don't parse can't name a document, so they are reported as not found
fn parse_id(raw: &str) -> Result<DocumentId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::UnknownId(raw.to_string()))
}

/// Handler for `POST /api/documents`
pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DocumentPayload>, JsonRejection>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let Json(payload) = payload?;
    let document = state.service.create_document(&payload).await?;
    tracing::info!("Created document {}", document.id);
    Ok(Json(DocumentResponse::new(document)))
}

/// Handler for `GET /api/documents`
pub async fn list_handler(State(state): State<Arc<AppState>>) -> Json<DocumentListResponse> {
    Json(DocumentListResponse {
        success: true,
        documents: state.service.list_documents(),
    })
}

/// Handler for `GET /api/documents/{id}`
pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    let document = state.service.get_document(id)?;
    Ok(Json(DocumentResponse::new(document)))
}

/// Handler for `PUT /api/documents/{id}`
pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    payload: Result<Json<DocumentPayload>, JsonRejection>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let Json(payload) = payload?;
    let id = parse_id(&raw_id)?;
    let document = state.service.update_document(id, &payload).await?;
    tracing::info!("Updated document {}", id);
    Ok(Json(DocumentResponse::new(document)))
}

/// Handler for `DELETE /api/documents/{id}`
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    state.service.delete_document(id).await?;
    tracing::info!("Deleted document {}", id);
    Ok(Json(MessageResponse {
        success: true,
        message: "Document deleted".to_string(),
    }))
}
