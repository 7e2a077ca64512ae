//! Mapping of core errors onto HTTP responses

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docstore_core::{DocumentError, UploadRejection};
use serde::Serialize;

/// Body of every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    Document(DocumentError),
    /// An id in the path that is not a document id at all
    UnknownId(String),
    BadRequest(String),
    /// Malformed or over-limit multipart body
    Multipart(MultipartError),
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        ApiError::Document(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Document(DocumentError::InvalidPayload(_)) => StatusCode::BAD_REQUEST,
            ApiError::Document(DocumentError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Document(DocumentError::UnsupportedFileType(UploadRejection::TooLarge {
                ..
            })) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Document(DocumentError::UnsupportedFileType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ApiError::UnknownId(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // 413 when the body limit cut the stream, 400 otherwise
            ApiError::Multipart(err) => err.status(),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Document(err) => err.to_string(),
            ApiError::UnknownId(raw) => format!("Document not found: {}", raw),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Multipart(err) => format!("Multipart error: {}", err.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        tracing::debug!("Request failed with {}: {}", status, message);

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}
