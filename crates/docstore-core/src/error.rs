use crate::id::DocumentId;
use crate::ingest::UploadRejection;
use crate::validation::ValidationError;
use thiserror::Error;

/// Errors surfaced to callers of the document operations.
///
/// Persistence problems are not in here: they are logged and never fail an
/// operation (see [`crate::persistence::PersistenceManager`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] ValidationError),

    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("Unsupported file: {0}")]
    UnsupportedFileType(#[from] UploadRejection),
}

pub type Result<T> = std::result::Result<T, DocumentError>;
