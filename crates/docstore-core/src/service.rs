//! DocumentService: the operations exposed to a transport layer.
//!
//! Each call runs the validation pipeline (and, for uploads, the ingestion
//! adapter) before touching the repository, and reports failures as
//! [`DocumentError`] values a transport can map exhaustively.

use crate::document::Document;
use crate::error::Result;
use crate::id::DocumentId;
use crate::ingest::{FileIngestor, FileUpload};
use crate::repository::DocumentRepository;
use crate::validation::{validate, DocumentPayload};
use std::sync::Arc;

#[derive(Clone)]
pub struct DocumentService {
    repository: Arc<DocumentRepository>,
    ingestor: FileIngestor,
}

impl DocumentService {
    pub fn new(repository: Arc<DocumentRepository>) -> Self {
        Self {
            repository,
            ingestor: FileIngestor::new(),
        }
    }

    pub fn repository(&self) -> &DocumentRepository {
        &self.repository
    }

    pub async fn create_document(&self, payload: &DocumentPayload) -> Result<Document> {
        let valid = validate(payload)?;
        Ok(self.repository.create(valid).await)
    }

    pub fn get_document(&self, id: DocumentId) -> Result<Document> {
        self.repository.get(id)
    }

    pub fn list_documents(&self) -> Vec<Document> {
        self.repository.list()
    }

    /// Validation runs first: an invalid payload for a missing id reports
    /// `InvalidPayload`, not `NotFound`.
    pub async fn update_document(&self, id: DocumentId, payload: &DocumentPayload) -> Result<Document> {
        let valid = validate(payload)?;
        self.repository.update(id, valid).await
    }

    pub async fn delete_document(&self, id: DocumentId) -> Result<()> {
        self.repository.delete(id).await
    }

    /// Create a document from an uploaded file.
    pub async fn ingest_file(&self, upload: &FileUpload) -> Result<Document> {
        let payload = self.ingestor.ingest(upload)?;
        let document = self.create_document(&payload).await?;
        tracing::info!("Ingested {} as document {}", upload.filename, document.id);
        Ok(document)
    }
}
