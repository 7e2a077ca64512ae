//! docstore-core: document repository with snapshot persistence.
//!
//! This crate provides:
//! - The `Document` entity and its `DocumentId` allocator
//! - A validation pipeline for create/update payloads
//! - File ingestion (uploads to create payloads)
//! - An in-memory repository whose full state is snapshotted after every mutation
//! - `DocumentService`, the operations a transport layer calls

pub mod document;
pub mod error;
pub mod id;
pub mod ingest;
pub mod persistence;
pub mod repository;
pub mod service;
pub mod validation;

pub use document::{Document, DocumentFormat};
pub use error::DocumentError;
pub use id::{DocumentId, IdAllocator};
pub use ingest::{FileIngestor, FileUpload, UploadRejection, MAX_UPLOAD_BYTES};
pub use persistence::{
    InMemoryStore, JsonFileStore, PersistenceError, PersistenceManager, Snapshot, SnapshotStore,
};
pub use repository::DocumentRepository;
pub use service::DocumentService;
pub use validation::{validate, DocumentPayload, ValidPayload, ValidationError};
