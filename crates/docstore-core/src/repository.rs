//! DocumentRepository: in-memory document store backed by snapshots.
//!
//! The repository owns the documents and the id allocator. Every successful
//! create/update/delete writes a fresh snapshot before returning; reads never
//! touch the store.

use crate::document::Document;
use crate::error::{DocumentError, Result};
use crate::id::{DocumentId, IdAllocator};
use crate::persistence::{InMemoryStore, PersistenceManager, Snapshot};
use crate::validation::ValidPayload;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Documents plus the id counter: everything a snapshot captures.
#[derive(Debug, Default)]
struct RepositoryState {
    /// Keyed by id. Ids are allocated in increasing order, so key order is
    /// insertion order.
    documents: BTreeMap<DocumentId, Document>,
    ids: IdAllocator,
}

impl RepositoryState {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut documents = BTreeMap::new();
        for (key, document) in snapshot.documents {
            if key != document.id {
                tracing::warn!(
                    "Skipping snapshot entry {}: document claims id {}",
                    key,
                    document.id
                );
                continue;
            }
            documents.insert(key, document);
        }

        let highest = documents.keys().next_back().copied();
        let ids = IdAllocator::restore(snapshot.next_id, highest);

        Self { documents, ids }
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            documents: self
                .documents
                .iter()
                .map(|(id, doc)| (*id, doc.clone()))
                .collect(),
            next_id: self.ids.peek(),
        }
    }
}

pub struct DocumentRepository {
    state: RwLock<RepositoryState>,
    persistence: PersistenceManager,
}

impl DocumentRepository {
    /// Open a repository, restoring whatever the store last saved.
    pub async fn open(persistence: PersistenceManager) -> Self {
        let snapshot = persistence.load().await;
        Self {
            state: RwLock::new(RepositoryState::from_snapshot(snapshot)),
            persistence,
        }
    }

    /// Empty repository backed by an [`InMemoryStore`].
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(RepositoryState::default()),
            persistence: PersistenceManager::new(InMemoryStore::new()),
        }
    }

    /// Store a new document and return it.
    pub async fn create(&self, payload: ValidPayload) -> Document {
        let (title, content, format) = payload.into_parts();

        let document = {
            let mut state = self.write();
            let id = state.ids.next();
            let now = Utc::now();
            let document = Document {
                id,
                title: title.unwrap_or_else(|| Document::default_title(id)),
                content,
                format: format.unwrap_or_default(),
                created_at: now,
                updated_at: now,
            };
            state.documents.insert(id, document.clone());
            document
        };

        tracing::debug!("Created document {} ({})", document.id, document.format);
        self.persist().await;
        document
    }

    pub fn get(&self, id: DocumentId) -> Result<Document> {
        self.read()
            .documents
            .get(&id)
            .cloned()
            .ok_or(DocumentError::NotFound(id))
    }

    /// All documents in insertion order.
    pub fn list(&self) -> Vec<Document> {
        self.read().documents.values().cloned().collect()
    }

    /// Replace a document's content, and its title/format when supplied.
    pub async fn update(&self, id: DocumentId, payload: ValidPayload) -> Result<Document> {
        let (title, content, format) = payload.into_parts();

        let document = {
            let mut state = self.write();
            let document = state
                .documents
                .get_mut(&id)
                .ok_or(DocumentError::NotFound(id))?;

            document.content = content;
            if let Some(title) = title {
                document.title = title;
            }
            if let Some(format) = format {
                document.format = format;
            }
            document.updated_at = Utc::now();
            document.clone()
        };

        tracing::debug!("Updated document {}", id);
        self.persist().await;
        Ok(document)
    }

    /// Remove a document. Its id is never handed out again.
    pub async fn delete(&self, id: DocumentId) -> Result<()> {
        let removed = self.write().documents.remove(&id);
        if removed.is_none() {
            return Err(DocumentError::NotFound(id));
        }

        tracing::debug!("Deleted document {}", id);
        self.persist().await;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.read().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().documents.is_empty()
    }

    /// The id the next created document will receive.
    pub fn next_id(&self) -> DocumentId {
        self.read().ids.peek()
    }

    /// Current state as a snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.read().to_snapshot()
    }

    async fn persist(&self) {
        // Failures are logged by the manager; the in-memory change stands.
        let _ = self.persistence.save_with(|| self.snapshot()).await;
    }

    fn read(&self) -> RwLockReadGuard<'_, RepositoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RepositoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
