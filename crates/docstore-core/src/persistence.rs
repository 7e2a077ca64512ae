//! Snapshot persistence for the document repository.
//!
//! The whole repository (documents plus the id counter) is written as one
//! JSON snapshot after every mutation. Layout:
//!
//! ```json
//! { "documents": [[1, { "id": 1, ... }]], "nextId": 2 }
//! ```
//!
//! Implementations:
//! - `JsonFileStore` - snapshot file on disk, replaced atomically
//! - `InMemoryStore` - For testing

use crate::document::Document;
use crate::id::DocumentId;
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to parse snapshot: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Snapshot store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

fn first_id() -> DocumentId {
    DocumentId::FIRST
}

/// Full serialized copy of repository state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// `(id, document)` pairs in insertion order.
    #[serde(default)]
    pub documents: Vec<(DocumentId, Document)>,
    /// The id the next created document will receive.
    #[serde(default = "first_id")]
    pub next_id: DocumentId,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            next_id: first_id(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(PersistenceError::Serialize)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(PersistenceError::Parse)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Where snapshots are kept.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the stored snapshot. `Ok(None)` means nothing has been saved yet.
    async fn load(&self) -> Result<Option<Snapshot>>;

    /// Replace the stored snapshot.
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

#[async_trait]
impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    async fn load(&self) -> Result<Option<Snapshot>> {
        (**self).load().await
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).save(snapshot).await
    }
}

/// Snapshot stored as a pretty-printed JSON file.
///
/// Saves write a temp file next to the target and rename it into place, so
/// a crash mid-write leaves the previous snapshot intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Generate a random hex string for temp file names.
    fn random_hex() -> String {
        let bytes: [u8; 8] = rand::rng().random();
        hex::encode(bytes)
    }

    /// Atomic write using temp file + rename.
    async fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
        let temp_path = path.with_extension(format!("{}.tmp", Self::random_hex()));

        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(content).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> Result<Option<Snapshot>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Snapshot::from_json(&contents).map(Some)
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let contents = snapshot.to_json()?;
        Self::atomic_write(&self.path, contents.as_bytes()).await?;
        Ok(())
    }
}

/// In-memory snapshot store for testing.
///
/// Holds the serialized JSON text, so loads go through the same parser as
/// the file store. Writes can be made to fail on demand.
#[derive(Default)]
pub struct InMemoryStore {
    contents: RwLock<Option<String>>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw snapshot text (which need not be valid JSON).
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: RwLock::new(Some(contents.into())),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The last successfully saved snapshot text.
    pub fn contents(&self) -> Option<String> {
        self.contents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn load(&self) -> Result<Option<Snapshot>> {
        match self.contents() {
            Some(json) => Snapshot::from_json(&json).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("writes disabled".into()));
        }
        let json = snapshot.to_json()?;
        *self.contents.write().unwrap_or_else(PoisonError::into_inner) = Some(json);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Loads the startup snapshot and funnels every save through one writer.
///
/// Neither operation returns an error to the repository: a missing or
/// corrupt snapshot means "no prior state", and a failed save is logged while
/// the in-memory state stays authoritative.
pub struct PersistenceManager {
    store: Box<dyn SnapshotStore>,
    writer: Mutex<()>,
}

impl PersistenceManager {
    pub fn new(store: impl SnapshotStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            writer: Mutex::new(()),
        }
    }

    /// Load the stored snapshot, falling back to an empty one.
    pub async fn load(&self) -> Snapshot {
        match self.store.load().await {
            Ok(Some(snapshot)) => {
                tracing::info!("Loaded {} documents", snapshot.documents.len());
                snapshot
            }
            Ok(None) => {
                tracing::info!("No previous snapshot found, starting with an empty repository");
                Snapshot::empty()
            }
            Err(e) => {
                tracing::warn!("Could not load snapshot, starting with an empty repository: {}", e);
                Snapshot::empty()
            }
        }
    }

    /// Save the snapshot produced by `capture`.
    ///
    /// `capture` runs while the writer lock is held, so when saves overlap
    /// the one that finishes last also carries the newest state.
    pub async fn save_with<F>(&self, capture: F) -> Result<()>
    where
        F: FnOnce() -> Snapshot + Send,
    {
        let _writer = self.writer.lock().await;
        let snapshot = capture();

        match self.store.save(&snapshot).await {
            Ok(()) => {
                tracing::debug!(
                    "Saved snapshot ({} documents, next id {})",
                    snapshot.documents.len(),
                    snapshot.next_id
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to save snapshot: {}", e);
                Err(e)
            }
        }
    }

    /// Save a snapshot as-is.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        self.save_with(|| snapshot.clone()).await
    }
}
