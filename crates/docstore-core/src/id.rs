//! Document identifiers and the allocator that hands them out.
//!
//! Identifiers are plain integers on the wire (`1`, `2`, ...) so snapshots
//! written by older versions of the service load unchanged.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentIdError {
    #[error("Invalid document ID: {0}")]
    InvalidFormat(#[from] std::num::ParseIntError),
}

/// A unique, never reused identifier for a stored document.
///
/// # Examples
/// ```
/// use docstore_core::DocumentId;
///
/// let id: DocumentId = "42".parse().unwrap();
/// assert_eq!(id.as_u64(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    /// The first identifier handed out by a fresh allocator.
    pub const FIRST: DocumentId = DocumentId(1);

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = DocumentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<u64> for DocumentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<DocumentId> for u64 {
    fn from(id: DocumentId) -> u64 {
        id.0
    }
}

/// Monotonic identifier counter.
///
/// The counter is authoritative: it is persisted alongside the documents and
/// restored as-is, so ids retired by deletion are never handed out again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Create an allocator starting at [`DocumentId::FIRST`].
    pub fn new() -> Self {
        Self {
            next: DocumentId::FIRST.0,
        }
    }

    /// Restore an allocator from a persisted counter.
    ///
    /// The restored counter is raised to stay strictly above `highest_seen`
    /// (and never below the first id), so a damaged snapshot cannot cause an
    /// id to be issued twice.
    pub fn restore(counter: DocumentId, highest_seen: Option<DocumentId>) -> Self {
        let floor = highest_seen.map_or(DocumentId::FIRST.0, |id| id.0.saturating_add(1));
        let next = counter.0.max(floor);
        if next != counter.0 {
            tracing::warn!(
                "Persisted id counter {} is behind stored documents, resuming at {}",
                counter,
                next
            );
        }
        Self { next }
    }

    /// Take the next identifier.
    pub fn next(&mut self) -> DocumentId {
        let id = DocumentId(self.next);
        self.next += 1;
        id
    }

    /// The identifier the next call to [`IdAllocator::next`] will return.
    pub fn peek(&self) -> DocumentId {
        DocumentId(self.next)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
