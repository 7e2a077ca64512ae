//! File ingestion: turns an uploaded file into a create payload.
//!
//! Acceptance is decided from the declared content type or the filename
//! suffix. Format is inferred from the suffix alone; content is never
//! sniffed.

use crate::document::DocumentFormat;
use crate::validation::DocumentPayload;
use thiserror::Error;

/// Largest accepted upload (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Declared content types accepted regardless of filename.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &["text/plain", "text/markdown", "application/x-tex"];

/// Filename suffixes accepted regardless of declared content type.
pub const ACCEPTED_SUFFIXES: &[&str] = &[".md", ".tex"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("file is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("file type not allowed: {filename} ({})", .declared_type.as_deref().unwrap_or("no content type"))]
    UnsupportedType {
        filename: String,
        declared_type: Option<String>,
    },
}

/// An uploaded file as received by the transport.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub declared_type: Option<String>,
}

impl FileUpload {
    pub fn new(bytes: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
            declared_type: None,
        }
    }

    pub fn with_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Converts uploads into [`DocumentPayload`]s.
#[derive(Debug, Clone)]
pub struct FileIngestor {
    max_bytes: usize,
}

impl FileIngestor {
    pub fn new() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }

    /// Check size and type, then build the create payload.
    ///
    /// The payload still has to pass validation before it reaches the
    /// repository.
    pub fn ingest(&self, upload: &FileUpload) -> Result<DocumentPayload, UploadRejection> {
        if upload.size() > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                size: upload.size(),
                limit: self.max_bytes,
            });
        }

        if !is_accepted(&upload.filename, upload.declared_type.as_deref()) {
            return Err(UploadRejection::UnsupportedType {
                filename: upload.filename.clone(),
                declared_type: upload.declared_type.clone(),
            });
        }

        let content = String::from_utf8_lossy(&upload.bytes).into_owned();
        let format = infer_format(&upload.filename);

        tracing::debug!(
            "Ingesting {} ({} bytes) as {}",
            upload.filename,
            upload.size(),
            format
        );

        Ok(DocumentPayload::new()
            .title(upload.filename.as_str())
            .content(content)
            .format(format.as_str()))
    }
}

impl Default for FileIngestor {
    fn default() -> Self {
        Self::new()
    }
}

/// `.md` is markdown; every other accepted file is treated as LaTeX.
pub fn infer_format(filename: &str) -> DocumentFormat {
    if filename.ends_with(".md") {
        DocumentFormat::Markdown
    } else {
        DocumentFormat::Latex
    }
}

fn is_accepted(filename: &str, declared_type: Option<&str>) -> bool {
    let type_ok = declared_type
        .map(essence)
        .is_some_and(|t| ACCEPTED_CONTENT_TYPES.contains(&t.as_str()));

    type_ok || ACCEPTED_SUFFIXES.iter().any(|suffix| filename.ends_with(suffix))
}

/// `Text/Markdown; charset=utf-8` -> `text/markdown`
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
