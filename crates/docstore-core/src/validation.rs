//! Validation pipeline for inbound create/update payloads.
//!
//! Payloads arrive untyped (straight from a JSON body or from file
//! ingestion). [`validate`] is the only way to obtain a [`ValidPayload`], so
//! the repository never sees data that skipped these checks.

use crate::document::DocumentFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("content is required")]
    MissingContent,

    #[error("content must be a string")]
    ContentNotString,

    #[error("format must be a string")]
    FormatNotString,

    #[error("format must be \"markdown\" or \"latex\", got \"{0}\"")]
    UnknownFormat(String),
}

/// The field set submitted for create/update, prior to validation.
///
/// JSON `null` deserializes as `None`, so an explicit null is treated the
/// same as an omitted field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPayload {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub format: Option<Value>,
}

impl DocumentPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<Value>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<Value>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn format(mut self, format: impl Into<Value>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// A payload that passed [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPayload {
    title: Option<String>,
    content: String,
    format: Option<DocumentFormat>,
}

impl ValidPayload {
    /// Title to apply, if one was supplied. Empty titles count as not supplied.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Format to apply, if one was supplied.
    pub fn format(&self) -> Option<DocumentFormat> {
        self.format
    }

    pub(crate) fn into_parts(self) -> (Option<String>, String, Option<DocumentFormat>) {
        (self.title, self.content, self.format)
    }
}

/// Check a payload. Pure: no I/O and no repository access.
///
/// Rules, in order:
/// 1. `content` must be present and a string (empty is fine).
/// 2. `format`, when present, must be exactly `markdown` or `latex`.
///
/// `title` is freeform. `null`, `false`, `0` and `""` count as not
/// supplied; any other non-string title is kept as its JSON text.
pub fn validate(payload: &DocumentPayload) -> Result<ValidPayload, ValidationError> {
    let content = match &payload.content {
        None | Some(Value::Null) => return Err(ValidationError::MissingContent),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(ValidationError::ContentNotString),
    };

    let format = match &payload.format {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(
            s.parse::<DocumentFormat>()
                .map_err(ValidationError::UnknownFormat)?,
        ),
        Some(_) => return Err(ValidationError::FormatNotString),
    };

    let title = match &payload.title {
        None => None,
        Some(value) if is_blank_title(value) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    Ok(ValidPayload {
        title,
        content,
        format,
    })
}

fn is_blank_title(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
