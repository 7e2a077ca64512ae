//! HTTP API endpoints
//!
//! Each handler is a thin adapter over [`docstore_core::DocumentService`].

pub mod documents;
pub mod upload;
