//! docstore-server: HTTP transport for the document repository.
//!
//! Provides:
//! - Document CRUD under `/api/documents`
//! - File upload under `/api/upload`
//! - Optional static front-end served at `/`
//! - Permissive CORS and request tracing

pub mod api;
pub mod config;
pub mod error;

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use docstore_core::{
    DocumentRepository, DocumentService, JsonFileStore, PersistenceManager, MAX_UPLOAD_BYTES,
};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::Config;

/// Request bodies may exceed the upload ceiling so oversized files reach the
/// ingestion adapter and get its rejection, not a generic body-limit error.
pub const BODY_LIMIT_BYTES: usize = 2 * MAX_UPLOAD_BYTES;

/// Shared application state
pub struct AppState {
    pub service: DocumentService,
}

impl AppState {
    pub fn new(service: DocumentService) -> Self {
        Self { service }
    }

    /// Open the snapshot in `data_dir` and build the service on top of it.
    pub async fn open(config: &Config, data_dir: &Path) -> Self {
        let store = JsonFileStore::new(config.snapshot_path(data_dir));
        tracing::info!("Using snapshot file {:?}", store.path());

        let repository = DocumentRepository::open(PersistenceManager::new(store)).await;
        Self::new(DocumentService::new(Arc::new(repository)))
    }
}

/// Build the router, nested under `base_url` when one is given.
pub fn router(state: Arc<AppState>, config: &Config, base_url: &str) -> Router {
    let mut app = Router::new()
        .route(
            "/api/documents",
            post(api::documents::create_handler).get(api::documents::list_handler),
        )
        .route(
            "/api/documents/{id}",
            get(api::documents::get_handler)
                .put(api::documents::update_handler)
                .delete(api::documents::delete_handler),
        )
        .route("/api/upload", post(api::upload::handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state);

    if let Some(static_dir) = &config.static_dir {
        let index = ServeFile::new(static_dir.join(&config.index_file));
        app = app
            .route_service("/", index.clone())
            .route_service("/index.html", index)
            .fallback_service(ServeDir::new(static_dir));
    }

    let base = base_url.trim_end_matches('/');
    if !base.is_empty() {
        let base = if base.starts_with('/') {
            base.to_string()
        } else {
            format!("/{}", base)
        };
        app = Router::new().nest(&base, app);
    }

    if config.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }

    app.layer(TraceLayer::new_for_http())
}
