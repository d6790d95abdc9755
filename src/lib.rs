//! Per-user hierarchical file storage emulated on top of a flat,
//! key-addressed object store.
//!
//! The store knows nothing about directories: the `storage_ops` modules
//! synthesize folder create/list/move/rename/delete and zip export from the
//! primitive put/get/delete/copy/list operations, keyed under a per-user
//! prefix.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

pub mod storage_ops;

use storage_ops::store::ObjectStore;
use storage_ops::{file_handlers, folder_handlers};

// --- Application State ---
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/file",
            post(file_handlers::upload_file)
                .get(file_handlers::download_file)
                .delete(file_handlers::delete_file),
        )
        .route("/api/v1/file/move", get(file_handlers::move_file))
        .route("/api/v1/file/rename", get(file_handlers::rename_file))
        .route(
            "/api/v1/directory",
            post(folder_handlers::create_directory)
                .get(folder_handlers::get_directory)
                .delete(folder_handlers::delete_directory),
        )
        .route(
            "/api/v1/directory/move-folder",
            get(folder_handlers::move_folder),
        )
        .route(
            "/api/v1/directory/rename-folder",
            get(folder_handlers::rename_folder),
        )
        .route(
            "/api/v1/directory/download-folder",
            get(folder_handlers::download_folder),
        )
        .with_state(state)
}
