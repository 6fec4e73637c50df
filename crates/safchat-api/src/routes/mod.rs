pub mod chat;
pub mod collections;
pub mod files;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;

/// Application routes without the outer middleware stack
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.server.max_upload_bytes;

    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Collections
        .route("/collections", post(collections::create_collection))
        // Chat
        .route("/collections/:collection_id/chat", get(chat::open_chat))
        .route("/collections/:collection_id/chat", post(chat::ask))
        .route("/collections/:collection_id/chat", delete(chat::new_chat))
        // Files
        .route("/collections/:collection_id/files", get(files::list_files))
        .route(
            "/collections/:collection_id/files",
            post(files::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/collections/:collection_id/files/:file_id",
            delete(files::delete_file),
        )
        .with_state(state)
}
