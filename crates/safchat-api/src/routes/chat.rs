use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::ApiResult,
    service::{ChatAnswer, ChatView},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Conversation history of the collection's current thread
pub async fn open_chat(
    State(state): State<Arc<AppState>>,
    Path(collection_id): Path<Uuid>,
) -> ApiResult<Json<ChatView>> {
    let cancel = state.request_token();
    let view = state.chat.open_chat(collection_id, &cancel).await?;
    Ok(Json(view))
}

/// Ask a question; blocks until the run finishes
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Path(collection_id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> ApiResult<Json<ChatAnswer>> {
    let cancel = state.request_token();
    let answer = state.chat.ask(collection_id, &req.question, &cancel).await?;
    Ok(Json(answer))
}

pub async fn new_chat(
    State(state): State<Arc<AppState>>,
    Path(collection_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let cancel = state.request_token();
    state.chat.new_chat(collection_id, &cancel).await?;
    Ok(StatusCode::NO_CONTENT)
}
