use axum::{extract::State, http::StatusCode, Json};
use safchat_types::Collection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
}

pub async fn create_collection(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCollectionRequest>,
) -> ApiResult<(StatusCode, Json<Collection>)> {
    let collection = state.chat.create_collection(&req.name).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}
