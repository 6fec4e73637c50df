use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use safchat_types::FileRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct FileResponse {
    pub file_id: Uuid,
    pub original_name: String,
    pub label: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_file_id: Option<String>,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            file_id: record.id,
            label: record.display_label(),
            url: record.local_url(),
            original_name: record.original_name,
            provider_file_id: record.provider_file_id,
            size_bytes: record.size_bytes,
            uploaded_at: record.uploaded_at,
        }
    }
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(collection_id): Path<Uuid>,
) -> ApiResult<Json<Vec<FileResponse>>> {
    let files = state.chat.list_files(collection_id).await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

/// Multipart upload; the part named `file` is ingested
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(collection_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<FileResponse>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("file part has no file name".to_string()))?;
        let content_type = field.content_type().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let cancel = state.request_token();
        let record = state
            .chat
            .upload_file(collection_id, &file_name, &content_type, content.to_vec(), &cancel)
            .await?;
        return Ok((StatusCode::CREATED, Json(record.into())));
    }

    Err(ApiError::BadRequest(format!(
        "multipart body has no '{}' part",
        FILE_FIELD
    )))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path((collection_id, file_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let cancel = state.request_token();
    state.chat.delete_file(collection_id, file_id, &cancel).await?;
    Ok(StatusCode::NO_CONTENT)
}
