use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use safchat_assistant::AssistantError;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Assistant error: {0}")]
    Upstream(#[from] AssistantError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(AssistantError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(AssistantError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Upstream(AssistantError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(AssistantError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(StoreError::CollectionNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Config(_) | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::NotFound(_) | ApiError::BadRequest(_) | ApiError::Conflict(_) => {
                self.to_string()
            }
            ApiError::Upstream(AssistantError::InvalidInput(msg)) => {
                format!("Invalid request: {}", msg)
            }
            ApiError::Upstream(AssistantError::Timeout { .. }) => {
                tracing::warn!("Assistant timeout: {}", self);
                "Assistant did not respond in time".to_string()
            }
            ApiError::Upstream(AssistantError::Cancelled) => {
                tracing::info!("Request cancelled");
                "Request cancelled".to_string()
            }
            ApiError::Upstream(AssistantError::VectorStoreNotReady { .. }) => {
                tracing::warn!("{}", self);
                "Documents are still being indexed, try again shortly".to_string()
            }
            ApiError::Upstream(e) => {
                tracing::error!("Assistant error: {}", e);
                "Assistant service error".to_string()
            }
            ApiError::Store(StoreError::CollectionNotFound(id)) => {
                format!("Collection not found: {}", id)
            }
            ApiError::Store(e) => {
                tracing::error!("Storage error: {}", e);
                "Storage error".to_string()
            }
            ApiError::Config(msg) => {
                tracing::error!("Config error: {}", msg);
                "Configuration error".to_string()
            }
            ApiError::Internal => {
                tracing::error!("Internal error: {}", self);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("limit".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AssistantError::Cancelled).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(AssistantError::Timeout {
                operation: "file batch indexing",
                budget: Duration::from_secs(90),
                last_status: "in_progress".into(),
            })
            .status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::from(AssistantError::RunFailed {
                run_id: "run_1".into(),
                status: "failed".into(),
                body: "{}".into(),
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(AssistantError::InvalidInput("question must not be empty".into()))
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
