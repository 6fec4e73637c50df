use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Assistant API error during {operation} ({status}): {body}")]
    Api {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Run {run_id} ended with status {status}: {body}")]
    RunFailed {
        run_id: String,
        status: String,
        body: String,
    },

    #[error("File batch {batch_id} ended with status {status}: {body}")]
    BatchFailed {
        batch_id: String,
        status: String,
        body: String,
    },

    #[error("{operation} did not finish within {budget:?} (last status: {last_status})")]
    Timeout {
        operation: &'static str,
        budget: Duration,
        last_status: String,
    },

    #[error("Vector store {vector_store_id} is not ready (status: {status}); retry later")]
    VectorStoreNotReady {
        vector_store_id: String,
        status: String,
    },

    /// The file was uploaded but never attached; `file_id` is still hosted
    #[error("Attaching uploaded file {file_id} failed: {source}")]
    AttachFailed {
        file_id: String,
        #[source]
        source: Box<AssistantError>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AssistantError {
    /// Provider answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), Self::Cancelled)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.root_cause(), Self::Timeout { .. })
    }

    /// Hosted file left behind by a failed attachment
    pub fn orphaned_file_id(&self) -> Option<&str> {
        match self {
            Self::AttachFailed { file_id, .. } => Some(file_id),
            _ => None,
        }
    }

    /// The error underneath any [`AssistantError::AttachFailed`] wrapping
    pub fn root_cause(&self) -> &AssistantError {
        match self {
            Self::AttachFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Drop the [`AssistantError::AttachFailed`] wrapping once the orphan is handled
    pub fn into_root_cause(self) -> AssistantError {
        match self {
            Self::AttachFailed { source, .. } => source.into_root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
