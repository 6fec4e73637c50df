// Fixed-interval polling with cooperative cancellation

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{AssistantError, Result};
use crate::openai::{BatchStatus, FileBatchObject};
use crate::traits::AssistantsApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until a terminal state or cancellation
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Fail fast when the caller has already given up
pub fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(AssistantError::Cancelled)
    } else {
        Ok(())
    }
}

/// Sleep one interval, returning early with `Cancelled`
pub async fn pause(interval: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(AssistantError::Cancelled),
        _ = tokio::time::sleep(interval) => Ok(()),
    }
}

/// Poll an attachment batch until `completed`, a fatal status, or the
/// policy's timeout.
pub async fn wait_for_batch(
    api: &dyn AssistantsApi,
    vector_store_id: &str,
    initial: FileBatchObject,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> Result<FileBatchObject> {
    let started = Instant::now();
    let mut batch = initial;

    loop {
        ensure_active(cancel)?;

        match batch.status {
            BatchStatus::Completed => {
                tracing::debug!(batch_id = %batch.id, "File batch completed");
                return Ok(batch);
            }
            BatchStatus::Failed | BatchStatus::Cancelled => {
                return Err(AssistantError::BatchFailed {
                    batch_id: batch.id.clone(),
                    status: batch.status.to_string(),
                    body: serde_json::to_string(&batch).unwrap_or_default(),
                });
            }
            BatchStatus::InProgress | BatchStatus::Unknown => {}
        }

        if let Some(budget) = policy.timeout {
            if started.elapsed() >= budget {
                return Err(AssistantError::Timeout {
                    operation: "file batch indexing",
                    budget,
                    last_status: batch.status.to_string(),
                });
            }
        }

        pause(policy.interval, cancel).await?;
        batch = api.get_file_batch(vector_store_id, &batch.id, cancel).await?;
        tracing::debug!(batch_id = %batch.id, status = %batch.status, "Polled file batch");
    }
}
