//! Uploading file bytes to the provider and attaching them to a vector store.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::AssistantConfig;
use crate::error::{AssistantError, Result};
use crate::openai::{CreateFileBatchRequest, FileBatchObject, FileUpload};
use crate::polling::{wait_for_batch, PollPolicy};
use crate::traits::{ignore_not_found, AssistantsApi};

pub struct FileIngestor {
    api: Arc<dyn AssistantsApi>,
    policy: PollPolicy,
}

impl FileIngestor {
    pub fn new(api: Arc<dyn AssistantsApi>, config: &AssistantConfig) -> Self {
        Self {
            api,
            policy: config.indexing_policy(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Upload `content`, attach it to `vector_store_id` and wait for indexing.
    ///
    /// Returns the provider file id. When attachment fails the uploaded file
    /// is left in place and the error is [`AssistantError::AttachFailed`],
    /// carrying its id so the caller can clean it up.
    pub async fn upload_and_attach(
        &self,
        vector_store_id: &str,
        content: Vec<u8>,
        file_name: &str,
        content_type: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if vector_store_id.trim().is_empty() {
            return Err(AssistantError::InvalidInput(
                "vector store id must not be empty".to_string(),
            ));
        }
        if file_name.trim().is_empty() {
            return Err(AssistantError::InvalidInput(
                "file name must not be empty".to_string(),
            ));
        }

        let size = content.len();
        let file = self
            .api
            .upload_file(FileUpload::for_assistants(file_name, content_type, content), cancel)
            .await?;
        tracing::info!(file_id = %file.id, file_name, size, "Uploaded file");

        if let Err(err) = self
            .attach(vector_store_id, std::slice::from_ref(&file.id), cancel)
            .await
        {
            tracing::warn!(
                file_id = %file.id,
                vector_store_id,
                "Attachment failed, provider file left orphaned: {}",
                err
            );
            return Err(AssistantError::AttachFailed {
                file_id: file.id,
                source: Box::new(err),
            });
        }

        Ok(file.id)
    }

    /// Attach already-hosted files in one batch and wait for indexing
    pub async fn attach(
        &self,
        vector_store_id: &str,
        file_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<FileBatchObject> {
        attach_batch(self.api.as_ref(), vector_store_id, file_ids, self.policy, cancel).await
    }

    /// Remove a file from a vector store; the hosted file itself stays
    pub async fn detach(
        &self,
        vector_store_id: &str,
        file_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        ignore_not_found(
            self.api
                .delete_vector_store_file(vector_store_id, file_id, cancel)
                .await,
            "Vector store file",
            file_id,
        )
    }

    /// Delete a hosted file; idempotent
    pub async fn delete(&self, file_id: &str, cancel: &CancellationToken) -> Result<()> {
        ignore_not_found(self.api.delete_file(file_id, cancel).await, "File", file_id)
    }
}

pub(crate) async fn attach_batch(
    api: &dyn AssistantsApi,
    vector_store_id: &str,
    file_ids: &[String],
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> Result<FileBatchObject> {
    let request = CreateFileBatchRequest {
        file_ids: file_ids.to_vec(),
    };
    let batch = api.create_file_batch(vector_store_id, request, cancel).await?;
    tracing::debug!(
        batch_id = %batch.id,
        vector_store_id,
        files = file_ids.len(),
        "Created file batch"
    );

    wait_for_batch(api, vector_store_id, batch, policy, cancel).await
}
