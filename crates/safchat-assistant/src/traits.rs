use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::openai::{
    CreateFileBatchRequest, CreateMessageRequest, CreateRunRequest, CreateThreadRequest,
    CreateVectorStoreRequest, FileBatchObject, FileObject, FileUpload, ListMessagesQuery,
    ListResponse, MessageObject, RunObject, ThreadObject, VectorStoreObject,
};

/// Transport for the hosted assistant provider.
///
/// One method per REST endpoint. Implementations return
/// [`AssistantError::Api`](crate::AssistantError::Api) for non-2xx answers,
/// including 404 on deletes; swallowing "already gone" is left to callers.
/// Every call must give up with `Cancelled` once `cancel` fires.
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    async fn create_thread(
        &self,
        request: CreateThreadRequest,
        cancel: &CancellationToken,
    ) -> Result<ThreadObject>;

    async fn delete_thread(&self, thread_id: &str, cancel: &CancellationToken) -> Result<()>;

    async fn create_message(
        &self,
        thread_id: &str,
        request: CreateMessageRequest,
        cancel: &CancellationToken,
    ) -> Result<MessageObject>;

    async fn list_messages(
        &self,
        thread_id: &str,
        query: ListMessagesQuery,
        cancel: &CancellationToken,
    ) -> Result<ListResponse<MessageObject>>;

    async fn create_run(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
        cancel: &CancellationToken,
    ) -> Result<RunObject>;

    async fn get_run(
        &self,
        thread_id: &str,
        run_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RunObject>;

    async fn upload_file(&self, upload: FileUpload, cancel: &CancellationToken)
        -> Result<FileObject>;

    async fn delete_file(&self, file_id: &str, cancel: &CancellationToken) -> Result<()>;

    async fn create_vector_store(
        &self,
        request: CreateVectorStoreRequest,
        cancel: &CancellationToken,
    ) -> Result<VectorStoreObject>;

    async fn get_vector_store(
        &self,
        vector_store_id: &str,
        cancel: &CancellationToken,
    ) -> Result<VectorStoreObject>;

    async fn delete_vector_store(
        &self,
        vector_store_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    async fn create_file_batch(
        &self,
        vector_store_id: &str,
        request: CreateFileBatchRequest,
        cancel: &CancellationToken,
    ) -> Result<FileBatchObject>;

    async fn get_file_batch(
        &self,
        vector_store_id: &str,
        batch_id: &str,
        cancel: &CancellationToken,
    ) -> Result<FileBatchObject>;

    async fn delete_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Map a 404 from a delete call to success
pub(crate) fn ignore_not_found(result: Result<()>, what: &str, id: &str) -> Result<()> {
    match result {
        Err(err) if err.is_not_found() => {
            tracing::warn!("{} {} already absent, treating delete as done", what, id);
            Ok(())
        }
        other => other,
    }
}
