//! Per-collection chat flow: vector store upkeep, thread lifecycle, file
//! ingestion and citation resolution.
//!
//! Every operation receives the collection id and loads its files from the
//! [`FileStore`]; nothing is cached between requests.

use std::sync::Arc;

use safchat_assistant::{
    AssistantConfig, AssistantError, AssistantsApi, CancellationToken, ConversationOrchestrator, FileIngestor,
    PollPolicy, RepairRequest, VectorStoreKeeper,
};
use safchat_citations::CitationResolver;
use safchat_types::{ChatMessage, ChatRole, Collection, FileRecord};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::store::{CollectionStore, FileStore};

/// Rendered history of a collection's current thread
#[derive(Debug, Clone, Serialize)]
pub struct ChatView {
    pub collection_id: Uuid,
    pub thread_id: Option<String>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    pub thread_id: String,
    pub text: String,
    pub html: String,
}

pub struct ChatService {
    collections: Arc<dyn CollectionStore>,
    files: Arc<dyn FileStore>,
    orchestrator: ConversationOrchestrator,
    ingestor: FileIngestor,
    keeper: VectorStoreKeeper,
    assistant_id: String,
    history_limit: usize,
    max_files_allowed: usize,
}

impl ChatService {
    pub fn new(
        api: Arc<dyn AssistantsApi>,
        collections: Arc<dyn CollectionStore>,
        files: Arc<dyn FileStore>,
        config: &AssistantConfig,
        assistant_id: impl Into<String>,
    ) -> Self {
        Self {
            collections,
            files,
            orchestrator: ConversationOrchestrator::new(api.clone(), config),
            ingestor: FileIngestor::new(api.clone(), config),
            keeper: VectorStoreKeeper::new(api, config),
            assistant_id: assistant_id.into(),
            history_limit: config.history_limit,
            max_files_allowed: config.max_files_allowed,
        }
    }

    /// Override both poll policies
    pub fn with_policies(mut self, run: PollPolicy, indexing: PollPolicy) -> Self {
        self.orchestrator = self.orchestrator.with_run_policy(run);
        self.ingestor = self.ingestor.with_policy(indexing);
        self.keeper = self.keeper.with_policy(indexing);
        self
    }

    pub async fn create_collection(&self, name: &str) -> ApiResult<Collection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::BadRequest("collection name must not be empty".to_string()));
        }
        let collection = self.collections.create(name).await?;
        tracing::info!(collection_id = %collection.id, name, "Created collection");
        Ok(collection)
    }

    pub async fn list_files(&self, collection_id: Uuid) -> ApiResult<Vec<FileRecord>> {
        self.collection(collection_id).await?;
        Ok(self.files.list(collection_id).await?)
    }

    /// Load the current conversation with citations resolved.
    ///
    /// An existing vector store is checked and repaired first; a collection
    /// that never had one is left alone until the first question or upload.
    pub async fn open_chat(
        &self,
        collection_id: Uuid,
        cancel: &CancellationToken,
    ) -> ApiResult<ChatView> {
        let mut collection = self.collection(collection_id).await?;
        let files = self.files.list(collection_id).await?;

        if has_value(&collection.vector_store_id) {
            self.ensure_vector_store(&mut collection, &files, cancel)
                .await?;
        }

        let Some(thread_id) = collection.thread_id.clone().filter(|id| !id.trim().is_empty())
        else {
            return Ok(ChatView {
                collection_id,
                thread_id: None,
                messages: Vec::new(),
            });
        };

        let resolver = CitationResolver::new(&files);
        let messages = self
            .orchestrator
            .get_thread_history_html(&thread_id, self.history_limit, cancel)
            .await?
            .into_iter()
            .map(|mut message| {
                if message.role == ChatRole::Assistant {
                    message.html = resolver.resolve(&message.html);
                }
                message
            })
            .collect();

        Ok(ChatView {
            collection_id,
            thread_id: Some(thread_id),
            messages,
        })
    }

    pub async fn ask(
        &self,
        collection_id: Uuid,
        question: &str,
        cancel: &CancellationToken,
    ) -> ApiResult<ChatAnswer> {
        if question.trim().is_empty() {
            return Err(ApiError::BadRequest("question must not be empty".to_string()));
        }

        let mut collection = self.collection(collection_id).await?;
        let files = self.files.list(collection_id).await?;
        let vector_store_id = self
            .ensure_vector_store(&mut collection, &files, cancel)
            .await?;

        let thread_id = match collection.thread_id.clone().filter(|id| !id.trim().is_empty()) {
            Some(thread_id) => thread_id,
            None => {
                let thread_id = self
                    .orchestrator
                    .create_thread_for_vector_store(&vector_store_id, cancel)
                    .await?;
                let previous = self
                    .collections
                    .set_thread_id(collection_id, Some(thread_id.clone()))
                    .await?;
                if let Some(previous) = previous.filter(|p| p != &thread_id) {
                    // last write wins; the other request's thread is orphaned
                    tracing::warn!(
                        %collection_id,
                        previous = %previous,
                        thread_id = %thread_id,
                        "Overwrote thread id set by a concurrent request"
                    );
                }
                thread_id
            }
        };

        let reply = self
            .orchestrator
            .ask(&thread_id, &self.assistant_id, question, cancel)
            .await?;
        let resolver = CitationResolver::new(&files);

        Ok(ChatAnswer {
            thread_id,
            html: resolver.resolve(&reply.html),
            text: reply.text,
        })
    }

    /// Drop the current thread; the next question starts a new one
    pub async fn new_chat(&self, collection_id: Uuid, cancel: &CancellationToken) -> ApiResult<()> {
        let collection = self.collection(collection_id).await?;

        if let Some(thread_id) = collection.thread_id.filter(|id| !id.trim().is_empty()) {
            self.orchestrator.delete_thread(&thread_id, cancel).await?;
            tracing::info!(%collection_id, thread_id = %thread_id, "Started new chat");
        }
        self.collections.set_thread_id(collection_id, None).await?;
        Ok(())
    }

    pub async fn upload_file(
        &self,
        collection_id: Uuid,
        file_name: &str,
        content_type: &str,
        content: Vec<u8>,
        cancel: &CancellationToken,
    ) -> ApiResult<FileRecord> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(ApiError::BadRequest("file name must not be empty".to_string()));
        }
        if content.is_empty() {
            return Err(ApiError::BadRequest(format!("{} is empty", file_name)));
        }

        let mut collection = self.collection(collection_id).await?;
        let files = self.files.list(collection_id).await?;
        if files.len() >= self.max_files_allowed {
            return Err(ApiError::Conflict(format!(
                "collection already holds the maximum of {} files",
                self.max_files_allowed
            )));
        }

        let vector_store_id = self
            .ensure_vector_store(&mut collection, &files, cancel)
            .await?;

        let record = FileRecord::new(collection_id, file_name)
            .with_content(content_type, content.len() as u64);
        let provider_file_id = match self
            .ingestor
            .upload_and_attach(&vector_store_id, content, file_name, content_type, cancel)
            .await
        {
            Ok(id) => id,
            Err(err) => return Err(self.discard_orphan(err, cancel).await),
        };

        let record = record.with_provider_file_id(provider_file_id);
        self.files.insert(record.clone()).await?;
        tracing::info!(
            %collection_id,
            file_id = %record.id,
            provider_file_id = record.provider_file_id.as_deref().unwrap_or_default(),
            "Stored file"
        );
        Ok(record)
    }

    /// Detach from the vector store, delete the hosted copy, drop the record
    pub async fn delete_file(
        &self,
        collection_id: Uuid,
        file_id: Uuid,
        cancel: &CancellationToken,
    ) -> ApiResult<()> {
        let collection = self.collection(collection_id).await?;
        let record = self
            .files
            .get(collection_id, file_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("file {}", file_id)))?;

        if let Some(provider_file_id) = record.provider_file_id.as_deref() {
            if let Some(vector_store_id) =
                collection.vector_store_id.as_deref().filter(|id| !id.trim().is_empty())
            {
                self.ingestor
                    .detach(vector_store_id, provider_file_id, cancel)
                    .await?;
            }
            self.ingestor.delete(provider_file_id, cancel).await?;
        }

        self.files.remove(collection_id, file_id).await?;
        tracing::info!(%collection_id, %file_id, "Deleted file");
        Ok(())
    }

    /// Delete the hosted file a failed attachment left behind.
    ///
    /// The returned error is the attachment's cause. A cleanup failure is
    /// only logged since the upload already failed.
    async fn discard_orphan(&self, err: AssistantError, cancel: &CancellationToken) -> ApiError {
        if let Some(file_id) = err.orphaned_file_id() {
            // the request token may be what cancelled the attachment
            let cleanup = if cancel.is_cancelled() {
                CancellationToken::new()
            } else {
                cancel.clone()
            };
            match self.ingestor.delete(file_id, &cleanup).await {
                Ok(()) => tracing::info!(file_id, "Deleted file orphaned by failed attachment"),
                Err(delete_err) => tracing::error!(
                    file_id,
                    "Failed to delete orphaned provider file: {}",
                    delete_err
                ),
            }
        }
        ApiError::Upstream(err.into_root_cause())
    }

    async fn collection(&self, collection_id: Uuid) -> ApiResult<Collection> {
        self.collections
            .get(collection_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("collection {}", collection_id)))
    }

    /// Ready vector store id for `collection`, creating or repairing it.
    ///
    /// A thread is bound to one store when it is created, so when the id
    /// changes the old thread is deleted and cleared.
    async fn ensure_vector_store(
        &self,
        collection: &mut Collection,
        files: &[FileRecord],
        cancel: &CancellationToken,
    ) -> ApiResult<String> {
        let current = collection.vector_store_id.clone().unwrap_or_default();
        let repair = RepairRequest::new(collection.vector_store_name())
            .with_file_ids(files.iter().filter_map(|f| f.provider_file_id.clone()))
            .with_metadata("collection_id", collection.id.to_string());

        let ready = self
            .keeper
            .ensure_ready_or_repair(&current, &repair, cancel)
            .await?;
        if ready == current {
            return Ok(ready);
        }

        self.collections
            .set_vector_store_id(collection.id, Some(ready.clone()))
            .await?;
        collection.vector_store_id = Some(ready.clone());

        if let Some(thread_id) = collection.thread_id.take() {
            self.orchestrator.delete_thread(&thread_id, cancel).await?;
            self.collections.set_thread_id(collection.id, None).await?;
            tracing::info!(
                collection_id = %collection.id,
                thread_id = %thread_id,
                vector_store_id = %ready,
                "Retired thread bound to replaced vector store"
            );
        }

        Ok(ready)
    }
}

fn has_value(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
