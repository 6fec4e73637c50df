#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use safchat_api::store::{InMemoryCollectionStore, InMemoryFileStore};
use safchat_api::ChatService;
use safchat_assistant::openai::{
    Annotation, BatchStatus, CreateFileBatchRequest, CreateMessageRequest, CreateRunRequest,
    CreateThreadRequest, CreateVectorStoreRequest, FileBatchObject, FileObject, FileReference,
    FileUpload, ListMessagesQuery, ListResponse, MessageContent, MessageObject, RunObject,
    RunStatus, SortOrder, TextContent, ThreadObject, VectorStoreObject, VectorStoreStatus,
};
use safchat_assistant::{
    AssistantConfig, AssistantError, AssistantsApi, CancellationToken, PollPolicy, Result,
};

/// Provider double that keeps threads, files and stores in memory.
///
/// Every run completes immediately and appends `answer` as the assistant
/// reply, citing `cited_file` when set.
#[derive(Default)]
pub struct FakeProvider {
    pub state: Mutex<ProviderState>,
}

#[derive(Default)]
pub struct ProviderState {
    pub calls: Vec<String>,
    pub threads: HashMap<String, Vec<MessageObject>>,
    pub thread_stores: HashMap<String, String>,
    pub stores: HashMap<String, VectorStoreObject>,
    pub files: HashSet<String>,
    pub batches: Vec<(String, Vec<String>)>,
    pub detached: Vec<(String, String)>,
    pub answer: String,
    pub cited_file: Option<String>,
    /// New attachment batches report `failed`
    pub failing_batches: bool,
    counter: usize,
    clock: i64,
}

impl ProviderState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{}{}", prefix, self.counter)
    }

    fn tick(&mut self) -> i64 {
        self.clock += 1;
        1_700_000_000 + self.clock
    }
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        let provider = Self::default();
        provider.state.lock().unwrap().answer = "Refunds are accepted within 30 days.".to_string();
        Arc::new(provider)
    }

    pub fn answer_with(&self, answer: &str, cited_file: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        state.answer = answer.to_string();
        state.cited_file = cited_file.map(str::to_string);
    }

    pub fn expire_store(&self, vector_store_id: &str) {
        if let Some(store) = self.state.lock().unwrap().stores.get_mut(vector_store_id) {
            store.status = VectorStoreStatus::Expired;
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

fn not_found(operation: &'static str) -> AssistantError {
    AssistantError::Api {
        operation,
        status: StatusCode::NOT_FOUND,
        body: r#"{"error":{"message":"No such object"}}"#.to_string(),
    }
}

fn text_message(id: String, role: &str, text: &str, annotations: Vec<Annotation>, created_at: i64) -> MessageObject {
    MessageObject {
        id,
        created_at,
        role: role.to_string(),
        content: vec![MessageContent {
            kind: "text".to_string(),
            text: Some(TextContent {
                value: text.to_string(),
                annotations,
            }),
        }],
        run_id: None,
    }
}

#[async_trait]
impl AssistantsApi for FakeProvider {
    async fn create_thread(
        &self,
        request: CreateThreadRequest,
        _cancel: &CancellationToken,
    ) -> Result<ThreadObject> {
        self.record("create_thread");
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("thread_");
        let store = request
            .tool_resources
            .and_then(|r| r.file_search)
            .and_then(|f| f.vector_store_ids.into_iter().next())
            .unwrap_or_default();
        state.threads.insert(id.clone(), Vec::new());
        state.thread_stores.insert(id.clone(), store);
        Ok(ThreadObject {
            id,
            created_at: 1_700_000_000,
        })
    }

    async fn delete_thread(&self, thread_id: &str, _cancel: &CancellationToken) -> Result<()> {
        self.record("delete_thread");
        let mut state = self.state.lock().unwrap();
        state
            .threads
            .remove(thread_id)
            .map(|_| ())
            .ok_or_else(|| not_found("delete thread"))
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: CreateMessageRequest,
        _cancel: &CancellationToken,
    ) -> Result<MessageObject> {
        self.record("create_message");
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("msg_");
        let created_at = state.tick();
        let message = text_message(id, "user", &request.content, Vec::new(), created_at);
        state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| not_found("create message"))?
            .push(message.clone());
        Ok(message)
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        query: ListMessagesQuery,
        _cancel: &CancellationToken,
    ) -> Result<ListResponse<MessageObject>> {
        self.record("list_messages");
        let state = self.state.lock().unwrap();
        let mut data = state
            .threads
            .get(thread_id)
            .cloned()
            .ok_or_else(|| not_found("list messages"))?;
        if query.order == SortOrder::Desc {
            data.reverse();
        }
        data.truncate(query.limit as usize);
        Ok(ListResponse {
            first_id: data.first().map(|m| m.id.clone()),
            last_id: data.last().map(|m| m.id.clone()),
            data,
            has_more: false,
        })
    }

    async fn create_run(
        &self,
        thread_id: &str,
        _request: CreateRunRequest,
        _cancel: &CancellationToken,
    ) -> Result<RunObject> {
        self.record("create_run");
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("msg_");
        let created_at = state.tick();
        let answer = state.answer.clone();
        let annotations = state
            .cited_file
            .iter()
            .map(|file_id| Annotation {
                kind: "file_citation".to_string(),
                text: None,
                start_index: None,
                end_index: Some(answer.chars().count()),
                file_citation: Some(FileReference {
                    file_id: file_id.clone(),
                }),
                file_path: None,
            })
            .collect();
        let reply = text_message(id, "assistant", &answer, annotations, created_at);
        state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| not_found("create run"))?
            .push(reply);

        Ok(RunObject {
            id: "run_1".to_string(),
            thread_id: thread_id.to_string(),
            status: RunStatus::Completed,
            last_error: None,
        })
    }

    async fn get_run(
        &self,
        thread_id: &str,
        run_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<RunObject> {
        self.record("get_run");
        Ok(RunObject {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status: RunStatus::Completed,
            last_error: None,
        })
    }

    async fn upload_file(
        &self,
        upload: FileUpload,
        _cancel: &CancellationToken,
    ) -> Result<FileObject> {
        self.record("upload_file");
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("file-");
        state.files.insert(id.clone());
        Ok(FileObject {
            id,
            filename: Some(upload.file_name),
            bytes: Some(upload.bytes.len() as u64),
            purpose: Some(upload.purpose),
        })
    }

    async fn delete_file(&self, file_id: &str, _cancel: &CancellationToken) -> Result<()> {
        self.record("delete_file");
        if self.state.lock().unwrap().files.remove(file_id) {
            Ok(())
        } else {
            Err(not_found("delete file"))
        }
    }

    async fn create_vector_store(
        &self,
        request: CreateVectorStoreRequest,
        _cancel: &CancellationToken,
    ) -> Result<VectorStoreObject> {
        self.record("create_vector_store");
        let mut state = self.state.lock().unwrap();
        let store = VectorStoreObject {
            id: state.next_id("vs_"),
            name: Some(request.name),
            status: VectorStoreStatus::Completed,
            expires_at: None,
            file_counts: None,
        };
        state.stores.insert(store.id.clone(), store.clone());
        Ok(store)
    }

    async fn get_vector_store(
        &self,
        vector_store_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<VectorStoreObject> {
        self.record("get_vector_store");
        self.state
            .lock()
            .unwrap()
            .stores
            .get(vector_store_id)
            .cloned()
            .ok_or_else(|| not_found("get vector store"))
    }

    async fn delete_vector_store(
        &self,
        vector_store_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.record("delete_vector_store");
        self.state
            .lock()
            .unwrap()
            .stores
            .remove(vector_store_id)
            .map(|_| ())
            .ok_or_else(|| not_found("delete vector store"))
    }

    async fn create_file_batch(
        &self,
        vector_store_id: &str,
        request: CreateFileBatchRequest,
        _cancel: &CancellationToken,
    ) -> Result<FileBatchObject> {
        self.record("create_file_batch");
        let mut state = self.state.lock().unwrap();
        state
            .batches
            .push((vector_store_id.to_string(), request.file_ids));
        Ok(FileBatchObject {
            id: "vsfb_1".to_string(),
            vector_store_id: vector_store_id.to_string(),
            status: if state.failing_batches {
                BatchStatus::Failed
            } else {
                BatchStatus::Completed
            },
            file_counts: None,
        })
    }

    async fn get_file_batch(
        &self,
        vector_store_id: &str,
        batch_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<FileBatchObject> {
        self.record("get_file_batch");
        Ok(FileBatchObject {
            id: batch_id.to_string(),
            vector_store_id: vector_store_id.to_string(),
            status: BatchStatus::Completed,
            file_counts: None,
        })
    }

    async fn delete_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.record("delete_vector_store_file");
        self.state
            .lock()
            .unwrap()
            .detached
            .push((vector_store_id.to_string(), file_id.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub provider: Arc<FakeProvider>,
    pub collections: Arc<InMemoryCollectionStore>,
    pub files: Arc<InMemoryFileStore>,
    pub service: ChatService,
}

pub fn harness(config: AssistantConfig) -> Harness {
    let provider = FakeProvider::new();
    let collections = Arc::new(InMemoryCollectionStore::new());
    let files = Arc::new(InMemoryFileStore::new());
    let fast = PollPolicy::new(Duration::from_millis(1)).with_timeout(Duration::from_secs(5));

    let service = ChatService::new(
        provider.clone(),
        collections.clone(),
        files.clone(),
        &config,
        "asst_1",
    )
    .with_policies(fast, fast);

    Harness {
        provider,
        collections,
        files,
        service,
    }
}
