#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use safchat_assistant::openai::{
    Annotation, BatchStatus, CreateFileBatchRequest, CreateMessageRequest, CreateRunRequest,
    CreateThreadRequest, CreateVectorStoreRequest, FileBatchObject, FileObject, FileReference,
    FileUpload, ListMessagesQuery, ListResponse, MessageContent, MessageObject, RunObject,
    RunStatus, SortOrder, TextContent, ThreadObject, VectorStoreObject, VectorStoreStatus,
};
use safchat_assistant::{AssistantError, AssistantsApi, CancellationToken, Result};

/// In-memory provider that replays scripted statuses and records calls
#[derive(Default)]
pub struct ScriptedApi {
    pub state: Mutex<ScriptState>,
}

#[derive(Default)]
pub struct ScriptState {
    pub calls: Vec<String>,
    /// Status of a freshly created run, then one entry per poll; the last repeats
    pub run_statuses: VecDeque<RunStatus>,
    pub batch_statuses: VecDeque<BatchStatus>,
    /// Pages served for ascending history queries, in order
    pub history_pages: VecDeque<ListResponse<MessageObject>>,
    /// Served newest-first for descending queries
    pub latest: Vec<MessageObject>,
    /// `None` makes the store fetch answer 404
    pub vector_store: Option<VectorStoreObject>,
    pub missing: HashSet<String>,
    pub fail_upload: bool,

    pub threads_created: Vec<CreateThreadRequest>,
    pub messages_posted: Vec<(String, String)>,
    pub runs_created: Vec<(String, String)>,
    pub list_queries: Vec<ListMessagesQuery>,
    pub uploads: Vec<FileUpload>,
    pub stores_created: Vec<CreateVectorStoreRequest>,
    pub batches_created: Vec<(String, Vec<String>)>,
    pub deleted: Vec<String>,
    pub store_counter: usize,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with<F: FnOnce(&mut ScriptState)>(self: &Arc<Self>, f: F) -> Arc<Self> {
        f(&mut self.state.lock().unwrap());
        self.clone()
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

fn next<T: Copy>(queue: &mut VecDeque<T>, fallback: T) -> T {
    if queue.len() > 1 {
        queue.pop_front().unwrap_or(fallback)
    } else {
        queue.front().copied().unwrap_or(fallback)
    }
}

#[async_trait]
impl AssistantsApi for ScriptedApi {
    async fn create_thread(
        &self,
        request: CreateThreadRequest,
        _cancel: &CancellationToken,
    ) -> Result<ThreadObject> {
        self.record("create_thread");
        let mut state = self.state.lock().unwrap();
        state.threads_created.push(request);
        Ok(ThreadObject {
            id: format!("thread_{}", state.threads_created.len()),
            created_at: 1_700_000_000,
        })
    }

    async fn delete_thread(&self, thread_id: &str, _cancel: &CancellationToken) -> Result<()> {
        self.record("delete_thread");
        let mut state = self.state.lock().unwrap();
        if !state.missing.insert(thread_id.to_string()) {
            return Err(not_found("delete thread"));
        }
        state.deleted.push(thread_id.to_string());
        Ok(())
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: CreateMessageRequest,
        _cancel: &CancellationToken,
    ) -> Result<MessageObject> {
        self.record("create_message");
        self.state
            .lock()
            .unwrap()
            .messages_posted
            .push((thread_id.to_string(), request.content.clone()));
        Ok(user_message("msg_user", &request.content, 0))
    }

    async fn list_messages(
        &self,
        _thread_id: &str,
        query: ListMessagesQuery,
        _cancel: &CancellationToken,
    ) -> Result<ListResponse<MessageObject>> {
        self.record("list_messages");
        let mut state = self.state.lock().unwrap();
        state.list_queries.push(query.clone());
        match query.order {
            SortOrder::Desc => Ok(page(state.latest.clone(), false)),
            SortOrder::Asc => Ok(state
                .history_pages
                .pop_front()
                .unwrap_or_else(|| page(Vec::new(), false))),
        }
    }

    async fn create_run(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
        _cancel: &CancellationToken,
    ) -> Result<RunObject> {
        self.record("create_run");
        let mut state = self.state.lock().unwrap();
        state
            .runs_created
            .push((thread_id.to_string(), request.assistant_id.clone()));
        let status = next(&mut state.run_statuses, RunStatus::Completed);
        Ok(run("run_1", thread_id, status))
    }

    async fn get_run(
        &self,
        thread_id: &str,
        run_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<RunObject> {
        self.record("get_run");
        let mut state = self.state.lock().unwrap();
        let status = next(&mut state.run_statuses, RunStatus::Completed);
        Ok(run(run_id, thread_id, status))
    }

    async fn upload_file(
        &self,
        upload: FileUpload,
        _cancel: &CancellationToken,
    ) -> Result<FileObject> {
        self.record("upload_file");
        let mut state = self.state.lock().unwrap();
        if state.fail_upload {
            return Err(AssistantError::Api {
                operation: "upload file",
                status: StatusCode::PAYLOAD_TOO_LARGE,
                body: "too large".to_string(),
            });
        }
        state.uploads.push(upload.clone());
        Ok(FileObject {
            id: format!("file-{}", state.uploads.len()),
            filename: Some(upload.file_name),
            bytes: Some(upload.bytes.len() as u64),
            purpose: Some(upload.purpose),
        })
    }

    async fn delete_file(&self, file_id: &str, _cancel: &CancellationToken) -> Result<()> {
        self.record("delete_file");
        let mut state = self.state.lock().unwrap();
        if !state.missing.insert(file_id.to_string()) {
            return Err(not_found("delete file"));
        }
        state.deleted.push(file_id.to_string());
        Ok(())
    }

    async fn create_vector_store(
        &self,
        request: CreateVectorStoreRequest,
        _cancel: &CancellationToken,
    ) -> Result<VectorStoreObject> {
        self.record("create_vector_store");
        let mut state = self.state.lock().unwrap();
        state.store_counter += 1;
        let store = VectorStoreObject {
            id: format!("vs_new_{}", state.store_counter),
            name: Some(request.name.clone()),
            status: VectorStoreStatus::Completed,
            expires_at: None,
            file_counts: None,
        };
        state.stores_created.push(request);
        Ok(store)
    }

    async fn get_vector_store(
        &self,
        vector_store_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<VectorStoreObject> {
        self.record("get_vector_store");
        let state = self.state.lock().unwrap();
        match &state.vector_store {
            Some(store) if store.id == vector_store_id => Ok(store.clone()),
            _ => Err(not_found("get vector store")),
        }
    }

    async fn delete_vector_store(
        &self,
        vector_store_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.record("delete_vector_store");
        let mut state = self.state.lock().unwrap();
        if !state.missing.insert(vector_store_id.to_string()) {
            return Err(not_found("delete vector store"));
        }
        state.deleted.push(vector_store_id.to_string());
        Ok(())
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
            .batches_created
            .push((vector_store_id.to_string(), request.file_ids));
        let status = next(&mut state.batch_statuses, BatchStatus::Completed);
        Ok(batch("vsfb_1", vector_store_id, status))
    }

    async fn get_file_batch(
        &self,
        vector_store_id: &str,
        batch_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<FileBatchObject> {
        self.record("get_file_batch");
        let mut state = self.state.lock().unwrap();
        let status = next(&mut state.batch_statuses, BatchStatus::Completed);
        Ok(batch(batch_id, vector_store_id, status))
    }

    async fn delete_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.record("delete_vector_store_file");
        let mut state = self.state.lock().unwrap();
        let key = format!("{}/{}", vector_store_id, file_id);
        if !state.missing.insert(key.clone()) {
            return Err(not_found("delete vector store file"));
        }
        state.deleted.push(key);
        Ok(())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn run(id: &str, thread_id: &str, status: RunStatus) -> RunObject {
    RunObject {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        status,
        last_error: None,
    }
}

pub fn batch(id: &str, vector_store_id: &str, status: BatchStatus) -> FileBatchObject {
    FileBatchObject {
        id: id.to_string(),
        vector_store_id: vector_store_id.to_string(),
        status,
        file_counts: None,
    }
}

pub fn page(data: Vec<MessageObject>, has_more: bool) -> ListResponse<MessageObject> {
    ListResponse {
        first_id: data.first().map(|m| m.id.clone()),
        last_id: data.last().map(|m| m.id.clone()),
        data,
        has_more,
    }
}

pub fn message(id: &str, role: &str, text: &str, annotations: Vec<Annotation>, created_at: i64) -> MessageObject {
    MessageObject {
        id: id.to_string(),
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

pub fn user_message(id: &str, text: &str, created_at: i64) -> MessageObject {
    message(id, "user", text, Vec::new(), created_at)
}

pub fn assistant_message(id: &str, text: &str, created_at: i64) -> MessageObject {
    message(id, "assistant", text, Vec::new(), created_at)
}

pub fn citation(file_id: &str, end_index: usize) -> Annotation {
    Annotation {
        kind: "file_citation".to_string(),
        text: None,
        start_index: None,
        end_index: Some(end_index),
        file_citation: Some(FileReference {
            file_id: file_id.to_string(),
        }),
        file_path: None,
    }
}

pub fn vector_store(id: &str, status: VectorStoreStatus, expires_at: Option<i64>) -> VectorStoreObject {
    VectorStoreObject {
        id: id.to_string(),
        name: Some("collection".to_string()),
        status,
        expires_at,
        file_counts: None,
    }
}
