// Hosted assistants client (HTTP direct, no SDK)

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{AssistantConfig, DEFAULT_BASE_URL, DEFAULT_BETA_HEADER};
use crate::error::{AssistantError, Result};
use crate::openai::types::{
    CreateFileBatchRequest, CreateMessageRequest, CreateRunRequest, CreateThreadRequest,
    CreateVectorStoreRequest, FileBatchObject, FileObject, FileUpload, ListMessagesQuery,
    ListResponse, MessageObject, RunObject, ThreadObject, VectorStoreObject,
};
use crate::traits::AssistantsApi;

const ORGANIZATION_HEADER: &str = "openai-organization";
const PROJECT_HEADER: &str = "openai-project";
const BETA_HEADER: &str = "openai-beta";

/// Bearer-authenticated client for the thread, run, file and vector-store
/// endpoints.
///
/// The beta header is attached only to thread, run and vector-store routes;
/// the files endpoint does not take it.
#[derive(Debug, Clone)]
pub struct OpenAIAssistantsClient {
    http_client: reqwest::Client,
    base_url: String,
    beta_header: HeaderValue,
}

impl OpenAIAssistantsClient {
    pub fn builder() -> OpenAIAssistantsClientBuilder {
        OpenAIAssistantsClientBuilder::default()
    }

    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        let mut builder = Self::builder()
            .api_key(&config.api_key)
            .base_url(&config.base_url)
            .beta_header(&config.beta_header)
            .timeout(config.request_timeout());
        if let Some(org) = &config.organization {
            builder = builder.organization(org);
        }
        if let Some(project) = &config.project {
            builder = builder.project(project);
        }
        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn beta(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(BETA_HEADER, self.beta_header.clone())
    }

    /// Send and reject non-2xx answers with status and body
    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response> {
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(AssistantError::Cancelled),
            response = request.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(operation, %status, "Assistant API call failed");
            return Err(AssistantError::Api {
                operation,
                status,
                body,
            });
        }

        tracing::debug!(operation, %status, "Assistant API call succeeded");
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let response = self.send(operation, request, cancel).await?;
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(AssistantError::Cancelled),
            body = response.text() => body?,
        };
        serde_json::from_str(&body).map_err(|source| AssistantError::Decode { operation, source })
    }

    async fn send_delete(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.send(operation, request, cancel).await.map(|_| ())
    }
}

// ============================================================================
// TRAIT IMPLEMENTATION
// ============================================================================

#[async_trait]
impl AssistantsApi for OpenAIAssistantsClient {
    async fn create_thread(
        &self,
        request: CreateThreadRequest,
        cancel: &CancellationToken,
    ) -> Result<ThreadObject> {
        let builder = self.beta(self.http_client.post(self.url("/threads"))).json(&request);
        self.send_json("create thread", builder, cancel).await
    }

    async fn delete_thread(&self, thread_id: &str, cancel: &CancellationToken) -> Result<()> {
        let builder = self.beta(
            self.http_client
                .delete(self.url(&format!("/threads/{}", thread_id))),
        );
        self.send_delete("delete thread", builder, cancel).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: CreateMessageRequest,
        cancel: &CancellationToken,
    ) -> Result<MessageObject> {
        let builder = self
            .beta(
                self.http_client
                    .post(self.url(&format!("/threads/{}/messages", thread_id))),
            )
            .json(&request);
        self.send_json("create message", builder, cancel).await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        query: ListMessagesQuery,
        cancel: &CancellationToken,
    ) -> Result<ListResponse<MessageObject>> {
        let builder = self
            .beta(
                self.http_client
                    .get(self.url(&format!("/threads/{}/messages", thread_id))),
            )
            .query(&query.to_query());
        self.send_json("list messages", builder, cancel).await
    }

    async fn create_run(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
        cancel: &CancellationToken,
    ) -> Result<RunObject> {
        let builder = self
            .beta(
                self.http_client
                    .post(self.url(&format!("/threads/{}/runs", thread_id))),
            )
            .json(&request);
        self.send_json("create run", builder, cancel).await
    }

    async fn get_run(
        &self,
        thread_id: &str,
        run_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RunObject> {
        let builder = self.beta(
            self.http_client
                .get(self.url(&format!("/threads/{}/runs/{}", thread_id, run_id))),
        );
        self.send_json("get run", builder, cancel).await
    }

    async fn upload_file(
        &self,
        upload: FileUpload,
        cancel: &CancellationToken,
    ) -> Result<FileObject> {
        let content_type = if upload.content_type.trim().is_empty() {
            "application/octet-stream".to_string()
        } else {
            upload.content_type
        };
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&content_type)?;
        let form = Form::new().text("purpose", upload.purpose).part("file", part);

        let builder = self.http_client.post(self.url("/files")).multipart(form);
        self.send_json("upload file", builder, cancel).await
    }

    async fn delete_file(&self, file_id: &str, cancel: &CancellationToken) -> Result<()> {
        let builder = self
            .http_client
            .delete(self.url(&format!("/files/{}", file_id)));
        self.send_delete("delete file", builder, cancel).await
    }

    async fn create_vector_store(
        &self,
        request: CreateVectorStoreRequest,
        cancel: &CancellationToken,
    ) -> Result<VectorStoreObject> {
        let builder = self
            .beta(self.http_client.post(self.url("/vector_stores")))
            .json(&request);
        self.send_json("create vector store", builder, cancel).await
    }

    async fn get_vector_store(
        &self,
        vector_store_id: &str,
        cancel: &CancellationToken,
    ) -> Result<VectorStoreObject> {
        let builder = self.beta(
            self.http_client
                .get(self.url(&format!("/vector_stores/{}", vector_store_id))),
        );
        self.send_json("get vector store", builder, cancel).await
    }

    async fn delete_vector_store(
        &self,
        vector_store_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let builder = self.beta(
            self.http_client
                .delete(self.url(&format!("/vector_stores/{}", vector_store_id))),
        );
        self.send_delete("delete vector store", builder, cancel).await
    }

    async fn create_file_batch(
        &self,
        vector_store_id: &str,
        request: CreateFileBatchRequest,
        cancel: &CancellationToken,
    ) -> Result<FileBatchObject> {
        let builder = self
            .beta(
                self.http_client
                    .post(self.url(&format!("/vector_stores/{}/file_batches", vector_store_id))),
            )
            .json(&request);
        self.send_json("create file batch", builder, cancel).await
    }

    async fn get_file_batch(
        &self,
        vector_store_id: &str,
        batch_id: &str,
        cancel: &CancellationToken,
    ) -> Result<FileBatchObject> {
        let builder = self.beta(self.http_client.get(self.url(&format!(
            "/vector_stores/{}/file_batches/{}",
            vector_store_id, batch_id
        ))));
        self.send_json("get file batch", builder, cancel).await
    }

    async fn delete_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let builder = self.beta(self.http_client.delete(self.url(&format!(
            "/vector_stores/{}/files/{}",
            vector_store_id, file_id
        ))));
        self.send_delete("delete vector store file", builder, cancel).await
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builder for [`OpenAIAssistantsClient`]
#[derive(Debug, Default)]
pub struct OpenAIAssistantsClientBuilder {
    api_key: Option<String>,
    organization: Option<String>,
    project: Option<String>,
    base_url: Option<String>,
    beta_header: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAIAssistantsClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Defaults to https://api.openai.com/v1
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn beta_header(mut self, value: impl Into<String>) -> Self {
        self.beta_header = Some(value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<OpenAIAssistantsClient> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AssistantError::Config("API key is required".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", api_key), "API key")?,
        );
        if let Some(org) = self.organization.filter(|v| !v.trim().is_empty()) {
            headers.insert(
                HeaderName::from_static(ORGANIZATION_HEADER),
                header_value(&org, "organization id")?,
            );
        }
        if let Some(project) = self.project.filter(|v| !v.trim().is_empty()) {
            headers.insert(
                HeaderName::from_static(PROJECT_HEADER),
                header_value(&project, "project id")?,
            );
        }

        let beta_header = header_value(
            self.beta_header.as_deref().unwrap_or(DEFAULT_BETA_HEADER),
            "beta header",
        )?;

        let mut http = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http_client = http.build()?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(OpenAIAssistantsClient {
            http_client,
            base_url,
            beta_header,
        })
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| AssistantError::Config(format!("Invalid {} format", what)))
}
