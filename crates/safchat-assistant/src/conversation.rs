//! Thread lifecycle and question/answer exchange with the hosted assistant.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use safchat_types::{ChatMessage, ChatRole, ChatTurn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::AssistantConfig;
use crate::error::{AssistantError, Result};
use crate::openai::{
    CreateMessageRequest, CreateRunRequest, CreateThreadRequest, ListMessagesQuery,
    MessageObject, RunObject, RunStatus,
};
use crate::polling::{ensure_active, pause, PollPolicy};
use crate::render::{message_html, message_plain_text};
use crate::traits::{ignore_not_found, AssistantsApi};

/// Newest messages inspected when looking for the latest answer
const LATEST_WINDOW: u32 = 10;
/// Page size for full history walks
const HISTORY_PAGE_SIZE: u32 = 100;

/// The assistant's answer as plain text and rendered HTML
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantReply {
    pub text: String,
    pub html: String,
}

impl AssistantReply {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.html.is_empty()
    }

    fn from_message(message: &MessageObject) -> Self {
        Self {
            text: message_plain_text(message),
            html: message_html(message),
        }
    }
}

pub struct ConversationOrchestrator {
    api: Arc<dyn AssistantsApi>,
    run_policy: PollPolicy,
}

impl ConversationOrchestrator {
    pub fn new(api: Arc<dyn AssistantsApi>, config: &AssistantConfig) -> Self {
        Self {
            api,
            run_policy: config.run_policy(),
        }
    }

    pub fn with_run_policy(mut self, policy: PollPolicy) -> Self {
        self.run_policy = policy;
        self
    }

    /// New thread whose file search is scoped to `vector_store_id`
    pub async fn create_thread_for_vector_store(
        &self,
        vector_store_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        require("vector store id", vector_store_id)?;

        let thread = self
            .api
            .create_thread(CreateThreadRequest::for_vector_store(vector_store_id), cancel)
            .await?;

        tracing::info!(thread_id = %thread.id, vector_store_id, "Created thread");
        Ok(thread.id)
    }

    /// Idempotent; a missing thread is not an error
    pub async fn delete_thread(&self, thread_id: &str, cancel: &CancellationToken) -> Result<()> {
        require("thread id", thread_id)?;
        ignore_not_found(
            self.api.delete_thread(thread_id, cancel).await,
            "Thread",
            thread_id,
        )
    }

    /// Post `question`, run `assistant_id` on the thread and return its answer
    pub async fn ask(
        &self,
        thread_id: &str,
        assistant_id: &str,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<AssistantReply> {
        require("thread id", thread_id)?;
        require("assistant id", assistant_id)?;
        require("question", question)?;

        self.api
            .create_message(thread_id, CreateMessageRequest::user(question), cancel)
            .await?;

        let run = self
            .api
            .create_run(thread_id, CreateRunRequest::new(assistant_id), cancel)
            .await?;
        tracing::debug!(thread_id, run_id = %run.id, "Started run");

        self.wait_for_run(thread_id, run, cancel).await?;
        self.get_latest_assistant(thread_id, cancel).await
    }

    /// Most recent assistant message, or an empty reply when there is none
    pub async fn get_latest_assistant(
        &self,
        thread_id: &str,
        cancel: &CancellationToken,
    ) -> Result<AssistantReply> {
        let page = self
            .api
            .list_messages(thread_id, ListMessagesQuery::newest(LATEST_WINDOW), cancel)
            .await?;

        Ok(page
            .data
            .iter()
            .find(|message| message.role == "assistant")
            .map(AssistantReply::from_message)
            .unwrap_or_default())
    }

    /// Last `take_last` user/assistant turns as plain text, oldest first
    pub async fn get_thread_history(
        &self,
        thread_id: &str,
        take_last: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<ChatTurn>> {
        let messages = self.fetch_conversation(thread_id, take_last, cancel).await?;

        Ok(messages
            .into_iter()
            .map(|(role, message)| ChatTurn {
                role,
                text: message_plain_text(&message),
                created_at: timestamp(message.created_at),
            })
            .collect())
    }

    /// Last `take_last` user/assistant turns with rendered HTML, oldest first
    pub async fn get_thread_history_html(
        &self,
        thread_id: &str,
        take_last: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<ChatMessage>> {
        let messages = self.fetch_conversation(thread_id, take_last, cancel).await?;

        Ok(messages
            .into_iter()
            .map(|(role, message)| {
                ChatMessage::new(role, message_plain_text(&message), message_html(&message))
                    .with_created_at(timestamp(message.created_at))
            })
            .collect())
    }

    /// Walk the whole thread forward, keep user/assistant messages, then
    /// truncate to the last `take_last`.
    async fn fetch_conversation(
        &self,
        thread_id: &str,
        take_last: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<(ChatRole, MessageObject)>> {
        require("thread id", thread_id)?;

        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            ensure_active(cancel)?;

            let mut query = ListMessagesQuery::oldest(HISTORY_PAGE_SIZE);
            if let Some(after) = &cursor {
                query = query.after(after.clone());
            }
            let page = self.api.list_messages(thread_id, query, cancel).await?;

            let next = page
                .last_id
                .clone()
                .or_else(|| page.data.last().map(|m| m.id.clone()));

            for message in page.data {
                if let Some(role @ (ChatRole::User | ChatRole::Assistant)) =
                    ChatRole::from_provider(&message.role)
                {
                    messages.push((role, message));
                }
            }

            if !page.has_more {
                break;
            }
            match next {
                // a cursor that does not move would loop forever
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }

        if messages.len() > take_last {
            messages.drain(..messages.len() - take_last);
        }
        tracing::debug!(thread_id, count = messages.len(), "Loaded thread history");
        Ok(messages)
    }

    async fn wait_for_run(
        &self,
        thread_id: &str,
        initial: RunObject,
        cancel: &CancellationToken,
    ) -> Result<RunObject> {
        let started = Instant::now();
        let mut run = initial;

        loop {
            ensure_active(cancel)?;

            if run.status == RunStatus::Completed {
                return Ok(run);
            }
            if run.status.is_terminal() {
                return Err(AssistantError::RunFailed {
                    run_id: run.id.clone(),
                    status: run.status.to_string(),
                    body: serde_json::to_string(&run).unwrap_or_default(),
                });
            }

            if let Some(budget) = self.run_policy.timeout {
                if started.elapsed() >= budget {
                    return Err(AssistantError::Timeout {
                        operation: "run completion",
                        budget,
                        last_status: run.status.to_string(),
                    });
                }
            }

            pause(self.run_policy.interval, cancel).await?;
            run = self.api.get_run(thread_id, &run.id, cancel).await?;
            tracing::debug!(thread_id, run_id = %run.id, status = %run.status, "Polled run");
        }
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(AssistantError::InvalidInput(format!("{} must not be empty", what)))
    } else {
        Ok(())
    }
}

fn timestamp(epoch_seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(epoch_seconds, 0).unwrap_or_default()
}
