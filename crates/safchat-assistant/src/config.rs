// Settings for the hosted assistant client and its polling loops

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AssistantError, Result};
use crate::polling::PollPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_BETA_HEADER: &str = "assistants=v2";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value of the `OpenAI-Beta` header sent on thread/run/vector-store routes
    #[serde(default = "default_beta_header")]
    pub beta_header: String,
    /// Batch indexing poll interval
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_run_poll_interval_ms")]
    pub run_poll_interval_ms: u64,
    #[serde(default = "default_indexing_timeout_secs")]
    pub indexing_timeout_secs: u64,
    #[serde(default = "default_max_files_allowed")]
    pub max_files_allowed: usize,
    /// Messages kept when rebuilding chat history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_store_expiry_days: Option<u32>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_beta_header() -> String {
    DEFAULT_BETA_HEADER.to_string()
}

fn default_poll_interval_ms() -> u64 {
    750
}

fn default_run_poll_interval_ms() -> u64 {
    500
}

fn default_indexing_timeout_secs() -> u64 {
    90
}

fn default_max_files_allowed() -> usize {
    20
}

fn default_history_limit() -> usize {
    200
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            organization: None,
            project: None,
            base_url: default_base_url(),
            beta_header: default_beta_header(),
            poll_interval_ms: default_poll_interval_ms(),
            run_poll_interval_ms: default_run_poll_interval_ms(),
            indexing_timeout_secs: default_indexing_timeout_secs(),
            max_files_allowed: default_max_files_allowed(),
            history_limit: default_history_limit(),
            vector_store_expiry_days: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AssistantConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_run_poll_interval(mut self, interval: Duration) -> Self {
        self.run_poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_indexing_timeout(mut self, timeout: Duration) -> Self {
        self.indexing_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_max_files_allowed(mut self, max: usize) -> Self {
        self.max_files_allowed = max;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Policy for attachment batch polling
    pub fn indexing_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_millis(self.poll_interval_ms))
            .with_timeout(Duration::from_secs(self.indexing_timeout_secs))
    }

    /// Policy for run polling; bounded only by cancellation
    pub fn run_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_millis(self.run_poll_interval_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Blank values that must be set before a client is built
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(AssistantError::Config("API key is required".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(AssistantError::Config("Base URL is required".to_string()));
        }
        if self.poll_interval_ms == 0 || self.run_poll_interval_ms == 0 {
            return Err(AssistantError::Config(
                "Poll intervals must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
