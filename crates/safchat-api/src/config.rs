use config::{Config as ConfigLoader, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use safchat_assistant::AssistantConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    pub log: LoggingConfig,

    // Secret-adjacent (from ENV only)
    #[serde(default)]
    pub assistant_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for one HTTP request, polling included
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_max_upload_bytes() -> usize {
    32 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

const ASSISTANT_PREFIX: &str = "ASSISTANT_";

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (SERVER_, LOG_ and ASSISTANT_ prefixes)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("SERVER")
                    .keep_prefix(true)
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::with_prefix("LOG")
                    .keep_prefix(true)
                    .separator("_")
                    .try_parsing(true),
            );
        let builder = assistant_overrides(builder, std::env::vars())?;

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets from ENV (never in TOML)
        cfg.assistant.api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;
        cfg.assistant.organization = non_empty_env("OPENAI_ORGANIZATION");
        cfg.assistant.project = non_empty_env("OPENAI_PROJECT");
        cfg.assistant_id = std::env::var("ASSISTANT_ID").map_err(|_| {
            ConfigError::Message("ASSISTANT_ID environment variable is required".to_string())
        })?;

        cfg.assistant
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }
}

/// `ASSISTANT_POLL_INTERVAL_MS=500` becomes `assistant.poll_interval_ms`.
///
/// Field names contain underscores, so the generic separator-based mapping
/// cannot be used here. `ASSISTANT_ID` is a secret and handled separately.
fn assistant_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (key, value) in vars {
        let Some(field) = key.strip_prefix(ASSISTANT_PREFIX) else {
            continue;
        };
        if field == "ID" || field.is_empty() {
            continue;
        }
        builder = builder.set_override(format!("assistant.{}", field.to_ascii_lowercase()), value)?;
    }
    Ok(builder)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
