pub mod config;
pub mod conversation;
pub mod error;
pub mod ingest;
pub mod openai;
pub mod polling;
pub mod render;
pub mod traits;
pub mod vector_store;

pub use config::AssistantConfig;
pub use conversation::{AssistantReply, ConversationOrchestrator};
pub use error::{AssistantError, Result};
pub use ingest::FileIngestor;
pub use openai::{OpenAIAssistantsClient, OpenAIAssistantsClientBuilder};
pub use polling::PollPolicy;
pub use traits::AssistantsApi;
pub use vector_store::{RepairRequest, VectorStoreKeeper};

pub use tokio_util::sync::CancellationToken;
