pub mod client;
pub mod types;

pub use client::{OpenAIAssistantsClient, OpenAIAssistantsClientBuilder};
pub use types::*;
