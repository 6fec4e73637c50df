use std::sync::Arc;

use safchat_assistant::CancellationToken;

use crate::config::Config;
use crate::service::ChatService;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat: Arc<ChatService>,
    /// Cancelled on shutdown; every request works under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, chat: ChatService, shutdown: CancellationToken) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
            shutdown,
        }
    }

    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
