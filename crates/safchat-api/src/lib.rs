pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use error::{ApiError, ApiResult};
pub use service::{ChatAnswer, ChatService, ChatView};
pub use state::AppState;
