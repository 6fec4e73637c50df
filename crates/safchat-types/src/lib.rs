pub mod chat;
pub mod collection;
pub mod file;

pub use chat::{ChatMessage, ChatRole, ChatTurn};
pub use collection::Collection;
pub use file::FileRecord;
