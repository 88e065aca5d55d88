mod chat;
mod message;
mod stream;

// Export database-agnostic models
pub use chat::{title_from_text, Chat, Visibility, DEFAULT_CHAT_TITLE, MAX_TITLE_CHARS};
pub use message::{Message, MessagePart, MessageRole};
pub use stream::StreamRecord;
