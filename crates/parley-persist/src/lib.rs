pub mod models;
pub mod error;
pub mod trait_client;
pub mod memory;
pub mod reconcile;
pub mod dbs;

pub use models::{
    title_from_text, Chat, Message, MessagePart, MessageRole, StreamRecord, Visibility,
    DEFAULT_CHAT_TITLE, MAX_TITLE_CHARS,
};
pub use error::{PersistError, Result};
pub use trait_client::PersistenceClient;
pub use memory::InMemoryPersistence;
pub use reconcile::{reconcile_reply, save_assistant_reply, ReplyAction};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
