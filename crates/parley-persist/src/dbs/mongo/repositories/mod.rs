pub mod chat;
pub mod message;
pub mod stream;

pub use chat::MongoChatRepository;
pub use message::MongoMessageRepository;
pub use stream::MongoStreamRepository;
