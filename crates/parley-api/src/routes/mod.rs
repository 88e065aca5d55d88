pub mod chat;
pub mod health;
pub mod history;
