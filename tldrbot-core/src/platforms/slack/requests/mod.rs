pub mod chat;
pub mod history;
