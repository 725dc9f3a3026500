pub mod chat;
pub mod history;
pub mod llm;
pub mod prompt;
