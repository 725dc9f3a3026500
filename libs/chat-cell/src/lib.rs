pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{ChatMessage, ChatRequest, ChatResponse, Source};
pub use router::chat_routes;
pub use services::chat::ChatService;
pub use services::llm::{select_client, GeminiClient, GroqClient, LlmClient};
