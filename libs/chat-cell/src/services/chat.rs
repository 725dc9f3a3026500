use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use knowledge_cell::{render_context, KnowledgeBase, ScoredDocument};
use shared_database::Database;
use shared_models::error::AppError;

use crate::models::{ChatRequest, ChatResponse, HistoryEntry, HistoryPair, HistoryRole, Source};
use crate::services::history::{pair_history, recent_messages, save_message, RECENT_HISTORY_LIMIT};
use crate::services::llm::LlmClient;
use crate::services::prompt::SYSTEM_INSTRUCTION;

pub const CONTEXT_DOCUMENTS: usize = 3;
const SNIPPET_CHARS: usize = 150;

pub struct ChatService {
    db: Database,
    knowledge: Arc<KnowledgeBase>,
    llm: Option<Arc<dyn LlmClient>>,
}

impl ChatService {
    pub fn new(db: Database, knowledge: Arc<KnowledgeBase>, llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self { db, knowledge, llm }
    }

    pub fn provider(&self) -> Option<&str> {
        self.llm.as_deref().map(|client| client.provider())
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id()))]
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let llm = self.llm.as_ref().ok_or_else(|| {
            AppError::Internal("No AI API configured. Set GROQ_API_KEY or GEMINI_API_KEY.".to_string())
        })?;

        let user_id = request.user_id();
        info!("Chat request from user: {}", user_id);

        self.record(user_id, HistoryRole::User, &request.message).await;

        let hits = self.knowledge.query(&request.message, CONTEXT_DOCUMENTS).await;
        let context = render_context(&hits);

        let text = llm
            .complete(SYSTEM_INSTRUCTION, request.history(), &request.message, &context)
            .await
            .map_err(|e| {
                error!("AI API Error: {:#}", e);
                AppError::Internal(format!("AI processing error: {}", e))
            })?;

        self.record(user_id, HistoryRole::Assistant, &text).await;

        let sources: Vec<Source> = hits.iter().map(to_source).collect();
        for source in &sources {
            info!("Source: {} - Relevance: {}%", source.source, source.relevance);
        }
        info!("Successfully generated response for user: {}", user_id);

        Ok(ChatResponse {
            text,
            sources,
            function_calls: None,
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    pub async fn recent_history(&self, user_id: &str) -> Result<(Vec<HistoryEntry>, Vec<HistoryPair>), AppError> {
        let messages = recent_messages(&self.db, user_id, RECENT_HISTORY_LIMIT).await?;
        let pairs = pair_history(&messages);
        Ok((messages, pairs))
    }

    async fn record(&self, user_id: &str, role: HistoryRole, message: &str) {
        if let Err(e) = save_message(&self.db, user_id, role, message).await {
            warn!("Error saving {} message to history: {}", role.as_str(), e);
        }
    }
}

pub fn to_source(hit: &ScoredDocument) -> Source {
    let relevance = ((1.0 - hit.distance) * 1000.0).round() / 10.0;

    let snippet = if hit.content.chars().count() > SNIPPET_CHARS {
        format!("{}...", hit.content.chars().take(SNIPPET_CHARS).collect::<String>())
    } else {
        hit.content.clone()
    };

    let source = if hit.metadata.source.is_empty() {
        if hit.metadata.category == "diseases" {
            "Disease Symptoms Database".to_string()
        } else {
            "Healthcare Knowledge Base".to_string()
        }
    } else {
        hit.metadata.source.clone()
    };

    Source {
        category: hit.metadata.category.clone(),
        url: hit.metadata.url.clone(),
        source,
        relevance,
        snippet,
    }
}
