//! Outbound clients for the hosted language models.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;

use crate::models::ChatMessage;
use crate::services::prompt::{
    augment_message, flattened_prompt, openai_role, EMPTY_ANSWER_FALLBACK, PROVIDER_FAILURE_FALLBACK,
};

pub const GROQ_MAX_TOKENS: u32 = 1024;
pub const GROQ_TEMPERATURE: f32 = 0.7;
const GEMINI_API_VERSION: &str = "v1beta";

#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> &str;

    async fn complete(
        &self,
        system: &str,
        history: &[ChatMessage],
        message: &str,
        context: &str,
    ) -> Result<String>;
}

/// Groq first, then Gemini; `None` when neither key is configured.
pub fn select_client(config: &AppConfig, http: reqwest::Client) -> Option<Arc<dyn LlmClient>> {
    if config.is_groq_configured() {
        info!("Using Groq API");
        return Some(Arc::new(GroqClient::new(
            http,
            &config.groq_base_url,
            &config.groq_api_key,
            &config.groq_model,
        )));
    }

    if config.is_gemini_configured() {
        info!("Using Gemini API with model: {}", config.gemini_model);
        return Some(Arc::new(GeminiClient::new(
            http,
            &config.gemini_base_url,
            &config.gemini_api_key,
            &config.gemini_model,
        )));
    }

    warn!("No AI API configured. Set GROQ_API_KEY or GEMINI_API_KEY.");
    None
}

// ==============================================================================
// GROQ (OpenAI-compatible chat completions)
// ==============================================================================

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    fn provider(&self) -> &str {
        "groq"
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(
        &self,
        system: &str,
        history: &[ChatMessage],
        message: &str,
        context: &str,
    ) -> Result<String> {
        let mut messages = vec![WireMessage {
            role: "system",
            content: system.to_string(),
        }];
        messages.extend(history.iter().map(|turn| WireMessage {
            role: openai_role(&turn.role),
            content: turn.text.clone(),
        }));
        messages.push(WireMessage {
            role: "user",
            content: augment_message(message, context),
        });

        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: GROQ_MAX_TOKENS,
            temperature: GROQ_TEMPERATURE,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Groq request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Groq request failed with status {}: {}", status, body);
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Groq returned an unreadable response")?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| anyhow!("Groq returned no choices"))
    }
}

// ==============================================================================
// GEMINI (generateContent)
// ==============================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    fn build_url(&self) -> String {
        format!(
            "{}/{}/models/{}:generateContent?key={}",
            self.base_url, GEMINI_API_VERSION, self.model, self.api_key
        )
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(self.build_url())
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Gemini request failed with status {}: {}", status, body);
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .context("Gemini returned an unreadable response")?;

        Ok(generated.text())
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> &str {
        "gemini"
    }

    /// Never fails: provider errors become the apology text so the reply is still stored.
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(
        &self,
        system: &str,
        history: &[ChatMessage],
        message: &str,
        context: &str,
    ) -> Result<String> {
        let prompt = flattened_prompt(system, history, message, context);

        match self.generate(prompt).await {
            Ok(text) if text.trim().is_empty() => Ok(EMPTY_ANSWER_FALLBACK.to_string()),
            Ok(text) => Ok(text),
            Err(e) => {
                error!("Gemini API error: {:#}", e);
                Ok(PROVIDER_FAILURE_FALLBACK.to_string())
            }
        }
    }
}
