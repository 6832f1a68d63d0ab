use crate::llm_provider::*;
use crate::prompt::BuiltPrompt;
use async_trait::async_trait;
use dreammap_core::{DreamError, LlmConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Ollama chat client for dream analysis
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub model_name: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for OllamaConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model_name: config.model.clone(),
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    format: &'static str,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    eval_count: Option<usize>,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn chat_request<'a>(&'a self, prompt: &BuiltPrompt) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model_name,
            messages: prompt.messages(),
            stream: false,
            format: "json",
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        }
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> Result<ChatResponse> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.config.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| DreamError::InferenceUnavailable(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Ollama returned an error status");
            return Err(DreamError::InferenceUnavailable(format!(
                "Ollama API error: HTTP {} - {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            DreamError::InferenceUnavailable(format!("Invalid Ollama response envelope: {}", e))
        })
    }

    async fn tags(&self) -> Result<TagsResponse> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.config.base_url))
            .send()
            .await
            .map_err(|e| DreamError::InferenceUnavailable(format!("Ollama unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(DreamError::InferenceUnavailable(format!(
                "Ollama model listing failed: HTTP {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            DreamError::InferenceUnavailable(format!("Invalid Ollama tags response: {}", e))
        })
    }
}

#[async_trait]
impl InferenceService for OllamaClient {
    async fn complete(&self, prompt: &BuiltPrompt) -> Result<String> {
        let start_time = Instant::now();
        let request = self.chat_request(prompt);

        debug!(
            model = %self.config.model_name,
            temperature = self.config.temperature,
            "Sending dream analysis request to Ollama"
        );

        let envelope = timeout(self.config.timeout, self.chat(&request))
            .await
            .map_err(|_| {
                DreamError::InferenceUnavailable(format!(
                    "Ollama request timed out after {:?}",
                    self.config.timeout
                ))
            })??;

        let content = envelope
            .message
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                DreamError::InferenceUnavailable("No message.content in Ollama response".into())
            })?;

        info!(
            model = %self.config.model_name,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            prompt_tokens = envelope.prompt_eval_count.unwrap_or(0),
            completion_tokens = envelope.eval_count.unwrap_or(0),
            "Ollama analysis completed"
        );

        Ok(content)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        debug!("Listing Ollama models at {}", self.config.base_url);

        let tags = timeout(MODEL_LIST_TIMEOUT, self.tags())
            .await
            .map_err(|_| DreamError::InferenceUnavailable("Ollama model listing timed out".into()))??;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}
