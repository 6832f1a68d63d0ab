use crate::prompt::BuiltPrompt;
use async_trait::async_trait;
use dreammap_core::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A text-generation backend that can be asked for a dream analysis.
///
/// Implementations return the model's text verbatim; nothing about its
/// shape is trusted until it has gone through
/// [`ResponseValidator`](crate::ResponseValidator).
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Issue one generation request. No retries.
    async fn complete(&self, prompt: &BuiltPrompt) -> Result<String>;

    /// Names of the models the backend has installed.
    async fn list_models(&self) -> Result<Vec<String>>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}
