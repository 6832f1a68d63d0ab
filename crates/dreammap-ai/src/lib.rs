pub mod llm_provider;
pub mod ollama_client;
pub mod prompt;
pub mod validator;

pub use llm_provider::*;
pub use ollama_client::{OllamaClient, OllamaConfig};
pub use prompt::{BuiltPrompt, PromptBuilder};
pub use validator::ResponseValidator;
