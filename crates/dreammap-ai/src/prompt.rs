use crate::llm_provider::{Message, MessageRole};
use dreammap_core::{DreamError, Result, MIN_DREAM_TEXT_CHARS};

const SYSTEM_PROMPT: &str = "You analyze dreams. The user already provides a title. \
Output STRICT JSON ONLY with keys: summary, motifs[{symbol,meaning}], \
personalInterpretation, whatToDoNext[], sentiment. \
Give between 3 and 7 motifs. \
Sentiment is in {calm, stressed, mixed, sad, hopeful, confused, angry, joyful}. \
No markdown. No extra keys.";

/// System directive plus user payload for one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub system: String,
    pub user: String,
}

impl BuiltPrompt {
    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message {
                role: MessageRole::System,
                content: self.system.clone(),
            },
            Message {
                role: MessageRole::User,
                content: self.user.clone(),
            },
        ]
    }
}

pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the chat prompt for a dream.
    ///
    /// Rejects narratives shorter than [`MIN_DREAM_TEXT_CHARS`] after
    /// trimming. Pure: the same input always yields the same prompt.
    pub fn build(title: &str, text: &str) -> Result<BuiltPrompt> {
        let chars = text.trim().chars().count();
        if chars < MIN_DREAM_TEXT_CHARS {
            return Err(DreamError::Validation(format!(
                "dream text must be at least {} characters (got {})",
                MIN_DREAM_TEXT_CHARS, chars
            )));
        }

        Ok(BuiltPrompt {
            system: SYSTEM_PROMPT.to_string(),
            user: format!("Dream Title: {}\n\nDream Text:\n\"\"\"{}\"\"\"", title, text),
        })
    }

    pub fn system_prompt() -> &'static str {
        SYSTEM_PROMPT
    }
}
