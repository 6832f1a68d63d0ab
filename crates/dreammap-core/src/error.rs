use crate::types::CompletedDreamRecord;
use thiserror::Error;

/// Failures of the durable record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum DreamError {
    /// Input rejected locally, before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Inference service unavailable: {0}")]
    InferenceUnavailable(String),

    /// The raw model output is kept for diagnostics only and is not part of
    /// the rendered message.
    #[error("Malformed inference output: {reason}")]
    MalformedInferenceOutput { reason: String, raw: String },

    #[error("Moon phase unavailable: {0}")]
    MoonPhaseUnavailable(String),

    /// The analysis completed but could not be stored. The record is handed
    /// back so callers can still show it.
    #[error("Analysis completed but was not stored: {source}")]
    Persistence {
        #[source]
        source: StoreError,
        record: Box<CompletedDreamRecord>,
    },

    #[error("A submission is already in progress for this session")]
    SubmissionInProgress,
}

impl DreamError {
    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        DreamError::MalformedInferenceOutput {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DreamError::InferenceUnavailable(_)
                | DreamError::MalformedInferenceOutput { .. }
                | DreamError::SubmissionInProgress
        )
    }
}

pub type Result<T> = std::result::Result<T, DreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display_hides_raw_output() {
        let err = DreamError::malformed("no JSON object found", "secret model rambling");
        let rendered = err.to_string();
        assert!(rendered.contains("no JSON object found"));
        assert!(!rendered.contains("secret model rambling"));
    }

    #[test]
    fn validation_is_not_retryable() {
        assert!(!DreamError::Validation("too short".into()).is_retryable());
        assert!(DreamError::InferenceUnavailable("down".into()).is_retryable());
    }
}
