use crate::handlers::DreamResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dreammap_core::{DreamError, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Dream(#[from] DreamError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Dream(err) => match err {
                DreamError::Validation(_) => StatusCode::BAD_REQUEST,
                DreamError::SubmissionInProgress => StatusCode::CONFLICT,
                DreamError::InferenceUnavailable(_)
                | DreamError::MalformedInferenceOutput { .. }
                | DreamError::MoonPhaseUnavailable(_)
                | DreamError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether the client may resubmit the same request.
    pub fn retryable(&self) -> bool {
        match self {
            ApiError::Dream(err) => err.is_retryable(),
            ApiError::ServiceUnavailable(_) => true,
            _ => false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let retryable = self.retryable();

        // The analysis finished even though it was not stored; hand it back.
        if let ApiError::Dream(DreamError::Persistence { record, .. }) = self {
            let body = Json(json!({
                "error": message,
                "status": status.as_u16(),
                "retryable": retryable,
                "stored": false,
                "analysis": DreamResponse::from(*record),
            }));
            return (status, body).into_response();
        }

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
            "retryable": retryable
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
