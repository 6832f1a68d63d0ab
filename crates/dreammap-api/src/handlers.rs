use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use dreammap_core::{AnalysisRequest, CompletedDreamRecord, ValidatedAnalysis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Header carrying the client's session id for duplicate-submit protection.
pub const SESSION_HEADER: &str = "x-dream-session";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
    pub model: String,
    pub store: String,
    #[serde(rename = "moonConfigured")]
    pub moon_configured: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeDreamBody {
    pub title: Option<String>,
    pub text: Option<String>,
    pub date: Option<String>,
    pub place_id: Option<String>,
}

/// Wire shape of a stored dream.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamResponse {
    pub id: Uuid,
    pub title: String,
    #[serde(flatten)]
    pub analysis: ValidatedAnalysis,
    pub moon_phase: String,
    pub moon_glyph: String,
    pub created_at: DateTime<Utc>,
}

impl From<CompletedDreamRecord> for DreamResponse {
    fn from(record: CompletedDreamRecord) -> Self {
        let moon_glyph = record.moon_glyph().to_string();
        Self {
            id: record.id,
            title: record.title,
            analysis: record.analysis,
            moon_phase: record.moon_phase,
            moon_glyph,
            created_at: record.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub configured: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.orchestrator.inference().provider_name().to_string(),
        model: state.orchestrator.inference().model_name().to_string(),
        store: state.store().backend_name().to_string(),
        moon_configured: state.config.moon.has_credentials(),
    })
}

/// Accepts a bare date (`2025-12-04`) or an RFC 3339 timestamp.
fn parse_dream_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn required_field(value: Option<String>, name: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::Validation(format!("missing {}", name))),
    }
}

impl TryFrom<AnalyzeDreamBody> for AnalysisRequest {
    type Error = ApiError;

    fn try_from(body: AnalyzeDreamBody) -> ApiResult<Self> {
        let title = required_field(body.title, "title")?;
        let text = required_field(body.text, "text")?;

        let mut request = AnalysisRequest::new(title, text);
        if let Some(raw) = body.date.filter(|d| !d.trim().is_empty()) {
            match parse_dream_date(&raw) {
                Some(date) => request = request.with_date(date),
                None => warn!(date = %raw, "Unparseable dream date, using today"),
            }
        }
        if let Some(place) = body.place_id.filter(|p| !p.trim().is_empty()) {
            request = request.with_location(place);
        }
        Ok(request)
    }
}

pub async fn analyze_dream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AnalyzeDreamBody>,
) -> ApiResult<Json<DreamResponse>> {
    let request = AnalysisRequest::try_from(body)?;

    let session = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let record = match session {
        Some(session_id) => {
            debug!(session_id, "Guarded dream submission");
            let guard = state.sessions.guard_for(session_id);
            let result = state.orchestrator.submit_in_session(&guard, request).await;
            drop(guard);
            state.sessions.release(session_id);
            result?
        }
        None => state.orchestrator.submit(request).await?,
    };

    Ok(Json(DreamResponse::from(record)))
}

pub async fn list_models(State(state): State<AppState>) -> ApiResult<Json<ModelsResponse>> {
    let models = state
        .orchestrator
        .list_models()
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

    Ok(Json(ModelsResponse {
        models,
        configured: state.config.llm.model.clone(),
    }))
}

pub async fn list_dreams(State(state): State<AppState>) -> ApiResult<Json<Vec<DreamResponse>>> {
    let records = state.store().list_recent().await?;
    Ok(Json(records.into_iter().map(DreamResponse::from).collect()))
}

pub async fn get_dream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DreamResponse>> {
    state
        .store()
        .get(id)
        .await?
        .map(|record| Json(DreamResponse::from(record)))
        .ok_or_else(|| ApiError::NotFound(format!("dream {}", id)))
}

pub async fn delete_dream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.store().delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("dream {}", id)))
    }
}
