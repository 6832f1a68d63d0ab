use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::NaiveDate;
use dreammap_ai::{BuiltPrompt, InferenceService};
use dreammap_api::{create_router, AppState};
use dreammap_core::{
    CompletedDreamRecord, DreamError, DreamMapConfig, PersistenceGateway, Result, StoreError,
};
use dreammap_moon::MoonPhaseSource;
use dreammap_pipeline::InMemoryDreamStore;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

const ANALYSIS: &str = r#"{
    "summary": "A long tunnel ending in light",
    "motifs": [{"symbol": "tunnel", "meaning": "transition"}],
    "personalInterpretation": "A chapter is closing",
    "whatToDoNext": ["Journal about the light"],
    "sentiment": "hopeful",
    "confidence": 0.9
}"#;

struct FakeInference {
    output: std::result::Result<&'static str, &'static str>,
    calls: AtomicUsize,
}

impl FakeInference {
    fn ok(output: &'static str) -> Arc<Self> {
        Arc::new(Self {
            output: Ok(output),
            calls: AtomicUsize::new(0),
        })
    }

    fn down() -> Arc<Self> {
        Arc::new(Self {
            output: Err("connection refused"),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl InferenceService for FakeInference {
    async fn complete(&self, _prompt: &BuiltPrompt) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.output
            .map(str::to_string)
            .map_err(|e| DreamError::InferenceUnavailable(e.to_string()))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        match self.output {
            Ok(_) => Ok(vec!["gpt-oss:20b".to_string()]),
            Err(e) => Err(DreamError::InferenceUnavailable(e.to_string())),
        }
    }

    fn provider_name(&self) -> &str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "gpt-oss:20b"
    }
}

struct FixedMoon(&'static str);

#[async_trait]
impl MoonPhaseSource for FixedMoon {
    async fn fetch_raw_phase(
        &self,
        _date: Option<NaiveDate>,
        _location_id: Option<&str>,
    ) -> Result<String> {
        Ok(self.0.to_string())
    }
}

struct ReadOnlyStore;

#[async_trait]
impl PersistenceGateway for ReadOnlyStore {
    async fn save(&self, _record: &CompletedDreamRecord) -> std::result::Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only file system".into()))
    }

    async fn list_recent(&self) -> std::result::Result<Vec<CompletedDreamRecord>, StoreError> {
        Ok(Vec::new())
    }

    async fn get(&self, _id: Uuid) -> std::result::Result<Option<CompletedDreamRecord>, StoreError> {
        Ok(None)
    }

    async fn delete(&self, _id: Uuid) -> std::result::Result<bool, StoreError> {
        Ok(false)
    }

    fn backend_name(&self) -> &str {
        "read-only"
    }
}

fn state_with(
    inference: Arc<dyn InferenceService>,
    store: Arc<dyn PersistenceGateway>,
) -> AppState {
    AppState::with_services(
        DreamMapConfig::default(),
        inference,
        Arc::new(FixedMoon("fullmoon")),
        store,
    )
}

fn tunnel() -> Value {
    json!({
        "title": "The Tunnel",
        "text": "I walked through a long tunnel toward a warm light",
        "date": "2025-12-04",
        "placeId": "norway/oslo"
    })
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let state = state_with(FakeInference::ok(ANALYSIS), Arc::new(InMemoryDreamStore::new()));
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.get("/health").await;
    assert_eq!(resp.status_code(), 200);
    let body: Value = resp.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["provider"], "fake");
    assert_eq!(body["model"], "gpt-oss:20b");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn analyze_returns_combined_result() {
    let state = state_with(FakeInference::ok(ANALYSIS), Arc::new(InMemoryDreamStore::new()));
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.post("/api/analyzeDream").json(&tunnel()).await;
    assert_eq!(resp.status_code(), 200);

    let body: Value = resp.json();
    assert_eq!(body["summary"], "A long tunnel ending in light");
    assert_eq!(body["motifs"][0]["symbol"], "tunnel");
    assert_eq!(body["personalInterpretation"], "A chapter is closing");
    assert_eq!(body["whatToDoNext"][0], "Journal about the light");
    assert_eq!(body["sentiment"], "hopeful");
    assert_eq!(body["moonPhase"], "Full Moon");
    assert_eq!(body["moonGlyph"], "🌕");
    assert!(body["id"].is_string());
    assert!(body["createdAt"].is_string());
    assert!(body.get("confidence").is_none());
}

#[tokio::test]
async fn saved_dreams_can_be_listed_fetched_and_deleted() {
    let state = state_with(FakeInference::ok(ANALYSIS), Arc::new(InMemoryDreamStore::new()));
    let server = TestServer::new(create_router(state)).unwrap();

    let created: Value = server.post("/api/analyzeDream").json(&tunnel()).await.json();
    let id = created["id"].as_str().unwrap().to_string();

    let list = server.get("/api/dreams").await;
    assert_eq!(list.status_code(), 200);
    let dreams: Vec<Value> = list.json();
    assert_eq!(dreams.len(), 1);
    assert_eq!(dreams[0]["id"], created["id"]);

    let one = server.get(&format!("/api/dreams/{}", id)).await;
    assert_eq!(one.status_code(), 200);
    assert_eq!(one.json::<Value>()["title"], "The Tunnel");

    let deleted = server.delete(&format!("/api/dreams/{}", id)).await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let gone = server.get(&format!("/api/dreams/{}", id)).await;
    assert_eq!(gone.status_code(), 404);
    let again = server.delete(&format!("/api/dreams/{}", id)).await;
    assert_eq!(again.status_code(), 404);
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let inference = FakeInference::ok(ANALYSIS);
    let state = state_with(inference.clone(), Arc::new(InMemoryDreamStore::new()));
    let server = TestServer::new(create_router(state)).unwrap();

    for body in [
        json!({"text": "I walked through a long tunnel"}),
        json!({"title": "", "text": "I walked through a long tunnel"}),
        json!({"title": "The Tunnel"}),
        json!({"title": "The Tunnel", "text": "short"}),
    ] {
        let resp = server.post("/api/analyzeDream").json(&body).await;
        assert_eq!(resp.status_code(), 400, "body: {}", body);
    }
    assert_eq!(inference.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn inference_failures_are_server_errors() {
    let state = state_with(FakeInference::down(), Arc::new(InMemoryDreamStore::new()));
    let server = TestServer::new(create_router(state)).unwrap();
    let resp = server.post("/api/analyzeDream").json(&tunnel()).await;
    assert_eq!(resp.status_code(), 500);

    let store = Arc::new(InMemoryDreamStore::new());
    let state = state_with(
        FakeInference::ok("I would rather not answer in JSON."),
        store.clone(),
    );
    let server = TestServer::new(create_router(state)).unwrap();
    let resp = server.post("/api/analyzeDream").json(&tunnel()).await;
    assert_eq!(resp.status_code(), 500);
    assert!(!resp.text().contains("rather not answer"));
    assert_eq!(resp.json::<Value>()["retryable"], true);
    assert!(store.is_empty());
}

#[tokio::test]
async fn storage_failure_still_returns_analysis() {
    let state = state_with(FakeInference::ok(ANALYSIS), Arc::new(ReadOnlyStore));
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.post("/api/analyzeDream").json(&tunnel()).await;
    assert_eq!(resp.status_code(), 500);
    let body: Value = resp.json();
    assert_eq!(body["stored"], false);
    assert_eq!(body["analysis"]["summary"], "A long tunnel ending in light");
    assert_eq!(body["analysis"]["moonPhase"], "Full Moon");
}

#[tokio::test]
async fn session_in_flight_is_conflict() {
    let state = state_with(FakeInference::ok(ANALYSIS), Arc::new(InMemoryDreamStore::new()));
    let guard = state.sessions.guard_for("phone-1");
    let server = TestServer::new(create_router(state)).unwrap();

    let ticket = guard.begin().unwrap();
    let resp = server
        .post("/api/analyzeDream")
        .add_header("x-dream-session", "phone-1")
        .json(&tunnel())
        .await;
    assert_eq!(resp.status_code(), 409);

    let other = server
        .post("/api/analyzeDream")
        .add_header("x-dream-session", "phone-2")
        .json(&tunnel())
        .await;
    assert_eq!(other.status_code(), 200);

    ticket.complete();
    let retry = server
        .post("/api/analyzeDream")
        .add_header("x-dream-session", "phone-1")
        .json(&tunnel())
        .await;
    assert_eq!(retry.status_code(), 200);
}

#[tokio::test]
async fn finished_sessions_are_forgotten() {
    let state = state_with(FakeInference::ok(ANALYSIS), Arc::new(InMemoryDreamStore::new()));
    let sessions = state.sessions.clone();
    let server = TestServer::new(create_router(state)).unwrap();

    for i in 0..50 {
        let resp = server
            .post("/api/analyzeDream")
            .add_header("x-dream-session", format!("phone-{}", i))
            .json(&tunnel())
            .await;
        assert_eq!(resp.status_code(), 200);
    }
    assert!(sessions.is_empty());

    let state = state_with(FakeInference::down(), Arc::new(InMemoryDreamStore::new()));
    let sessions = state.sessions.clone();
    let server = TestServer::new(create_router(state)).unwrap();
    let resp = server
        .post("/api/analyzeDream")
        .add_header("x-dream-session", "phone-down")
        .json(&tunnel())
        .await;
    assert_eq!(resp.status_code(), 500);
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn models_endpoint_reports_backend_state() {
    let state = state_with(FakeInference::ok(ANALYSIS), Arc::new(InMemoryDreamStore::new()));
    let server = TestServer::new(create_router(state)).unwrap();
    let resp = server.get("/api/models").await;
    assert_eq!(resp.status_code(), 200);
    assert_eq!(resp.json::<Value>()["models"][0], "gpt-oss:20b");

    let state = state_with(FakeInference::down(), Arc::new(InMemoryDreamStore::new()));
    let server = TestServer::new(create_router(state)).unwrap();
    let resp = server.get("/api/models").await;
    assert_eq!(resp.status_code(), 503);
}

#[tokio::test]
async fn unknown_dream_id_is_not_found() {
    let state = state_with(FakeInference::ok(ANALYSIS), Arc::new(InMemoryDreamStore::new()));
    let server = TestServer::new(create_router(state)).unwrap();

    let resp = server.get(&format!("/api/dreams/{}", Uuid::new_v4())).await;
    assert_eq!(resp.status_code(), 404);
}
