use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Analysis
        .route("/api/analyzeDream", post(handlers::analyze_dream))
        .route("/api/models", get(handlers::list_models))
        // Saved dreams
        .route("/api/dreams", get(handlers::list_dreams))
        .route(
            "/api/dreams/{id}",
            get(handlers::get_dream).delete(handlers::delete_dream),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}
