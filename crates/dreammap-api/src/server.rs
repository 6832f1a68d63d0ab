use crate::{create_router, AppState};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

pub struct Server {
    state: AppState,
    addr: SocketAddr,
}

impl Server {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { state, addr }
    }

    pub async fn run(self) -> std::io::Result<()> {
        let model = self.state.config.llm.model.clone();
        let store = self.state.store().backend_name().to_string();
        let router = create_router(self.state);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        info!(%model, %store, "Starting DreamMap API server on {}", self.addr);
        info!("Server listening on http://{}", self.addr);
        info!("API endpoints:");
        info!("  POST /api/analyzeDream - Analyze a dream");
        info!("  GET /api/models - Installed inference models");
        info!("  GET /api/dreams - Saved dreams, newest first");
        info!("  GET|DELETE /api/dreams/{{id}} - Fetch or delete a saved dream");
        info!("  GET /health - Health check");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
