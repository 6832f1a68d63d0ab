use dreammap_ai::{InferenceService, OllamaClient, OllamaConfig};
use dreammap_core::{DreamMapConfig, PersistenceGateway, StoreError};
use dreammap_moon::{MoonClientConfig, MoonPhaseClient, MoonPhaseSource};
use dreammap_pipeline::{
    AnalysisOrchestrator, InMemoryDreamStore, JsonFileDreamStore, SessionRegistry,
};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Arc<DreamMapConfig>,
}

impl AppState {
    /// Wire the Ollama client, the moon client and the configured store.
    pub async fn new(config: DreamMapConfig) -> Result<Self, StoreError> {
        let inference: Arc<dyn InferenceService> =
            Arc::new(OllamaClient::new(OllamaConfig::from(&config.llm)));
        let moon: Arc<dyn MoonPhaseSource> =
            Arc::new(MoonPhaseClient::new(MoonClientConfig::from(&config.moon)));
        let store = open_store(&config).await?;

        Ok(Self::with_services(config, inference, moon, store))
    }

    pub fn with_services(
        config: DreamMapConfig,
        inference: Arc<dyn InferenceService>,
        moon: Arc<dyn MoonPhaseSource>,
        store: Arc<dyn PersistenceGateway>,
    ) -> Self {
        Self {
            orchestrator: Arc::new(AnalysisOrchestrator::new(inference, moon, store)),
            sessions: Arc::new(SessionRegistry::new()),
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &Arc<dyn PersistenceGateway> {
        self.orchestrator.store()
    }
}

pub async fn open_store(config: &DreamMapConfig) -> Result<Arc<dyn PersistenceGateway>, StoreError> {
    match &config.storage.path {
        Some(path) => Ok(Arc::new(JsonFileDreamStore::open(path).await?)),
        None => {
            info!("No store path configured, dreams are kept in memory only");
            Ok(Arc::new(InMemoryDreamStore::new()))
        }
    }
}
