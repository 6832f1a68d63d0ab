use crate::session::SubmissionGuard;
use dreammap_ai::{BuiltPrompt, InferenceService, PromptBuilder, ResponseValidator};
use dreammap_core::{
    AnalysisRequest, CompletedDreamRecord, DreamError, MoonPhaseReading, PersistenceGateway,
    Result, ValidatedAnalysis,
};
use dreammap_moon::MoonPhaseSource;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Result of one pipeline run before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub analysis: ValidatedAnalysis,
    pub moon: MoonPhaseReading,
}

/// Runs a dream through inference and the moon lookup and stores the result.
///
/// The inference branch is required: its failure fails the submission. The
/// moon branch is best-effort and degrades to "Unknown Phase". Both branches
/// run concurrently and are joined before the record is built.
pub struct AnalysisOrchestrator {
    inference: Arc<dyn InferenceService>,
    moon: Arc<dyn MoonPhaseSource>,
    store: Arc<dyn PersistenceGateway>,
}

impl AnalysisOrchestrator {
    pub fn new(
        inference: Arc<dyn InferenceService>,
        moon: Arc<dyn MoonPhaseSource>,
        store: Arc<dyn PersistenceGateway>,
    ) -> Self {
        Self {
            inference,
            moon,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn PersistenceGateway> {
        &self.store
    }

    pub fn inference(&self) -> &Arc<dyn InferenceService> {
        &self.inference
    }

    /// Run both branches without storing anything.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<Analysis> {
        let start = Instant::now();
        let prompt = PromptBuilder::build(&request.title, &request.text)?;

        let (analysis, moon) = tokio::join!(
            self.interpret(&prompt),
            self.moon.fetch(request.date, request.location_id.as_deref())
        );

        let analysis = analysis.inspect_err(|e| {
            warn!(
                error = %e,
                model = %self.inference.model_name(),
                "Dream analysis failed"
            )
        })?;

        if moon.is_unknown() {
            info!("Moon phase unavailable, continuing with sentinel");
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            motifs = analysis.motifs.len(),
            sentiment = analysis.sentiment.as_ref().map(|s| s.as_str()).unwrap_or(""),
            moon_phase = %moon.canonical_label,
            "Dream analyzed"
        );

        Ok(Analysis { analysis, moon })
    }

    async fn interpret(&self, prompt: &BuiltPrompt) -> Result<ValidatedAnalysis> {
        let raw = self.inference.complete(prompt).await?;
        ResponseValidator::validate(&raw).inspect_err(|e| {
            if let DreamError::MalformedInferenceOutput { reason, raw } = e {
                debug!(%reason, raw = %raw, "Rejected model output");
            }
        })
    }

    /// Analyze and hand the record to the store.
    ///
    /// A storage failure is reported as `DreamError::Persistence`, which
    /// carries the finished record.
    pub async fn submit(&self, request: AnalysisRequest) -> Result<CompletedDreamRecord> {
        let Analysis { analysis, moon } = self.analyze(&request).await?;
        let record =
            CompletedDreamRecord::new(&request.title, &request.text, analysis, moon.canonical_label);

        if let Err(source) = self.store.save(&record).await {
            error!(
                error = %source,
                backend = self.store.backend_name(),
                dream_id = %record.id,
                "Dream analyzed but could not be stored"
            );
            return Err(DreamError::Persistence {
                source,
                record: Box::new(record),
            });
        }

        info!(dream_id = %record.id, backend = self.store.backend_name(), "Dream stored");
        Ok(record)
    }

    /// [`submit`](Self::submit) under a session guard. Rejected with
    /// `SubmissionInProgress` while another submission for the same
    /// session is running.
    pub async fn submit_in_session(
        &self,
        guard: &SubmissionGuard,
        request: AnalysisRequest,
    ) -> Result<CompletedDreamRecord> {
        let ticket = guard.begin()?;
        let result = self.submit(request).await;
        match result {
            Ok(_) => ticket.complete(),
            Err(_) => ticket.fail(),
        }
        result
    }

    /// Connectivity check against the inference backend.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        self.inference.list_models().await
    }
}
