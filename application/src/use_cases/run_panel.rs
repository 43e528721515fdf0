//! Panel coordinator: concurrent reader fan-out and harmonization.
//!
//! Dispatches every configured reader against the manuscript concurrently,
//! collects the structured analyses that parse, and harmonizes them into one
//! calibrated consensus report. Reader failures are analyst-local: a failed
//! or unparsable reader is excluded from the batch, and only zero successes
//! is fatal.

use crate::ports::event_relay::{EventRelay, PanelEvent};
use crate::ports::gateway::{ChatMessage, GatewayError, InferenceGateway};
use crate::ports::memory_store::MemoryStore;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::memorize::MemorizeUseCase;
use crate::use_cases::recall::RecallUseCase;
use panel_domain::{
    AnalysisResult, ConfidenceLevel, ConsensusPoint, Divergence, HarmonizedScores, Manuscript,
    MemoryEvent, MemoryKey, Phase, PromptTemplate, ReaderId, ReaderPersona, RecallOutcome,
    ScoreHistory, ScoringError, build_narrative, detect_consensus, detect_divergences, harmonize,
    parse_analysis, render_memory_context,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Errors that can occur when running a panel
#[derive(thiserror::Error, Debug)]
pub enum RunPanelError {
    #[error("No readers configured")]
    EmptyPanel,

    #[error("All {0} readers failed")]
    AllReadersFailed(usize),

    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Input for a panel run
#[derive(Debug, Clone)]
pub struct RunPanelInput {
    pub manuscript: Manuscript,
    pub project: String,
    pub draft: u32,
    /// Historical score distribution for percentile context
    pub history: Option<ScoreHistory>,
    /// Free-text calibration context injected into every reader's system
    /// instruction
    pub calibration: Option<String>,
}

/// The harmonized consensus report produced by a panel run.
#[derive(Debug, Clone, Serialize)]
pub struct PanelReport {
    /// Successful analyses, in configured panel order
    pub analyses: Vec<AnalysisResult>,
    /// Readers excluded from the batch
    pub failed: Vec<ReaderId>,
    pub harmonized: HarmonizedScores,
    pub divergences: Vec<Divergence>,
    pub consensus: Vec<ConsensusPoint>,
    pub narrative: String,
    pub confidence: ConfidenceLevel,
}

/// Use case for running the full reader panel over one manuscript draft
pub struct RunPanelUseCase<G: InferenceGateway + 'static> {
    gateway: Arc<G>,
    panel: Vec<ReaderPersona>,
    store: Option<Arc<dyn MemoryStore>>,
    memorizer: Option<Arc<MemorizeUseCase<G>>>,
}

impl<G: InferenceGateway + 'static> RunPanelUseCase<G> {
    pub fn new(gateway: Arc<G>, panel: Vec<ReaderPersona>) -> Self {
        Self {
            gateway,
            panel,
            store: None,
            memorizer: None,
        }
    }

    /// Attach cross-draft memory: recall context is injected into reader
    /// prompts and coverage events are memorized after the run.
    pub fn with_memory(
        mut self,
        store: Arc<dyn MemoryStore>,
        memorizer: Arc<MemorizeUseCase<G>>,
    ) -> Self {
        self.store = Some(store);
        self.memorizer = Some(memorizer);
        self
    }

    pub fn panel(&self) -> &[ReaderPersona] {
        &self.panel
    }

    /// Run the panel without progress reporting or an event stream.
    pub async fn execute(&self, input: RunPanelInput) -> Result<PanelReport, RunPanelError> {
        self.execute_with_progress(input, &NoProgress, &EventRelay::null())
            .await
    }

    /// Run the panel, reporting progress and emitting events as it goes.
    pub async fn execute_with_progress(
        &self,
        input: RunPanelInput,
        progress: &dyn ProgressNotifier,
        relay: &EventRelay,
    ) -> Result<PanelReport, RunPanelError> {
        if self.panel.is_empty() {
            return Err(RunPanelError::EmptyPanel);
        }

        info!(
            project = %input.project,
            draft = input.draft,
            readers = self.panel.len(),
            "Starting panel run"
        );
        relay
            .emit(PanelEvent::PhaseChange {
                phase: Phase::Analysis,
            })
            .await;
        progress.on_phase_start(&Phase::Analysis, self.panel.len());

        let recalled = self.recall_contexts(&input).await;
        let (analyses, failed) = self
            .fan_out(&input, &recalled, progress, relay)
            .await;

        progress.on_phase_complete(&Phase::Analysis);
        if analyses.is_empty() {
            let error = RunPanelError::AllReadersFailed(self.panel.len());
            relay
                .emit(PanelEvent::Error {
                    error: error.to_string(),
                })
                .await;
            return Err(error);
        }

        relay
            .emit(PanelEvent::PhaseChange {
                phase: Phase::Harmonization,
            })
            .await;
        let harmonized = harmonize(&analyses, &self.panel, input.history.as_ref())?;
        let divergences = detect_divergences(&analyses);
        let consensus = detect_consensus(&analyses);
        let narrative = build_narrative(&harmonized, &consensus, &divergences);
        let confidence = ConfidenceLevel::from_divergence_count(divergences.len());
        progress.on_phase_complete(&Phase::Harmonization);

        relay
            .emit(PanelEvent::DeliverableReady {
                kind: "coverage".to_string(),
            })
            .await;
        relay
            .emit(PanelEvent::Result {
                confidence,
                narrative: narrative.clone(),
            })
            .await;

        self.spawn_memorize(&input, &analyses, relay);

        info!(
            succeeded = analyses.len(),
            failed = failed.len(),
            divergences = divergences.len(),
            %confidence,
            "Panel run complete"
        );
        Ok(PanelReport {
            analyses,
            failed,
            harmonized,
            divergences,
            consensus,
            narrative,
            confidence,
        })
    }

    /// Recall every reader's memory, degrading to no context on store
    /// failure.
    async fn recall_contexts(&self, input: &RunPanelInput) -> HashMap<ReaderId, RecallOutcome> {
        let Some(store) = &self.store else {
            return HashMap::new();
        };
        let recall = RecallUseCase::new(store.clone());
        match recall
            .recall_all(&self.panel, &input.project, input.draft)
            .await
        {
            Ok(outcomes) => outcomes,
            Err(e) => {
                warn!("Memory recall failed; readers run without continuity context: {e}");
                HashMap::new()
            }
        }
    }

    /// Dispatch all readers concurrently and collect what parses.
    async fn fan_out(
        &self,
        input: &RunPanelInput,
        recalled: &HashMap<ReaderId, RecallOutcome>,
        progress: &dyn ProgressNotifier,
        relay: &EventRelay,
    ) -> (Vec<AnalysisResult>, Vec<ReaderId>) {
        let manuscript = Arc::new(input.manuscript.clone());
        let mut set = JoinSet::new();

        for persona in self.panel.clone() {
            let gateway = self.gateway.clone();
            let manuscript = manuscript.clone();
            let relay = relay.clone();
            let memory = recalled
                .get(&persona.id)
                .and_then(render_memory_context);
            let calibration = input.calibration.clone();

            set.spawn(async move {
                let reader = persona.id.clone();
                relay
                    .emit(PanelEvent::ReaderStart {
                        reader: reader.clone(),
                    })
                    .await;

                let system = PromptTemplate::reader_system(
                    &persona,
                    calibration.as_deref(),
                    memory.as_deref(),
                );
                let prompt = PromptTemplate::analysis_prompt(&manuscript);
                let result = match gateway.generate(&system, &[ChatMessage::user(prompt)]).await {
                    Ok(text) => {
                        relay
                            .emit(PanelEvent::ReaderProgress {
                                reader: reader.clone(),
                                note: "analysis received".to_string(),
                            })
                            .await;
                        parse_analysis(&reader, &text).map_err(|e| e.to_string())
                    }
                    Err(e) => Err(e.to_string()),
                };
                (reader, result)
            });
        }

        let mut analyses = Vec::new();
        let mut failed = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((reader, Ok(analysis))) => {
                    progress.on_task_complete(&Phase::Analysis, &reader, true);
                    relay
                        .emit(PanelEvent::ReaderComplete {
                            reader: reader.clone(),
                        })
                        .await;
                    analyses.push(analysis);
                }
                Ok((reader, Err(error))) => {
                    warn!(%reader, "Reader excluded from batch: {error}");
                    progress.on_task_complete(&Phase::Analysis, &reader, false);
                    relay
                        .emit(PanelEvent::ReaderError {
                            reader: reader.clone(),
                            error,
                        })
                        .await;
                    failed.push(reader);
                }
                Err(e) => warn!("Reader task panicked: {e}"),
            }
        }

        // Completion order is nondeterministic; restore panel order.
        let position = |id: &ReaderId| self.panel.iter().position(|p| &p.id == id);
        analyses.sort_by_key(|a| position(&a.reader));
        failed.sort_by_key(|id| position(id));
        (analyses, failed)
    }

    /// Fire-and-forget coverage memorization, one task per reader. Memory
    /// writes never gate delivery of the report.
    fn spawn_memorize(&self, input: &RunPanelInput, analyses: &[AnalysisResult], relay: &EventRelay) {
        let (Some(store), Some(memorizer)) = (&self.store, &self.memorizer) else {
            return;
        };
        for analysis in analyses {
            let store = store.clone();
            let memorizer = memorizer.clone();
            let relay = relay.clone();
            let key = MemoryKey::new(analysis.reader.clone(), &input.project, input.draft);
            let event = MemoryEvent::coverage(analysis);
            tokio::spawn(async move {
                let prior = match key.prior_draft() {
                    Some(prior_key) => store.fetch(&prior_key).await.ok().flatten(),
                    None => None,
                };
                memorizer.execute(key, event, prior, &relay).await;
            });
        }
    }
}
