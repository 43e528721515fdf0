//! Executive evaluation.
//!
//! A simulated industry decision-maker renders a pursue/pass verdict over
//! the finished harmonized coverage. The executive never sees manuscript
//! text or individual reader statements; its input is the consensus report
//! alone, so the verdict cites coverage lines rather than prose.

use crate::ports::event_relay::{EventRelay, PanelEvent};
use crate::ports::gateway::{ChatMessage, GatewayError, InferenceGateway};
use crate::use_cases::run_panel::PanelReport;
use panel_domain::{ExecutiveEvaluation, ParseError, Phase, PromptTemplate, parse_executive};
use std::sync::Arc;
use tracing::info;

/// Errors that can occur during executive evaluation
#[derive(thiserror::Error, Debug)]
pub enum RunExecutiveError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Unparsable verdict: {0}")]
    Parse(#[from] ParseError),
}

/// Use case for the executive verdict over a harmonized report
pub struct RunExecutiveUseCase<G: InferenceGateway + 'static> {
    gateway: Arc<G>,
}

impl<G: InferenceGateway + 'static> RunExecutiveUseCase<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn execute(
        &self,
        report: &PanelReport,
        relay: &EventRelay,
    ) -> Result<ExecutiveEvaluation, RunExecutiveError> {
        relay
            .emit(PanelEvent::PhaseChange {
                phase: Phase::Executive,
            })
            .await;
        relay.emit(PanelEvent::ExecutiveStart).await;

        let coverage = coverage_report(report);
        let reply = self
            .gateway
            .generate(
                PromptTemplate::executive_system(),
                &[ChatMessage::user(PromptTemplate::executive_prompt(&coverage))],
            )
            .await?;
        let evaluation = parse_executive(&reply)?;

        info!(
            verdict = %evaluation.verdict,
            confidence = evaluation.confidence,
            "Executive evaluation complete"
        );
        relay
            .emit(PanelEvent::ExecutiveComplete {
                evaluation: evaluation.clone(),
            })
            .await;
        Ok(evaluation)
    }
}

/// Render the harmonized report as the executive's only input. Individual
/// reader statements are deliberately absent.
fn coverage_report(report: &PanelReport) -> String {
    let mut text = String::new();

    text.push_str("Scores:\n");
    for (dimension, score) in &report.harmonized {
        text.push_str(&format!(
            "- {}: {} ({}/100, {}th percentile)\n",
            dimension.label(),
            score.rating,
            score.score,
            score.percentile
        ));
    }

    text.push_str(&format!(
        "\nConfidence: {}\n\n{}\n",
        report.confidence, report.narrative
    ));

    if !report.consensus.is_empty() {
        text.push_str("\nConsensus:\n");
        for point in &report.consensus {
            text.push_str(&format!("- {}\n", point.statement));
        }
    }
    if !report.divergences.is_empty() {
        text.push_str("\nDivergences:\n");
        for divergence in &report.divergences {
            text.push_str(&format!("- {}: {}\n", divergence.topic, divergence.synthesis));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use panel_domain::{ConfidenceLevel, Dimension, HarmonizedScore, Rating, Verdict};
    use std::collections::BTreeMap;
    use tokio::sync::Mutex;

    struct OneShotGateway {
        reply: String,
        last_prompt: Mutex<String>,
    }

    impl OneShotGateway {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                last_prompt: Mutex::new(String::new()),
            }
        }
    }

    #[async_trait]
    impl InferenceGateway for OneShotGateway {
        async fn generate(
            &self,
            _system: &str,
            messages: &[ChatMessage],
        ) -> Result<String, GatewayError> {
            *self.last_prompt.lock().await = messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(self.reply.clone())
        }
    }

    fn report() -> PanelReport {
        let mut harmonized = BTreeMap::new();
        harmonized.insert(
            Dimension::Overall,
            HarmonizedScore {
                rating: Rating::Good,
                score: 72,
                percentile: 64,
            },
        );
        PanelReport {
            analyses: Vec::new(),
            failed: Vec::new(),
            harmonized,
            divergences: Vec::new(),
            consensus: Vec::new(),
            narrative: "The panel rates this manuscript good overall.".to_string(),
            confidence: ConfidenceLevel::Medium,
        }
    }

    #[tokio::test]
    async fn verdict_parses_and_events_bracket_it() {
        let gateway = Arc::new(OneShotGateway::new(
            r#"{"verdict": "pursue", "confidence": 70, "rationale": "Consensus is solid",
               "key_factors": ["overall 72"], "concerns": [], "citations": ["Overall: good"]}"#,
        ));
        let executive = RunExecutiveUseCase::new(gateway.clone());
        let (relay, mut rx) = EventRelay::channel(8);
        let evaluation = executive.execute(&report(), &relay).await.unwrap();
        drop(relay);

        assert_eq!(evaluation.verdict, Verdict::Pursue);
        assert_eq!(evaluation.confidence, 70);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert!(events
            .iter()
            .any(|e| matches!(e, PanelEvent::ExecutiveStart)));
        assert!(matches!(
            events.last(),
            Some(PanelEvent::ExecutiveComplete { .. })
        ));

        // The executive saw the coverage, not manuscript or reader text.
        let prompt = gateway.last_prompt.lock().await.clone();
        assert!(prompt.contains("72/100"));
        assert!(prompt.contains("64th percentile"));
    }

    #[tokio::test]
    async fn unparsable_verdict_is_an_error() {
        let gateway = Arc::new(OneShotGateway::new("I would rather not decide."));
        let executive = RunExecutiveUseCase::new(gateway);
        let result = executive.execute(&report(), &EventRelay::null()).await;
        assert!(matches!(result, Err(RunExecutiveError::Parse(_))));
    }
}
