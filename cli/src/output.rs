//! Console progress reporting and report formatting.

use panel_application::{PanelReport, ProgressNotifier};
use panel_domain::{ExecutiveEvaluation, Phase, ReaderId};
use std::io::Write;

/// Progress notifier that prints phase and streaming updates to the
/// terminal.
pub struct ConsoleProgress;

impl ConsoleProgress {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ConsoleProgress {
    fn on_phase_start(&self, phase: &Phase, total_tasks: usize) {
        println!("\n=== {} ({} tasks) ===", phase, total_tasks);
    }

    fn on_task_complete(&self, _phase: &Phase, reader: &ReaderId, success: bool) {
        if success {
            println!("  [ok]   {}", reader);
        } else {
            println!("  [fail] {} (excluded)", reader);
        }
    }

    fn on_phase_complete(&self, phase: &Phase) {
        println!("--- {} complete ---", phase);
    }

    fn on_stream_start(&self, speaker: &str) {
        print!("\n{}: ", speaker);
        let _ = std::io::stdout().flush();
    }

    fn on_stream_chunk(&self, _speaker: &str, chunk: &str) {
        print!("{}", chunk);
        let _ = std::io::stdout().flush();
    }

    fn on_stream_end(&self, _speaker: &str) {
        println!();
    }
}

/// Formats panel results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn format_report(report: &PanelReport) -> String {
        let mut out = String::new();

        out.push_str("\n==================== COVERAGE ====================\n");
        for (dimension, score) in &report.harmonized {
            out.push_str(&format!(
                "  {:<10} {:>3}/100  {:<10} p{}\n",
                dimension.label(),
                score.score,
                score.rating.to_string(),
                score.percentile
            ));
        }

        out.push_str(&format!("\nConfidence: {}\n", report.confidence));
        out.push_str(&format!("\n{}\n", report.narrative));

        if !report.consensus.is_empty() {
            out.push_str("\nConsensus:\n");
            for point in &report.consensus {
                out.push_str(&format!("  - {}\n", point.statement));
            }
        }
        if !report.divergences.is_empty() {
            out.push_str("\nDivergences:\n");
            for divergence in &report.divergences {
                out.push_str(&format!("  - {}: {}\n", divergence.topic, divergence.synthesis));
            }
        }

        out.push_str("\nReaders:\n");
        for analysis in &report.analyses {
            out.push_str(&format!("  {}\n", analysis.summary_line()));
        }
        for reader in &report.failed {
            out.push_str(&format!("  {} failed and was excluded\n", reader));
        }

        out
    }

    pub fn format_executive(evaluation: &ExecutiveEvaluation) -> String {
        let mut out = String::new();
        out.push_str("\n==================== EXECUTIVE ===================\n");
        out.push_str(&format!(
            "Verdict: {} (confidence {}/100)\n\n{}\n",
            evaluation.verdict, evaluation.confidence, evaluation.rationale
        ));
        if !evaluation.key_factors.is_empty() {
            out.push_str("\nKey factors:\n");
            for factor in &evaluation.key_factors {
                out.push_str(&format!("  - {}\n", factor));
            }
        }
        if !evaluation.concerns.is_empty() {
            out.push_str("\nConcerns:\n");
            for concern in &evaluation.concerns {
                out.push_str(&format!("  - {}\n", concern));
            }
        }
        if !evaluation.citations.is_empty() {
            out.push_str("\nCited coverage:\n");
            for citation in &evaluation.citations {
                out.push_str(&format!("  > {}\n", citation));
            }
        }
        out
    }
}
