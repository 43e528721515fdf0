//! CLI entrypoint for reader-panel
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod output;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use output::{ConsoleFormatter, ConsoleProgress};
use panel_application::{
    EventRelay, FocusGroupInput, MemorizeUseCase, MemoryStore, NoProgress, ProgressNotifier,
    RunExecutiveUseCase, RunFocusGroupUseCase, RunPanelInput, RunPanelUseCase,
};
use panel_domain::{Manuscript, ManuscriptMeta};
use panel_infrastructure::{ConfigLoader, HttpInferenceGateway, InMemoryMemoryStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reader-panel", version, about = "Simulated reader panel for manuscript coverage")]
struct Cli {
    /// Path to the manuscript text file
    manuscript: PathBuf,

    /// Manuscript title
    #[arg(long)]
    title: Option<String>,

    /// Author name
    #[arg(long)]
    author: Option<String>,

    /// Genre
    #[arg(long)]
    genre: Option<String>,

    /// Format (novel, screenplay, ...)
    #[arg(long)]
    format: Option<String>,

    /// Page count
    #[arg(long)]
    pages: Option<u32>,

    /// Project identifier grouping drafts of the same work
    #[arg(long, default_value = "default")]
    project: String,

    /// Draft number within the project
    #[arg(long, default_value_t = 1)]
    draft: u32,

    /// Focus-group question; repeat the flag to ask several
    #[arg(short, long = "question")]
    questions: Vec<String>,

    /// Run the executive evaluation after coverage
    #[arg(long)]
    executive: bool,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured inter-turn pacing (milliseconds)
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Full)]
    output: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress output
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Full,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = ConfigLoader::load(cli.config.as_ref())?;
    let panel = config.panel();
    info!(readers = panel.len(), "Starting reader panel");

    let text = std::fs::read_to_string(&cli.manuscript)
        .with_context(|| format!("Cannot read manuscript at {}", cli.manuscript.display()))?;
    let meta = ManuscriptMeta::from_loose(
        cli.title.as_deref(),
        cli.author.as_deref(),
        cli.genre.as_deref(),
        cli.format.as_deref(),
        cli.pages,
    );
    let title = meta.title.clone();
    let manuscript = Manuscript::try_new(text, meta).context("Manuscript file is empty")?;

    // === Dependency Injection ===
    let gateway = Arc::new(HttpInferenceGateway::new(
        &config.gateway.base_url,
        config.gateway.api_key.clone(),
        &config.gateway.model,
    )?);
    // Memory extraction runs on the smaller-footprint model
    let extraction_gateway = Arc::new(HttpInferenceGateway::new(
        &config.gateway.base_url,
        config.gateway.api_key.clone(),
        config.gateway.extraction_model(),
    )?);
    let store: Arc<dyn MemoryStore> = Arc::new(InMemoryMemoryStore::new());
    let memorizer = Arc::new(MemorizeUseCase::new(extraction_gateway, store.clone()));

    let progress: Box<dyn ProgressNotifier> = if cli.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(ConsoleProgress::new())
    };

    if !cli.quiet {
        println!("\nManuscript: {} ({})", title, manuscript.excerpt(60));
        println!(
            "Panel: {}",
            panel
                .iter()
                .map(|p| p.name.clone())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    // Coverage
    let panel_use_case = RunPanelUseCase::new(gateway.clone(), panel.clone())
        .with_memory(store.clone(), memorizer.clone());
    let input = RunPanelInput {
        manuscript,
        project: cli.project.clone(),
        draft: cli.draft,
        history: None,
        calibration: None,
    };
    let report = panel_use_case
        .execute_with_progress(input, progress.as_ref(), &EventRelay::null())
        .await?;

    match cli.output {
        OutputFormat::Full => println!("{}", ConsoleFormatter::format_report(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    // Focus group
    if !cli.questions.is_empty() {
        let cancel = CancellationToken::new();
        let signal_cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal_cancel.cancel();
            }
        });

        let mut fg_input = FocusGroupInput::new(
            cli.project.clone(),
            cli.draft,
            title.clone(),
            cli.questions.clone(),
        )
        .with_context(report.analyses.clone(), report.divergences.clone());
        fg_input.pacing = cli
            .pacing_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| config.focus_group.pacing());
        fg_input.max_reaction_rounds = config.focus_group.reaction_rounds;

        let engine = RunFocusGroupUseCase::new(gateway.clone(), panel.clone())
            .with_memory(store.clone(), memorizer.clone());
        let session = engine
            .execute_with_progress(fg_input, progress.as_ref(), &EventRelay::null(), &cancel)
            .await?;

        match cli.output {
            OutputFormat::Full => {
                if !cli.quiet {
                    println!(
                        "\nFocus group ended ({:?}, {} statements)",
                        session.state,
                        session.messages().len()
                    );
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&session)?),
        }
    }

    // Executive evaluation
    if cli.executive {
        let executive = RunExecutiveUseCase::new(gateway.clone());
        let evaluation = executive.execute(&report, &EventRelay::null()).await?;
        match cli.output {
            OutputFormat::Full => println!("{}", ConsoleFormatter::format_executive(&evaluation)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&evaluation)?),
        }
    }

    Ok(())
}
