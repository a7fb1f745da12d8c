//! Process command implementation.

use super::open_store;
use crate::cli::output::format_duration;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::{Pipeline, ProcessOutcome};
use anyhow::Result;
use std::sync::atomic::Ordering;

/// Run the process command.
pub async fn run_process(input: &str, force: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Process, &settings)?;

    let store = open_store(&settings)?;
    let pipeline = Pipeline::new(settings, store.clone())?;

    // Ctrl-C stops after the current stage; artifacts persisted so far
    // stay usable for `resume`.
    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            Output::warning("Cancelling after the current stage...");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let spinner = Output::spinner("Processing episode...");
    let outcome = pipeline.process(input, force).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(ProcessOutcome::AlreadyProcessed(episode)) => {
            Output::info(&format!(
                "'{}' is already processed. Use --force to reprocess.",
                episode.title
            ));
            Ok(())
        }
        Ok(ProcessOutcome::Completed(episode)) => {
            Output::success(&format!("Processed '{}'", episode.title));
            Output::kv("Episode ID", &episode.id);
            if let Some(duration) = episode.duration_seconds {
                Output::kv("Duration", &format_duration(duration));
            }

            let counts = store.episode_counts(&episode.id)?;
            Output::kv("Segments", &counts.segments.to_string());
            Output::kv("Insights", &counts.insights.to_string());
            Output::kv("Links", &counts.links.to_string());

            if let Some(summary) = &episode.summary {
                Output::header("Summary");
                println!("{}", summary);
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Processing failed: {}", e));
            if e.stage().is_some() {
                Output::info("Persisted artifacts are kept; `podvault resume <id>` picks up from there.");
            }
            Err(e.into())
        }
    }
}
