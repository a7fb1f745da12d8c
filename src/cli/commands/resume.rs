//! Resume command implementation.

use super::open_store;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;
use std::sync::atomic::Ordering;

/// Run the resume command.
pub async fn run_resume(episode_id: &str, settings: Settings) -> Result<()> {
    preflight::check(Operation::Process, &settings)?;

    let store = open_store(&settings)?;
    let pipeline = Pipeline::new(settings, store.clone())?;

    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            Output::warning("Cancelling after the current stage...");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let spinner = Output::spinner("Resuming episode...");
    let result = pipeline.resume(episode_id).await;
    spinner.finish_and_clear();

    match result {
        Ok(episode) => {
            Output::success(&format!("Processed '{}'", episode.title));

            let counts = store.episode_counts(&episode.id)?;
            Output::kv("Segments", &counts.segments.to_string());
            Output::kv("Insights", &counts.insights.to_string());
            Output::kv("Links", &counts.links.to_string());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Resume failed: {}", e));
            Err(e.into())
        }
    }
}
