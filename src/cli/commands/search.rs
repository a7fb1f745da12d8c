//! Search command implementation.

use super::open_store;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: usize,
    min_score: f32,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Search, &settings)?;

    let store = open_store(&settings)?;
    let pipeline = Pipeline::new(settings, store)?;

    let spinner = Output::spinner("Searching...");
    let results = pipeline.search(query, limit, min_score).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) => {
            if hits.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", hits.len()));
                for hit in &hits {
                    Output::search_result(
                        &hit.episode_title,
                        &hit.kind.to_string(),
                        hit.score,
                        &hit.content,
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            Err(e.into())
        }
    }
}
