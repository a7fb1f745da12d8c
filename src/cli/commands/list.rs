//! List command implementation.

use super::open_store;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the list command.
pub fn run_list(settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;
    let episodes = store.list_episodes()?;

    if episodes.is_empty() {
        Output::info("No episodes yet. Use 'podvault process <url>' to add one.");
        return Ok(());
    }

    Output::header(&format!("Episodes ({})", episodes.len()));
    println!();

    for episode in &episodes {
        Output::episode_line(
            &episode.title,
            &episode.id,
            episode.status,
            episode.duration_seconds,
        );
    }

    let processed = episodes.iter().filter(|e| e.processed).count();
    println!();
    Output::kv("Total", &episodes.len().to_string());
    Output::kv("Processed", &processed.to_string());

    Ok(())
}
