//! Show command implementation.

use super::open_store;
use crate::cli::output::format_duration;
use crate::cli::Output;
use crate::config::Settings;
use crate::model::{format_timestamp, InsightCategory};
use anyhow::Result;

/// Run the show command.
pub fn run_show(episode_id: &str, settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;

    let Some(episode) = store.get_episode(episode_id)? else {
        Output::error(&format!("No episode with ID {}", episode_id));
        anyhow::bail!("episode not found");
    };

    Output::header(&episode.title);
    Output::kv("ID", &episode.id);
    Output::kv("Status", &episode.status.to_string());
    Output::kv("Source", &episode.source_url);
    if let Some(duration) = episode.duration_seconds {
        Output::kv("Duration", &format_duration(duration));
    }
    if let Some(published) = episode.published_at {
        Output::kv("Published", &published.format("%Y-%m-%d").to_string());
    }

    if let Some(summary) = &episode.summary {
        Output::header("Summary");
        println!("{}", summary);
    }

    let insights = store.get_insights(&episode.id)?;
    if !insights.is_empty() {
        Output::header(&format!("Insights ({})", insights.len()));
        for category in InsightCategory::ALL {
            let in_category: Vec<_> = insights.iter().filter(|i| i.category == category).collect();
            if in_category.is_empty() {
                continue;
            }
            println!("\n{}", category.label());
            for insight in in_category {
                Output::list_item(&format!(
                    "[{}] {}",
                    format_timestamp(insight.start_seconds),
                    insight.content
                ));
            }
        }
    }

    let products: Vec<_> = store
        .list_products()?
        .into_iter()
        .filter(|p| p.episode_ids.contains(&episode.id))
        .collect();
    if !products.is_empty() {
        Output::header(&format!("Products ({})", products.len()));
        for product in &products {
            Output::list_item(&format!(
                "{} ({} mentions across {} episodes)",
                product.name,
                product.mention_count,
                product.episode_ids.len()
            ));
        }
    }

    let links = store.get_links(&episode.id)?;
    if !links.is_empty() {
        Output::header(&format!("Links ({})", links.len()));
        for link in &links {
            match &link.title {
                Some(title) => Output::list_item(&format!("{} - {}", title, link.url)),
                None => Output::list_item(&link.url),
            }
        }
    }

    Ok(())
}
