//! Products command implementation.

use super::open_store;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the products command.
pub fn run_products(settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;
    let products = store.list_products()?;

    if products.is_empty() {
        Output::info("No products recorded yet.");
        return Ok(());
    }

    Output::header(&format!("Products ({})", products.len()));
    println!();

    for product in &products {
        let episodes = product.episode_ids.len();
        Output::list_item(&format!(
            "{} - {} mention{} in {} episode{}",
            product.name,
            product.mention_count,
            if product.mention_count == 1 { "" } else { "s" },
            episodes,
            if episodes == 1 { "" } else { "s" }
        ));
    }

    Ok(())
}
