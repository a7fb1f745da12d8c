//! CLI module for Podvault.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Podvault - Podcast Knowledge Vault
///
/// A CLI tool that turns podcast episodes into a searchable knowledge
/// vault: transcripts, summaries, categorized insights, product mentions
/// and links, all queryable by semantic search.
#[derive(Parser, Debug)]
#[command(name = "podvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Podvault and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Process a podcast episode end to end
    Process {
        /// YouTube URL or video ID
        input: String,

        /// Reprocess from scratch even if already processed
        #[arg(short, long)]
        force: bool,
    },

    /// Resume a failed episode from its last completed stage
    Resume {
        /// Episode ID (see `podvault list`)
        episode_id: String,
    },

    /// List stored episodes
    List,

    /// Show one episode: summary, insights, products and links
    Show {
        /// Episode ID
        episode_id: String,
    },

    /// Search transcripts and insights semantically
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (0.0-1.0)
        #[arg(short, long, default_value = "0.3")]
        min_score: f32,
    },

    /// List products mentioned across all episodes
    Products,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
