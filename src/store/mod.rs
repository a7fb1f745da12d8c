//! Persistent storage for episodes and derived artifacts.
//!
//! Everything lives in one SQLite database. Vector search is cosine
//! similarity computed in Rust over stored embeddings; for large corpora
//! consider the sqlite-vec extension or a dedicated vector database.

mod sqlite;

pub use sqlite::SqliteStore;

use serde::{Deserialize, Serialize};

/// What a stored embedding vector refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingKind {
    Segment,
    Insight,
}

impl std::fmt::Display for EmbeddingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingKind::Segment => write!(f, "segment"),
            EmbeddingKind::Insight => write!(f, "insight"),
        }
    }
}

impl std::str::FromStr for EmbeddingKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "segment" => Ok(EmbeddingKind::Segment),
            "insight" => Ok(EmbeddingKind::Insight),
            _ => Err(format!("Unknown embedding kind: {}", s)),
        }
    }
}

/// An embedding vector tied to a segment or insight.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub episode_id: String,
    pub kind: EmbeddingKind,
    /// ID of the segment or insight this vector was computed from.
    pub ref_id: String,
    /// The text that was embedded, kept for display in search results.
    pub content: String,
    pub vector: Vec<f32>,
}

/// A semantic search hit.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub episode_id: String,
    pub episode_title: String,
    pub kind: EmbeddingKind,
    pub ref_id: String,
    pub content: String,
    pub score: f32,
}

/// Per-episode artifact counts, for listings and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct EpisodeCounts {
    pub segments: usize,
    pub insights: usize,
    pub links: usize,
    pub embeddings: usize,
}
