//! Media source abstraction.
//!
//! A media source resolves an identifier/URL to episode metadata. The
//! download of the audio itself lives in the `audio` module since it is
//! the same for all sources (via yt-dlp/ffmpeg).

mod youtube;

pub use youtube::YoutubeSource;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about a remote media item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Source video identifier.
    pub video_id: String,
    /// Title.
    pub title: String,
    /// Description (links are mined from it).
    pub description: Option<String>,
    /// Duration in seconds (if known).
    pub duration_seconds: Option<f64>,
    /// Canonical URL.
    pub source_url: String,
    /// Publication date (if available).
    pub published_at: Option<DateTime<Utc>>,
    /// Channel or author name (if available).
    pub channel: Option<String>,
}

/// Trait for media source providers.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fetch metadata for a media item by ID.
    async fn fetch_metadata(&self, id: &str) -> Result<SourceMetadata>;

    /// Check if this source can handle the given input.
    fn can_handle(&self, input: &str) -> bool;

    /// Extract the source ID from input (URL or bare ID).
    fn extract_id(&self, input: &str) -> Option<String>;

    /// Canonical URL for a media item ID.
    fn canonical_url(&self, id: &str) -> String;
}

/// Parse input and return the appropriate source and ID.
pub fn parse_input(input: &str) -> Option<(Box<dyn MediaSource>, String)> {
    let youtube = YoutubeSource::new();
    if youtube.can_handle(input) {
        let id = youtube.extract_id(input)?;
        return Some((Box::new(youtube), id));
    }
    None
}
