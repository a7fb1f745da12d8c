//! Core data model: episodes, segments, insights, products and links.
//!
//! The Episode is the aggregate root. Segments, insights and links are
//! exclusively owned by one episode; products are shared across episodes.

use crate::error::{Result, VaultError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing status of an episode.
///
/// Transitions only move forward through the stage ordering; `Failed` is
/// terminal and reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeStatus {
    Pending,
    Downloading,
    Transcribing,
    Processed,
    Failed,
}

impl EpisodeStatus {
    fn rank(self) -> u8 {
        match self {
            EpisodeStatus::Pending => 0,
            EpisodeStatus::Downloading => 1,
            EpisodeStatus::Transcribing => 2,
            EpisodeStatus::Processed => 3,
            EpisodeStatus::Failed => 4,
        }
    }

    /// Whether a transition to `next` is allowed.
    pub fn can_transition_to(self, next: EpisodeStatus) -> bool {
        match (self, next) {
            (EpisodeStatus::Failed, _) => false,
            (EpisodeStatus::Processed, EpisodeStatus::Failed) => false,
            (_, EpisodeStatus::Failed) => true,
            (from, to) => to.rank() > from.rank(),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EpisodeStatus::Processed | EpisodeStatus::Failed)
    }
}

impl std::str::FromStr for EpisodeStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(EpisodeStatus::Pending),
            "downloading" => Ok(EpisodeStatus::Downloading),
            "transcribing" => Ok(EpisodeStatus::Transcribing),
            "processed" => Ok(EpisodeStatus::Processed),
            "failed" => Ok(EpisodeStatus::Failed),
            _ => Err(format!("Unknown episode status: {}", s)),
        }
    }
}

impl std::fmt::Display for EpisodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EpisodeStatus::Pending => write!(f, "pending"),
            EpisodeStatus::Downloading => write!(f, "downloading"),
            EpisodeStatus::Transcribing => write!(f, "transcribing"),
            EpisodeStatus::Processed => write!(f, "processed"),
            EpisodeStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One processed source recording (e.g., a podcast episode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Unique episode ID.
    pub id: String,
    /// Episode title.
    pub title: String,
    /// Source video identifier.
    pub video_id: String,
    /// Source URL.
    pub source_url: String,
    /// Source description, if available (links are mined from it).
    pub description: Option<String>,
    /// Duration in seconds, if known.
    pub duration_seconds: Option<f64>,
    /// Publish timestamp, if known.
    pub published_at: Option<DateTime<Utc>>,
    /// Current processing status.
    pub status: EpisodeStatus,
    /// Episode-level summary, set by the summarization stage.
    pub summary: Option<String>,
    /// Local audio file path, set by the acquisition stage.
    pub audio_path: Option<String>,
    /// Whether the full pipeline has completed.
    pub processed: bool,
    /// When this episode record was created.
    pub created_at: DateTime<Utc>,
}

impl Episode {
    /// Create a new pending episode for a source URL.
    pub fn new(title: String, video_id: String, source_url: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            video_id,
            source_url,
            description: None,
            duration_seconds: None,
            published_at: None,
            status: EpisodeStatus::Pending,
            summary: None,
            audio_path: None,
            processed: false,
            created_at: Utc::now(),
        }
    }

    /// Advance the status, rejecting backward transitions.
    pub fn advance(&mut self, next: EpisodeStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(VaultError::InvalidInput(format!(
                "Illegal status transition: {} -> {}",
                self.status, next
            )));
        }
        self.status = next;
        if next == EpisodeStatus::Processed {
            self.processed = true;
        }
        Ok(())
    }
}

/// A contiguous, speaker-attributed span of transcript text.
///
/// Created in bulk by the transcription stage; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Unique segment ID.
    pub id: String,
    /// Owning episode ID.
    pub episode_id: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Raw transcribed text.
    pub raw_text: String,
    /// Display text (cleaned, defaults to raw).
    pub display_text: String,
    /// Speaker label (e.g. "Speaker A").
    pub speaker: String,
    /// Transcription confidence (0.0-1.0).
    pub confidence: f64,
    /// Insertion order within the episode.
    pub position: i64,
}

impl Segment {
    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Fixed insight categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    FrameworksAndExercises,
    PointsOfView,
    BusinessIdeas,
    StoriesAndAnecdotes,
    Quotes,
    Products,
}

impl InsightCategory {
    /// All categories, in display order.
    pub const ALL: [InsightCategory; 6] = [
        InsightCategory::FrameworksAndExercises,
        InsightCategory::PointsOfView,
        InsightCategory::BusinessIdeas,
        InsightCategory::StoriesAndAnecdotes,
        InsightCategory::Quotes,
        InsightCategory::Products,
    ];

    /// Human-readable label, as used in prompts and output.
    pub fn label(self) -> &'static str {
        match self {
            InsightCategory::FrameworksAndExercises => "Frameworks & Exercises",
            InsightCategory::PointsOfView => "Points of View",
            InsightCategory::BusinessIdeas => "Business Ideas",
            InsightCategory::StoriesAndAnecdotes => "Stories & Anecdotes",
            InsightCategory::Quotes => "Quotes",
            InsightCategory::Products => "Products",
        }
    }

    /// Parse a category from a model- or user-supplied label.
    ///
    /// Tolerates case differences and decorative prefixes (emoji etc.) by
    /// matching on the alphanumeric core of the label.
    pub fn parse_label(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        InsightCategory::ALL.into_iter().find(|cat| {
            let key: String = cat
                .label()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            key == normalized
        })
    }
}

impl std::fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A categorized, extracted claim or idea tied to a time range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Unique insight ID.
    pub id: String,
    /// Owning episode ID.
    pub episode_id: String,
    /// Category this insight belongs to.
    pub category: InsightCategory,
    /// The insight text (1-2 sentences).
    pub content: String,
    /// Extraction confidence (0.0-1.0).
    pub confidence: f64,
    /// Start of the source segment group, in seconds.
    pub start_seconds: f64,
    /// End of the source segment group, in seconds.
    pub end_seconds: f64,
}

impl Insight {
    pub fn new(
        episode_id: String,
        category: InsightCategory,
        content: String,
        confidence: f64,
        start_seconds: f64,
        end_seconds: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            episode_id,
            category,
            content,
            confidence,
            start_seconds,
            end_seconds,
        }
    }
}

/// A named tool/technology entity deduplicated across episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: String,
    /// Display name as first seen.
    pub name: String,
    /// Normalized match key (lowercase, punctuation stripped).
    pub normalized_name: String,
    /// Count of recorded (episode, mention-event) pairs.
    pub mention_count: i64,
    /// Distinct episodes that mention this product.
    pub episode_ids: Vec<String>,
}

/// A URL extracted from episode content, optionally enriched with
/// fetched title/description metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Unique link ID.
    pub id: String,
    /// Owning episode ID.
    pub episode_id: String,
    /// The URL.
    pub url: String,
    /// Page title, set by enrichment.
    pub title: Option<String>,
    /// Page description, set by enrichment.
    pub description: Option<String>,
    /// Whether enrichment has succeeded for this link.
    pub enriched: bool,
    /// Order of first appearance within the episode.
    pub position: i64,
}

impl Link {
    pub fn new(episode_id: String, url: String, position: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            episode_id,
            url,
            title: None,
            description: None,
            enriched: false,
            position,
        }
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_forward_only() {
        assert!(EpisodeStatus::Pending.can_transition_to(EpisodeStatus::Downloading));
        assert!(EpisodeStatus::Downloading.can_transition_to(EpisodeStatus::Transcribing));
        assert!(EpisodeStatus::Transcribing.can_transition_to(EpisodeStatus::Processed));

        // No backward transitions
        assert!(!EpisodeStatus::Transcribing.can_transition_to(EpisodeStatus::Pending));
        assert!(!EpisodeStatus::Processed.can_transition_to(EpisodeStatus::Transcribing));

        // Failed reachable from any non-terminal state
        assert!(EpisodeStatus::Pending.can_transition_to(EpisodeStatus::Failed));
        assert!(EpisodeStatus::Transcribing.can_transition_to(EpisodeStatus::Failed));
        assert!(!EpisodeStatus::Processed.can_transition_to(EpisodeStatus::Failed));
        assert!(!EpisodeStatus::Failed.can_transition_to(EpisodeStatus::Pending));
    }

    #[test]
    fn test_episode_advance() {
        let mut episode = Episode::new(
            "Test".to_string(),
            "abc123".to_string(),
            "https://example.com/abc123".to_string(),
        );

        episode.advance(EpisodeStatus::Downloading).unwrap();
        episode.advance(EpisodeStatus::Transcribing).unwrap();
        assert!(episode.advance(EpisodeStatus::Pending).is_err());

        episode.advance(EpisodeStatus::Processed).unwrap();
        assert!(episode.processed);
    }

    #[test]
    fn test_category_parse_label() {
        assert_eq!(
            InsightCategory::parse_label("Business Ideas"),
            Some(InsightCategory::BusinessIdeas)
        );
        assert_eq!(
            InsightCategory::parse_label("business ideas"),
            Some(InsightCategory::BusinessIdeas)
        );
        // Decorated labels from older prompt versions
        assert_eq!(
            InsightCategory::parse_label("\u{1f4a1} Business Ideas"),
            Some(InsightCategory::BusinessIdeas)
        );
        assert_eq!(InsightCategory::parse_label("Unknown Category"), None);
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            EpisodeStatus::Pending,
            EpisodeStatus::Downloading,
            EpisodeStatus::Transcribing,
            EpisodeStatus::Processed,
            EpisodeStatus::Failed,
        ] {
            let parsed: EpisodeStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_segment_duration() {
        let segment = Segment {
            id: "s1".to_string(),
            episode_id: "e1".to_string(),
            start_seconds: 10.0,
            end_seconds: 25.5,
            raw_text: "hello".to_string(),
            display_text: "hello".to_string(),
            speaker: "Speaker A".to_string(),
            confidence: 0.95,
            position: 0,
        };
        assert!((segment.duration() - 15.5).abs() < f64::EPSILON);
    }
}
