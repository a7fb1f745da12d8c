//! Error types for Podvault.

use thiserror::Error;

/// Library-level error type for Podvault operations.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Transcription timed out: {0}")]
    TranscriptionTimeout(String),

    #[error("Transcription rejected: {0}")]
    TranscriptionRejected(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Enrichment unavailable: {0}")]
    EnrichmentUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("{stage} stage failed: {source}")]
    StageFailed {
        stage: &'static str,
        #[source]
        source: Box<VaultError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),
}

impl VaultError {
    /// Whether this failure is worth retrying with backoff.
    ///
    /// Rejected content, missing sources and bad input are permanent;
    /// network-level and model-level errors usually are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            VaultError::Http(_)
                | VaultError::OpenAI(_)
                | VaultError::EmbeddingFailed(_)
                | VaultError::GenerationFailed(_)
        )
    }

    /// Wrap an error with the pipeline stage it occurred in.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            VaultError::StageFailed { .. } => self,
            other => VaultError::StageFailed {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was attributed to, if any.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            VaultError::StageFailed { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Result type alias for Podvault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(VaultError::EmbeddingFailed("rate limit".into()).is_transient());
        assert!(VaultError::GenerationFailed("empty response".into()).is_transient());
        assert!(!VaultError::TranscriptionRejected("silence".into()).is_transient());
        assert!(!VaultError::SourceUnavailable("video removed".into()).is_transient());
    }

    #[test]
    fn test_stage_attribution() {
        let err = VaultError::SourceUnavailable("deleted".into()).in_stage("audio");
        assert_eq!(err.stage(), Some("audio"));

        // Re-wrapping keeps the original stage
        let err = err.in_stage("transcription");
        assert_eq!(err.stage(), Some("audio"));
    }
}
