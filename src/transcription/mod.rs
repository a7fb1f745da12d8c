//! Speech-to-text with speaker diarization.
//!
//! Provides a trait-based interface so the hosted AssemblyAI backend and
//! the deterministic simulated backend are interchangeable.

mod assemblyai;
mod simulated;

pub use assemblyai::AssemblyAiTranscriber;
pub use simulated::SimulatedTranscriber;

use crate::config::{Backend, TranscriptionSettings};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A speaker-attributed utterance returned by a transcription backend.
///
/// Times are in seconds relative to the start of the audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Transcribed text.
    pub text: String,
    /// Speaker label (e.g. "Speaker A").
    pub speaker: String,
    /// Confidence score (0.0-1.0).
    pub confidence: f64,
}

/// Trait for transcription backends.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into ordered, speaker-attributed utterances.
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Utterance>>;
}

/// Create a transcriber for the configured backend.
pub fn create_transcriber(settings: &TranscriptionSettings) -> Arc<dyn Transcriber> {
    match settings.backend {
        Backend::Real => Arc::new(AssemblyAiTranscriber::from_settings(settings)),
        Backend::Simulated => Arc::new(SimulatedTranscriber::new(settings.speakers_expected)),
    }
}

/// Check if the AssemblyAI API key is configured.
pub fn is_api_key_configured() -> bool {
    std::env::var("ASSEMBLYAI_API_KEY").is_ok()
}
