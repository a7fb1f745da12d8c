//! Deterministic transcription backend for demos and tests.

use super::{Transcriber, Utterance};
use crate::audio::probe_duration;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Speaker turn length used by the simulator, in seconds.
const TURN_SECONDS: f64 = 20.0;

/// Simulated transcriber producing alternating speaker turns.
///
/// Output depends only on the audio duration and configured speaker count,
/// so repeated runs over the same input are identical.
pub struct SimulatedTranscriber {
    speakers: u32,
    /// Fixed duration override; when unset the audio file is probed.
    fixed_duration: Option<f64>,
}

impl SimulatedTranscriber {
    pub fn new(speakers: u32) -> Self {
        Self {
            speakers: speakers.max(1),
            fixed_duration: None,
        }
    }

    /// Use a fixed duration instead of probing the audio file.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.fixed_duration = Some(seconds);
        self
    }

    fn speaker_label(&self, turn: usize) -> String {
        let idx = (turn as u32) % self.speakers;
        let letter = (b'A' + (idx % 26) as u8) as char;
        format!("Speaker {}", letter)
    }

    fn turn_text(turn: usize, speaker: &str) -> String {
        match turn % 4 {
            0 => format!(
                "{} walks through the framework they use to prioritize new product ideas, \
                 stressing that you should talk to users before writing any code.",
                speaker
            ),
            1 => format!(
                "{} pushes back and argues that shipping something rough with a tool like \
                 Vercel beats another week of planning. Check out https://vercel.com for that.",
                speaker
            ),
            2 => format!(
                "{} tells a story about a failed launch that turned into their best \
                 business idea once they rebuilt it on Supabase.",
                speaker
            ),
            _ => format!(
                "{} quotes a mentor: \"the best roadmap is a list of things users already \
                 asked for twice.\"",
                speaker
            ),
        }
    }

    fn generate(&self, duration: f64) -> Vec<Utterance> {
        let mut utterances = Vec::new();
        let mut start = 0.0;
        let mut turn = 0usize;

        while start < duration {
            let end = (start + TURN_SECONDS).min(duration);
            let speaker = self.speaker_label(turn);
            utterances.push(Utterance {
                start_seconds: start,
                end_seconds: end,
                text: Self::turn_text(turn, &speaker),
                speaker,
                confidence: 0.95,
            });
            start = end;
            turn += 1;
        }

        utterances
    }
}

#[async_trait]
impl Transcriber for SimulatedTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Utterance>> {
        let duration = match self.fixed_duration {
            Some(d) => d,
            None => probe_duration(audio_path).await?,
        };

        Ok(self.generate(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_two_speakers_alternate() {
        let transcriber = SimulatedTranscriber::new(2).with_duration(600.0);
        let utterances = transcriber
            .transcribe(Path::new("unused.mp3"))
            .await
            .unwrap();

        assert_eq!(utterances.len(), 30);
        assert_eq!(utterances[0].speaker, "Speaker A");
        assert_eq!(utterances[1].speaker, "Speaker B");
        assert_eq!(utterances[2].speaker, "Speaker A");

        // Ordered and non-overlapping
        for pair in utterances.windows(2) {
            assert!(pair[0].end_seconds <= pair[1].start_seconds);
        }

        // Full coverage of the duration
        assert!((utterances.last().unwrap().end_seconds - 600.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let transcriber = SimulatedTranscriber::new(2).with_duration(300.0);
        let a = transcriber.transcribe(Path::new("x.mp3")).await.unwrap();
        let b = transcriber.transcribe(Path::new("x.mp3")).await.unwrap();
        assert_eq!(a, b);
    }
}
