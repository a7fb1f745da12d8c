//! AssemblyAI transcription backend.
//!
//! Uploads the audio file, submits a diarized transcription job and polls
//! until completion or until the configured wait budget is exhausted.

use super::{Transcriber, Utterance};
use crate::config::TranscriptionSettings;
use crate::error::{Result, VaultError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

const API_BASE: &str = "https://api.assemblyai.com/v2";

/// AssemblyAI-backed transcriber.
pub struct AssemblyAiTranscriber {
    client: reqwest::Client,
    api_base: String,
    wait_budget: Duration,
    poll_interval: Duration,
    speakers_expected: u32,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptJob {
    id: String,
    status: String,
    error: Option<String>,
    #[serde(default)]
    utterances: Option<Vec<ApiUtterance>>,
}

#[derive(Debug, Deserialize)]
struct ApiUtterance {
    /// Start time in milliseconds.
    start: u64,
    /// End time in milliseconds.
    end: u64,
    text: String,
    speaker: String,
    #[serde(default)]
    confidence: Option<f64>,
}

impl AssemblyAiTranscriber {
    /// Create a transcriber from transcription settings.
    pub fn from_settings(settings: &TranscriptionSettings) -> Self {
        Self::new(
            Duration::from_secs(settings.wait_budget_seconds),
            Duration::from_secs(settings.poll_interval_seconds),
            settings.speakers_expected,
        )
    }

    pub fn new(wait_budget: Duration, poll_interval: Duration, speakers_expected: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: API_BASE.to_string(),
            wait_budget,
            poll_interval,
            speakers_expected,
        }
    }

    fn api_key() -> Result<String> {
        std::env::var("ASSEMBLYAI_API_KEY")
            .map_err(|_| VaultError::Config("ASSEMBLYAI_API_KEY is not set".to_string()))
    }

    /// Upload the audio bytes, returning a service-hosted URL.
    async fn upload(&self, audio_path: &Path, api_key: &str) -> Result<String> {
        let bytes = tokio::fs::read(audio_path).await?;
        debug!("Uploading {} bytes", bytes.len());

        let response = self
            .client
            .post(format!("{}/upload", self.api_base))
            .header("authorization", api_key)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;

        let upload: UploadResponse = response.json().await?;
        Ok(upload.upload_url)
    }

    /// Submit a transcription job with speaker diarization enabled.
    async fn submit(&self, audio_url: &str, api_key: &str) -> Result<String> {
        let body = serde_json::json!({
            "audio_url": audio_url,
            "speaker_labels": true,
            "speakers_expected": self.speakers_expected,
        });

        let response = self
            .client
            .post(format!("{}/transcript", self.api_base))
            .header("authorization", api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let job: TranscriptJob = response.json().await?;
        Ok(job.id)
    }

    /// Poll the job until it completes, errors, or the wait budget runs out.
    async fn poll(&self, job_id: &str, api_key: &str) -> Result<TranscriptJob> {
        let deadline = Instant::now() + self.wait_budget;

        loop {
            let response = self
                .client
                .get(format!("{}/transcript/{}", self.api_base, job_id))
                .header("authorization", api_key)
                .send()
                .await?
                .error_for_status()?;

            let job: TranscriptJob = response.json().await?;

            match job.status.as_str() {
                "completed" => return Ok(job),
                "error" => {
                    let reason = job.error.unwrap_or_else(|| "unknown error".to_string());
                    return Err(VaultError::TranscriptionRejected(reason));
                }
                status => {
                    debug!("Job {} status: {}", job_id, status);
                }
            }

            if Instant::now() >= deadline {
                return Err(VaultError::TranscriptionTimeout(format!(
                    "job {} still {} after {:?}",
                    job_id, job.status, self.wait_budget
                )));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn to_utterances(job: TranscriptJob) -> Vec<Utterance> {
        job.utterances
            .unwrap_or_default()
            .into_iter()
            .map(|u| Utterance {
                start_seconds: u.start as f64 / 1000.0,
                end_seconds: u.end as f64 / 1000.0,
                text: u.text,
                speaker: format!("Speaker {}", u.speaker),
                confidence: u.confidence.unwrap_or(0.9),
            })
            .collect()
    }
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Utterance>> {
        let api_key = Self::api_key()?;

        let audio_url = self.upload(audio_path, &api_key).await?;
        let job_id = self.submit(&audio_url, &api_key).await?;
        info!("Submitted transcription job {}", job_id);

        let job = self.poll(&job_id, &api_key).await?;
        let utterances = Self::to_utterances(job);
        info!("Transcription complete ({} utterances)", utterances.len());

        Ok(utterances)
    }
}
