//! YouTube source implementation.

use super::{MediaSource, SourceMetadata};
use crate::error::{Result, VaultError};
use async_trait::async_trait;
use regex::Regex;

/// YouTube media source backed by yt-dlp.
pub struct YoutubeSource {
    video_id_regex: Regex,
}

impl YoutubeSource {
    pub fn new() -> Self {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Self { video_id_regex }
    }

    fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        // Try group 1 (URL format) then group 2 (bare ID)
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Fetch metadata using yt-dlp.
    async fn fetch_metadata_ytdlp(&self, video_id: &str) -> Result<SourceMetadata> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let output = tokio::process::Command::new("yt-dlp")
            .args(["--dump-json", "--no-download", "--no-warnings", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    VaultError::ToolNotFound("yt-dlp".to_string())
                } else {
                    VaultError::SourceUnavailable(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VaultError::SourceUnavailable(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value = serde_json::from_str(&json_str).map_err(|e| {
            VaultError::SourceUnavailable(format!("Failed to parse yt-dlp output: {}", e))
        })?;

        let title = json["title"]
            .as_str()
            .unwrap_or("Unknown Title")
            .to_string();

        let description = json["description"].as_str().map(|s| s.to_string());
        let duration = json["duration"].as_f64();
        let channel = json["channel"]
            .as_str()
            .or_else(|| json["uploader"].as_str())
            .map(|s| s.to_string());

        let published_at = json["upload_date"].as_str().and_then(|date_str| {
            // yt-dlp returns date as YYYYMMDD
            if date_str.len() == 8 {
                chrono::NaiveDate::parse_from_str(date_str, "%Y%m%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            } else {
                None
            }
        });

        Ok(SourceMetadata {
            video_id: video_id.to_string(),
            title,
            description,
            duration_seconds: duration,
            source_url: url,
            published_at,
            channel,
        })
    }
}

impl Default for YoutubeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for YoutubeSource {
    async fn fetch_metadata(&self, id: &str) -> Result<SourceMetadata> {
        let video_id = self.extract_video_id(id).ok_or_else(|| {
            VaultError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", id))
        })?;

        self.fetch_metadata_ytdlp(&video_id).await
    }

    fn can_handle(&self, input: &str) -> bool {
        self.extract_video_id(input).is_some()
    }

    fn extract_id(&self, input: &str) -> Option<String> {
        self.extract_video_id(input)
    }

    fn canonical_url(&self, id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        let source = YoutubeSource::new();

        assert_eq!(
            source.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );

        assert_eq!(source.extract_video_id("not-a-video-id"), None);
        assert_eq!(source.extract_video_id(""), None);
    }

    #[test]
    fn test_can_handle() {
        let source = YoutubeSource::new();

        assert!(source.can_handle("dQw4w9WgXcQ"));
        assert!(source.can_handle("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!source.can_handle("/path/to/episode.mp4"));
    }
}
