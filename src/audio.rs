//! Audio acquisition: download via yt-dlp, normalize via ffmpeg.

use crate::error::{Result, VaultError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// A downloaded audio file with its probed duration.
#[derive(Debug, Clone)]
pub struct AudioFile {
    /// Local path to the MP3 file.
    pub path: PathBuf,
    /// Duration in seconds.
    pub duration_seconds: f64,
}

/// Downloads audio for a source URL and saves it as MP3.
///
/// Uses yt-dlp to download and extract audio. If the file already exists
/// in the working directory, it is reused without re-downloading. The
/// caller owns cleanup of the returned file.
#[instrument(skip(output_dir), fields(video_id = %video_id))]
pub async fn download_audio(url: &str, video_id: &str, output_dir: &Path) -> Result<AudioFile> {
    std::fs::create_dir_all(output_dir)?;

    let target_path = output_dir.join(format!("{}.mp3", video_id));

    if target_path.exists() {
        info!("Using cached audio file");
        let duration_seconds = probe_duration(&target_path).await?;
        return Ok(AudioFile {
            path: target_path,
            duration_seconds,
        });
    }

    info!("Downloading audio from {}", url);

    let template = output_dir.join(format!("{}.%(ext)s", video_id));

    let result = Command::new("yt-dlp")
        .arg("--extract-audio")
        .arg("--audio-format").arg("mp3")
        .arg("--audio-quality").arg("0")
        .arg("--output").arg(template.to_str().unwrap_or_default())
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VaultError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(VaultError::SourceUnavailable(format!(
                "yt-dlp execution failed: {e}"
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VaultError::SourceUnavailable(format!(
            "yt-dlp failed: {}",
            stderr.trim()
        )));
    }

    // yt-dlp may output different container formats; find and normalize to mp3
    let downloaded = find_audio_file(output_dir, video_id)?;

    if downloaded != target_path {
        normalize_to_mp3(&downloaded, &target_path).await?;
        let _ = std::fs::remove_file(&downloaded);
    }

    let duration_seconds = probe_duration(&target_path).await?;

    Ok(AudioFile {
        path: target_path,
        duration_seconds,
    })
}

/// Locates a downloaded audio file by video ID.
fn find_audio_file(dir: &Path, video_id: &str) -> Result<PathBuf> {
    // Common audio formats that yt-dlp may produce
    for ext in &["mp3", "opus", "m4a", "webm", "ogg"] {
        let candidate = dir.join(format!("{}.{}", video_id, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    // Fallback: scan directory for matching prefix
    let entries = std::fs::read_dir(dir)
        .map_err(|e| VaultError::SourceUnavailable(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(video_id) {
            return Ok(entry.path());
        }
    }

    Err(VaultError::SourceUnavailable(
        "Audio file not found after download".into(),
    ))
}

/// Converts an audio file to MP3 using ffmpeg.
///
/// A conversion failure means the downloaded container cannot be decoded
/// into the target encoding, which is an `UnsupportedFormat`.
async fn normalize_to_mp3(source: &Path, dest: &Path) -> Result<()> {
    debug!("Converting {:?} to MP3", source);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-vn")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(VaultError::UnsupportedFormat(format!(
                "ffmpeg conversion failed: {}",
                err.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VaultError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(VaultError::UnsupportedFormat(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of an audio file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VaultError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(VaultError::UnsupportedFormat(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(VaultError::UnsupportedFormat("ffprobe returned error".into()));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|_| VaultError::UnsupportedFormat("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| VaultError::UnsupportedFormat("Could not determine audio duration".into()))
}
