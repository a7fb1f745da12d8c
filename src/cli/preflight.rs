//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and API keys are available before
//! starting operations that would otherwise fail midway. Checks are
//! backend-aware: simulated backends need neither tools nor keys.

use crate::config::{Backend, Settings};
use crate::error::{Result, VaultError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Full processing requires download tools and both API keys.
    Process,
    /// Search requires only the embedding backend.
    Search,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Process => {
            if settings.transcription.backend == Backend::Real {
                check_env_key("ASSEMBLYAI_API_KEY")?;
                check_tool("yt-dlp")?;
                check_tool("ffmpeg")?;
                check_tool("ffprobe")?;
            }
            if settings.pipeline.llm_backend == Backend::Real
                || settings.embedding.backend == Backend::Real
            {
                check_env_key("OPENAI_API_KEY")?;
            }
        }
        Operation::Search => {
            if settings.embedding.backend == Backend::Real {
                check_env_key("OPENAI_API_KEY")?;
            }
        }
    }
    Ok(())
}

/// Check that an API key environment variable is set and non-empty.
fn check_env_key(name: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.is_empty() => Ok(()),
        _ => Err(VaultError::Config(format!(
            "{name} not set. Set it with: export {name}='...'"
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VaultError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VaultError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VaultError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_backends_need_nothing() {
        let mut settings = Settings::default();
        settings.transcription.backend = Backend::Simulated;
        settings.pipeline.llm_backend = Backend::Simulated;
        settings.embedding.backend = Backend::Simulated;

        assert!(check(Operation::Process, &settings).is_ok());
        assert!(check(Operation::Search, &settings).is_ok());
    }
}
