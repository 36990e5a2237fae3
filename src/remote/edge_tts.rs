use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::debug;

use crate::orchestrator::traits::{SpeechSynthesizer, SynthesisRequest};

/// Drives the `edge-tts` command line tool, one process per segment.
pub struct EdgeTtsSynthesizer {
    binary: PathBuf,
}

impl EdgeTtsSynthesizer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, request: &SynthesisRequest, output: &std::path::Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("--voice")
            .arg(&request.voice)
            .arg(format!("--rate={}", request.rate))
            .arg(format!("--pitch={}", request.pitch))
            .arg(format!("--text={}", request.text))
            .arg("--write-media")
            .arg(output)
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes> {
        let media = tempfile::Builder::new()
            .prefix("edge-tts-")
            .suffix(".mp3")
            .tempfile()
            .context("failed to create edge-tts output file")?;

        debug!(
            target: "remote",
            voice = %request.voice,
            rate = %request.rate,
            pitch = %request.pitch,
            "running edge-tts"
        );
        let output = self
            .command(request, media.path())
            .output()
            .await
            .with_context(|| format!("failed to launch {}", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "edge-tts exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        let audio = tokio::fs::read(media.path())
            .await
            .context("failed to read edge-tts output")?;
        if audio.is_empty() {
            return Err(anyhow!("edge-tts produced no audio"));
        }
        Ok(Bytes::from(audio))
    }
}
