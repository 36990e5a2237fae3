//! 音频合成阶段：逐句生成语音并按顺序拼接为单一产物。

pub mod artifact;

use std::path::Path;

use rand::Rng;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::orchestrator::config::PipelineConfig;
use crate::orchestrator::constants::ARTIFACT_EXTENSION;
use crate::orchestrator::error::PipelineError;
use crate::orchestrator::traits::{SpeechSynthesizer, SynthesisRequest};
use crate::orchestrator::types::ScriptSequence;
use crate::progress::{ProgressSink, ProgressStage};
use crate::prosody::ProsodyGenerator;

pub use artifact::{artifact_filename, ArtifactError, ArtifactReservation, ArtifactStore};

/// Synthesizes every line in order and installs the concatenated audio at
/// `destination`. Returns the number of bytes written.
///
/// Segments and the concatenated output are staged in a job-scoped scratch
/// directory next to the destination. The destination is only replaced by a
/// rename once every segment succeeded, so a failed run leaves any existing
/// file at `destination` untouched.
pub async fn render_script<R: Rng + Send>(
    script: &ScriptSequence,
    synthesizer: &dyn SpeechSynthesizer,
    prosody: &mut ProsodyGenerator<R>,
    config: &PipelineConfig,
    destination: &Path,
    sink: &mut dyn ProgressSink,
) -> Result<u64, PipelineError> {
    sink.report(ProgressStage::AudioSetup).await;

    let parent = destination
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let scratch = tempfile::Builder::new()
        .prefix(".segments-")
        .tempdir_in(parent)
        .map_err(ArtifactError::io(parent))?;
    let staged = scratch.path().join(format!("combined.{ARTIFACT_EXTENSION}"));

    let written = match render_segments(
        script,
        synthesizer,
        prosody,
        config,
        scratch.path(),
        &staged,
        sink,
    )
    .await
    {
        Ok(written) => written,
        Err(err) => {
            warn!(
                target: "synthesis",
                path = %destination.display(),
                %err,
                "discarding staged audio"
            );
            return Err(err);
        }
    };

    tokio::fs::rename(&staged, destination)
        .await
        .map_err(ArtifactError::io(destination))?;

    sink.report(ProgressStage::Finalizing).await;
    info!(
        target: "synthesis",
        segments = script.len(),
        bytes = written,
        path = %destination.display(),
        "audio artifact written"
    );

    Ok(written)
}

async fn render_segments<R: Rng + Send>(
    script: &ScriptSequence,
    synthesizer: &dyn SpeechSynthesizer,
    prosody: &mut ProsodyGenerator<R>,
    config: &PipelineConfig,
    scratch: &Path,
    staged: &Path,
    sink: &mut dyn ProgressSink,
) -> Result<u64, PipelineError> {
    let mut output = tokio::fs::File::create(staged)
        .await
        .map_err(ArtifactError::io(staged))?;

    let total = script.len();
    let mut written = 0_u64;

    for (index, line) in script.iter().enumerate() {
        let profile = config.profile(line.speaker);
        sink.report(ProgressStage::SegmentStarted {
            index,
            total,
            host: &profile.name,
        })
        .await;

        let params = prosody.generate(line);
        let request = SynthesisRequest {
            text: params.spoken_text.clone(),
            voice: profile.voice.clone(),
            rate: params.rate_arg(),
            pitch: params.pitch_arg(),
        };
        debug!(
            target: "synthesis",
            segment = index,
            speaker = line.speaker.as_str(),
            rate = %request.rate,
            pitch = %request.pitch,
            "synthesizing segment"
        );

        let audio = synthesizer
            .synthesize(&request)
            .await
            .map_err(|reason| PipelineError::Synthesis {
                segment: index + 1,
                reason,
            })?;

        let segment_path = scratch.join(format!("seg_{index}.{ARTIFACT_EXTENSION}"));
        tokio::fs::write(&segment_path, &audio)
            .await
            .map_err(ArtifactError::io(&segment_path))?;
        let segment = tokio::fs::read(&segment_path)
            .await
            .map_err(ArtifactError::io(&segment_path))?;
        output
            .write_all(&segment)
            .await
            .map_err(ArtifactError::io(staged))?;
        written += segment.len() as u64;

        if let Err(err) = tokio::fs::remove_file(&segment_path).await {
            warn!(
                target: "synthesis",
                path = %segment_path.display(),
                %err,
                "failed to remove segment file"
            );
        }

        sink.report(ProgressStage::SegmentFinished {
            index,
            total,
            host: &profile.name,
        })
        .await;
    }

    sink.report(ProgressStage::Mixing).await;
    output.flush().await.map_err(ArtifactError::io(staged))?;
    output.sync_all().await.map_err(ArtifactError::io(staged))?;

    Ok(written)
}
