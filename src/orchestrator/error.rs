use thiserror::Error;

use crate::script::ScriptError;
use crate::synthesis::ArtifactError;

/// Errors surfaced by a topic content provider.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Carries the user-facing message verbatim.
    #[error("{0}")]
    TopicNotFound(String),
    #[error("failed to fetch content for '{topic}': {reason:#}")]
    Unavailable { topic: String, reason: anyhow::Error },
}

/// Job-fatal failures. Evaluation and improvement-prompt failures never show
/// up here; they are recorded as data on the job instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    TopicNotFound(String),
    #[error("Failed to fetch content for '{topic}': {reason:#}")]
    ContentUnavailable { topic: String, reason: anyhow::Error },
    #[error("Failed to generate script from LLM: {0:#}")]
    ScriptGeneration(anyhow::Error),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Audio synthesis failed at segment {segment}: {reason:#}")]
    Synthesis { segment: usize, reason: anyhow::Error },
    #[error("Audio output '{0}' missing after synthesis")]
    MissingArtifact(String),
    #[error("Pipeline worker stopped unexpectedly: {0}")]
    WorkerAborted(String),
}

impl From<ContentError> for PipelineError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::TopicNotFound(message) => PipelineError::TopicNotFound(message),
            ContentError::Unavailable { topic, reason } => {
                PipelineError::ContentUnavailable { topic, reason }
            }
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::TopicNotFound(_) => "topic_not_found",
            PipelineError::ContentUnavailable { .. } => "content_unavailable",
            PipelineError::ScriptGeneration(_) | PipelineError::Script(_) => "empty_script",
            PipelineError::Artifact(_) => "artifact",
            PipelineError::Synthesis { .. } => "synthesis_failure",
            PipelineError::MissingArtifact(_) => "missing_artifact",
            PipelineError::WorkerAborted(_) => "worker_aborted",
        }
    }

    /// Message stored on the failed job.
    pub fn job_message(&self) -> String {
        match self {
            PipelineError::TopicNotFound(message) => message.clone(),
            other => format!("Error: {other}"),
        }
    }
}
