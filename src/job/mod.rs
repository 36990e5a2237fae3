//! 面向调用方的任务接口：提交、轮询、产物下载与生命周期订阅。

pub mod lifecycle;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::orchestrator::{JobHandle, JobRecord, JobStatus, PipelineConfig, PodcastOrchestrator};
use crate::synthesis::ArtifactError;

pub use lifecycle::JobLifecycleUpdate;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("job {0} not found")]
    UnknownJob(Uuid),
    #[error("job {id} is {status}, not completed")]
    NotCompleted { id: Uuid, status: &'static str },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Cheap to clone; every clone shares the same registry and output directory.
#[derive(Clone)]
pub struct JobManager {
    orchestrator: Arc<PodcastOrchestrator>,
}

impl JobManager {
    pub fn new(orchestrator: PodcastOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Builds a manager backed by the networked collaborators.
    pub fn from_config(config: PipelineConfig) -> anyhow::Result<Self> {
        Ok(Self::new(PodcastOrchestrator::new(config)?))
    }

    pub fn orchestrator(&self) -> &PodcastOrchestrator {
        &self.orchestrator
    }

    pub async fn submit(&self, topic: &str) -> Result<JobHandle, JobError> {
        let topic = topic.trim();
        if topic.is_empty() {
            warn!(target: "job_manager", "rejected empty topic");
            return Err(JobError::EmptyTopic);
        }
        let handle = self.orchestrator.start_job(topic).await;
        info!(target: "job_manager", job_id = %handle.id(), "job accepted");
        Ok(handle)
    }

    /// Current snapshot of a job. Never mutates anything.
    pub async fn status(&self, id: Uuid) -> Result<JobRecord, JobError> {
        self.orchestrator
            .job(id)
            .await
            .ok_or(JobError::UnknownJob(id))
    }

    /// Download path for a completed job's artifact.
    pub async fn job_artifact(&self, id: Uuid) -> Result<PathBuf, JobError> {
        let record = self.status(id).await?;
        match (record.status, record.filename) {
            (JobStatus::Completed, Some(filename)) => self.artifact_path(&filename).await,
            (status, _) => Err(JobError::NotCompleted {
                id,
                status: status.as_str(),
            }),
        }
    }

    pub async fn artifact_path(&self, filename: &str) -> Result<PathBuf, JobError> {
        Ok(self.orchestrator.artifact_path(filename).await?)
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<JobLifecycleUpdate> {
        self.orchestrator.subscribe()
    }
}
