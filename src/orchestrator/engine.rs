use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::job::lifecycle::JobLifecycleUpdate;
use crate::orchestrator::config::PipelineConfig;
use crate::orchestrator::constants::LIFECYCLE_CHANNEL_CAPACITY;
use crate::orchestrator::runtime::{self, Collaborators, JobHandle, JobRegistry};
use crate::orchestrator::traits::{
    ContentProvider, PromptDrafter, ScriptCritic, ScriptGenerator, SpeechSynthesizer,
};
use crate::orchestrator::types::JobRecord;
use crate::synthesis::{ArtifactError, ArtifactStore};

pub struct PodcastOrchestrator {
    config: Arc<PipelineConfig>,
    collaborators: Arc<Collaborators>,
    artifacts: ArtifactStore,
    registry: JobRegistry,
    lifecycle: broadcast::Sender<JobLifecycleUpdate>,
}

impl PodcastOrchestrator {
    /// Builds the orchestrator with the networked collaborators.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        #[cfg(feature = "remote")]
        {
            let remote = crate::remote::RemoteConfig::from_env()?;
            let stack = crate::remote::RemoteStack::new(&remote, &config);
            return Ok(Self::with_components(
                config,
                stack.content,
                stack.generator,
                stack.critic,
                stack.synthesizer,
                Some(stack.drafter),
            ));
        }

        #[cfg(not(feature = "remote"))]
        {
            let _ = config;
            return Err(anyhow::anyhow!(
                "no collaborators available: build with the `remote` feature or use with_components"
            ));
        }
    }

    pub fn with_components(
        config: PipelineConfig,
        content: Arc<dyn ContentProvider>,
        generator: Arc<dyn ScriptGenerator>,
        critic: Arc<dyn ScriptCritic>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        drafter: Option<Arc<dyn PromptDrafter>>,
    ) -> Self {
        let artifacts = ArtifactStore::new(config.output_dir.clone(), config.collision_policy);
        let (lifecycle, _) = broadcast::channel(LIFECYCLE_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(config),
            collaborators: Arc::new(Collaborators {
                content,
                generator,
                critic,
                synthesizer,
                drafter,
            }),
            artifacts,
            registry: JobRegistry::new(),
            lifecycle,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Registers a pending job and starts its worker.
    pub async fn start_job(&self, topic: impl Into<String>) -> JobHandle {
        let topic = topic.into();
        let handle = runtime::spawn_job(
            topic.clone(),
            Arc::clone(&self.config),
            Arc::clone(&self.collaborators),
            self.artifacts.clone(),
            self.registry.clone(),
            self.lifecycle.clone(),
        )
        .await;
        info!(
            target: "podcast_orchestrator",
            job_id = %handle.id(),
            %topic,
            "job submitted"
        );
        handle
    }

    pub async fn job(&self, id: Uuid) -> Option<JobRecord> {
        self.registry.snapshot(id).await
    }

    pub async fn artifact_path(&self, filename: &str) -> Result<PathBuf, ArtifactError> {
        self.artifacts.resolve(filename).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobLifecycleUpdate> {
        self.lifecycle.subscribe()
    }
}
