mod handle;
mod registry;
mod reporter;
mod worker;

pub use handle::JobHandle;
pub use registry::JobRegistry;

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::job::lifecycle::JobLifecycleUpdate;
use crate::orchestrator::config::PipelineConfig;
use crate::orchestrator::traits::{
    ContentProvider, PromptDrafter, ScriptCritic, ScriptGenerator, SpeechSynthesizer,
};
use crate::orchestrator::types::JobRecord;
use crate::progress::ProgressProjector;
use crate::synthesis::ArtifactStore;

use self::reporter::JobReporter;
use self::worker::PipelineWorker;

/// External collaborators shared by every job.
pub(crate) struct Collaborators {
    pub content: Arc<dyn ContentProvider>,
    pub generator: Arc<dyn ScriptGenerator>,
    pub critic: Arc<dyn ScriptCritic>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub drafter: Option<Arc<dyn PromptDrafter>>,
}

pub(crate) async fn spawn_job(
    topic: String,
    config: Arc<PipelineConfig>,
    collaborators: Arc<Collaborators>,
    artifacts: ArtifactStore,
    registry: JobRegistry,
    lifecycle: broadcast::Sender<JobLifecycleUpdate>,
) -> JobHandle {
    let job_id = Uuid::new_v4();
    let record = JobRecord::pending(job_id, topic.clone());
    let _ = lifecycle.send(JobLifecycleUpdate::from_record(&record));
    registry.insert(record).await;

    let reporter = JobReporter::new(
        job_id,
        registry.clone(),
        ProgressProjector::new(config.progress_acceleration),
        lifecycle,
    );
    let worker = PipelineWorker::new(job_id, topic, config, collaborators, artifacts, reporter);
    let worker_handle = worker.spawn();

    JobHandle::new(job_id, registry, worker_handle)
}
