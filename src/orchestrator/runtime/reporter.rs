use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::job::lifecycle::JobLifecycleUpdate;
use crate::progress::{ProgressProjector, ProgressSink, ProgressStage};
use crate::telemetry::events::{record_job_progress, record_job_transition};

use super::registry::{JobRegistry, RecordChange};

/// Projects stages for one job and writes them through to the registry.
#[derive(Clone)]
pub(crate) struct JobReporter {
    job_id: Uuid,
    registry: JobRegistry,
    projector: ProgressProjector,
    lifecycle: broadcast::Sender<JobLifecycleUpdate>,
}

impl JobReporter {
    pub(crate) fn new(
        job_id: Uuid,
        registry: JobRegistry,
        projector: ProgressProjector,
        lifecycle: broadcast::Sender<JobLifecycleUpdate>,
    ) -> Self {
        Self {
            job_id,
            registry,
            projector,
            lifecycle,
        }
    }

    pub(crate) fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Logs a status change if there was one and broadcasts the new snapshot.
    pub(crate) fn publish(&self, change: &RecordChange) {
        if change.status_changed() {
            record_job_transition(
                self.job_id,
                change.previous,
                change.record.status,
                &change.record.message,
            );
        }
        // No subscribers is not an error.
        if self
            .lifecycle
            .send(JobLifecycleUpdate::from_record(&change.record))
            .is_err()
        {
            debug!(
                target: "pipeline_worker",
                job_id = %self.job_id,
                "no lifecycle subscribers"
            );
        }
    }
}

#[async_trait]
impl ProgressSink for JobReporter {
    async fn report(&mut self, stage: ProgressStage<'_>) {
        let update = self.projector.project(stage);
        if let Some(change) = self.registry.apply_progress(self.job_id, &update).await {
            record_job_progress(self.job_id, change.record.progress, &change.record.message);
            self.publish(&change);
        }
    }
}
