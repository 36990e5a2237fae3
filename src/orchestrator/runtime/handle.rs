use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use crate::orchestrator::types::JobRecord;

use super::registry::JobRegistry;

/// Handle to a running job. Dropping it leaves the job running.
pub struct JobHandle {
    id: Uuid,
    registry: JobRegistry,
    worker: JoinHandle<()>,
}

impl JobHandle {
    pub(super) fn new(id: Uuid, registry: JobRegistry, worker: JoinHandle<()>) -> Self {
        Self {
            id,
            registry,
            worker,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Waits for the worker and returns the final record.
    pub async fn wait(self) -> Option<JobRecord> {
        if let Err(err) = self.worker.await {
            warn!(
                target: "pipeline_worker",
                job_id = %self.id,
                %err,
                "job worker terminated abnormally"
            );
        }
        self.registry.snapshot(self.id).await
    }
}
