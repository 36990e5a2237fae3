use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::orchestrator::types::{ImprovementPrompt, JobRecord, JobStatus};
use crate::progress::ProgressUpdate;
use crate::scoring::EvaluationResult;

/// Process-lifetime job table. Each record has its own lock; only the job's
/// worker writes it, pollers only clone it out.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, Arc<RwLock<JobRecord>>>>>,
}

/// Result of a registry write: the status before the write and the record after it.
#[derive(Debug, Clone)]
pub(crate) struct RecordChange {
    pub previous: JobStatus,
    pub record: JobRecord,
}

impl RecordChange {
    pub(crate) fn status_changed(&self) -> bool {
        self.previous != self.record.status
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn insert(&self, record: JobRecord) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(record.id, Arc::new(RwLock::new(record)));
    }

    pub async fn snapshot(&self, id: Uuid) -> Option<JobRecord> {
        let entry = {
            let jobs = self.jobs.read().await;
            jobs.get(&id).cloned()
        }?;
        let record = entry.read().await;
        Some(record.clone())
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Moves a pending job to processing and raises its progress. Progress
    /// never decreases and terminal records are left untouched.
    pub(crate) async fn apply_progress(
        &self,
        id: Uuid,
        update: &ProgressUpdate,
    ) -> Option<RecordChange> {
        self.update(id, |record| {
            if record.status == JobStatus::Pending {
                record.status = JobStatus::Processing;
            }
            record.progress = record.progress.max(update.percent);
            record.message = update.message.clone();
        })
        .await
    }

    pub(crate) async fn attach_evaluation(
        &self,
        id: Uuid,
        evaluation: EvaluationResult,
    ) -> Option<RecordChange> {
        self.update(id, move |record| {
            record.evaluation = Some(evaluation);
        })
        .await
    }

    pub(crate) async fn complete(&self, id: Uuid, filename: String) -> Option<RecordChange> {
        self.update(id, move |record| {
            record.status = JobStatus::Completed;
            record.progress = 100;
            record.filename = Some(filename);
        })
        .await
    }

    pub(crate) async fn fail(&self, id: Uuid, message: String) -> Option<RecordChange> {
        self.update(id, move |record| {
            record.status = JobStatus::Failed;
            record.message = message;
        })
        .await
    }

    /// Only a completed job can carry an improvement prompt; the status is kept.
    pub(crate) async fn attach_improvement_prompt(
        &self,
        id: Uuid,
        prompt: ImprovementPrompt,
    ) -> Option<RecordChange> {
        let entry = self.entry(id).await?;
        let mut record = entry.write().await;
        if record.status != JobStatus::Completed {
            return None;
        }
        record.improvement_prompt = Some(prompt);
        Some(RecordChange {
            previous: record.status,
            record: record.clone(),
        })
    }

    async fn entry(&self, id: Uuid) -> Option<Arc<RwLock<JobRecord>>> {
        let jobs = self.jobs.read().await;
        jobs.get(&id).cloned()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Option<RecordChange>
    where
        F: FnOnce(&mut JobRecord),
    {
        let entry = self.entry(id).await?;
        let mut record = entry.write().await;
        if record.status.is_terminal() {
            return None;
        }
        let previous = record.status;
        apply(&mut *record);
        Some(RecordChange {
            previous,
            record: record.clone(),
        })
    }
}
