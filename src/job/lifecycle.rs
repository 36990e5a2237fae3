//! 任务生命周期广播负载定义。

use std::time::SystemTime;

use uuid::Uuid;

use crate::orchestrator::types::{JobRecord, JobStatus};

/// 任务状态或进度变化时发布的事件。
#[derive(Debug, Clone)]
pub struct JobLifecycleUpdate {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub filename: Option<String>,
    pub issued_at: SystemTime,
}

impl JobLifecycleUpdate {
    /// 由任务快照构造事件。
    pub fn from_record(record: &JobRecord) -> Self {
        Self {
            job_id: record.id,
            status: record.status,
            progress: record.progress,
            message: record.message.clone(),
            filename: record.filename.clone(),
            issued_at: SystemTime::now(),
        }
    }

    /// 是否为终态事件。
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_the_record() {
        let mut record = JobRecord::pending(Uuid::new_v4(), "Chai");
        record.status = JobStatus::Completed;
        record.progress = 100;
        record.filename = Some("chai.mp3".into());

        let update = JobLifecycleUpdate::from_record(&record);
        assert_eq!(update.job_id, record.id);
        assert_eq!(update.progress, 100);
        assert_eq!(update.filename.as_deref(), Some("chai.mp3"));
        assert!(update.is_terminal());
    }
}
