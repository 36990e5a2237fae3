use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::EvaluationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    HostA,
    HostB,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::HostA => "host_a",
            Speaker::HostB => "host_b",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: Speaker,
    pub text: String,
}

impl DialogueLine {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A normalized, non-empty script. Only the script normalizer constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptSequence {
    lines: Vec<DialogueLine>,
}

impl ScriptSequence {
    pub(crate) fn from_normalized(lines: Vec<DialogueLine>) -> Self {
        debug_assert!(!lines.is_empty());
        Self { lines }
    }

    pub fn lines(&self) -> &[DialogueLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DialogueLine> {
        self.lines.iter()
    }
}

impl<'a> IntoIterator for &'a ScriptSequence {
    type Item = &'a DialogueLine;
    type IntoIter = std::slice::Iter<'a, DialogueLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementPrompt {
    pub prompt: Option<String>,
    pub model_used: Option<String>,
    pub based_on_score: f64,
    pub error: Option<String>,
}

/// Poll-facing view of a job. Cloned out of the registry on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub status: JobStatus,
    pub topic: String,
    pub progress: u8,
    pub message: String,
    pub filename: Option<String>,
    pub evaluation: Option<EvaluationResult>,
    pub improvement_prompt: Option<ImprovementPrompt>,
}

impl JobRecord {
    pub fn pending(id: Uuid, topic: impl Into<String>) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            topic: topic.into(),
            progress: 0,
            message: "Queued".to_string(),
            filename: None,
            evaluation: None,
            improvement_prompt: None,
        }
    }
}
