//! 对话脚本规整：解析 → 提取 → 截断 → 相邻去重。

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::orchestrator::config::PipelineConfig;
use crate::orchestrator::constants::{CANONICAL_DIALOGUE_FIELD, MAX_SEGMENTS};
use crate::orchestrator::types::{DialogueLine, ScriptSequence, Speaker};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to generate script: payload is not valid JSON ({0})")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("Failed to generate script: payload has no dialogue list")]
    MissingDialogue,
    #[error("Failed to generate script: dialogue is empty")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct RawLine {
    #[serde(default)]
    speaker: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScriptNormalizer {
    host_a_name: String,
    max_segments: usize,
}

impl Default for ScriptNormalizer {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl ScriptNormalizer {
    pub fn new(host_a_name: impl Into<String>, max_segments: usize) -> Self {
        Self {
            host_a_name: host_a_name.into().to_lowercase(),
            max_segments: max_segments.clamp(1, MAX_SEGMENTS),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.host_a.name.clone(), config.max_segments)
    }

    /// Turns a raw generator payload into a bounded, de-duplicated script.
    pub fn normalize(&self, payload: &str) -> Result<ScriptSequence, ScriptError> {
        let root: Value = serde_json::from_str(payload.trim())?;
        let entries = extract_dialogue(&root).ok_or(ScriptError::MissingDialogue)?;

        let mut lines: Vec<DialogueLine> = entries
            .iter()
            .filter_map(|entry| self.to_line(entry))
            .collect();

        if lines.is_empty() {
            return Err(ScriptError::Empty);
        }

        if lines.len() > self.max_segments {
            warn!(
                target: "script_normalizer",
                segments = lines.len(),
                limit = self.max_segments,
                "script exceeds segment limit, truncating"
            );
            lines.truncate(self.max_segments);
        }

        let lines = dedup_consecutive(lines);
        if lines.is_empty() {
            return Err(ScriptError::Empty);
        }

        Ok(ScriptSequence::from_normalized(lines))
    }

    fn to_line(&self, entry: &Value) -> Option<DialogueLine> {
        let raw: RawLine = serde_json::from_value(entry.clone()).ok()?;
        let text = raw.text?.trim().to_string();
        if text.is_empty() {
            return None;
        }
        let speaker = self.resolve_speaker(raw.speaker.as_deref().unwrap_or_default());
        Some(DialogueLine { speaker, text })
    }

    fn resolve_speaker(&self, raw: &str) -> Speaker {
        let lowered = raw.trim().to_lowercase();
        if lowered == Speaker::HostA.as_str()
            || (!self.host_a_name.is_empty() && lowered.contains(&self.host_a_name))
        {
            Speaker::HostA
        } else {
            Speaker::HostB
        }
    }
}

/// Canonical shape is `{"conversation": [...]}`; the only fallback is the first
/// list-valued field of the top-level object.
fn extract_dialogue(root: &Value) -> Option<&Vec<Value>> {
    let object = root.as_object()?;
    if let Some(Value::Array(list)) = object.get(CANONICAL_DIALOGUE_FIELD) {
        return Some(list);
    }
    object.values().find_map(Value::as_array)
}

fn dedup_consecutive(lines: Vec<DialogueLine>) -> Vec<DialogueLine> {
    let mut kept: Vec<DialogueLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if kept.last().map(|prev| prev.text == line.text).unwrap_or(false) {
            continue;
        }
        kept.push(line);
    }
    kept
}
