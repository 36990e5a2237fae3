//! 进度投影：固定权重的前置阶段 + 按分段计算的音频阶段。

use async_trait::async_trait;
use serde::Serialize;

use crate::orchestrator::constants::DEFAULT_PROGRESS_ACCELERATION;

pub const AUDIO_PHASE_START: u8 = 30;
pub const AUDIO_PHASE_END: u8 = 100;
/// Highest value a segment may report, keeping room for the mixing checkpoints.
pub const AUDIO_SEGMENT_CEILING: u8 = 97;
pub const MIXING_CHECKPOINT: u8 = 98;
pub const FINALIZING_CHECKPOINT: u8 = 99;
pub const COMPLETE: u8 = 100;

const SEGMENT_MESSAGES: [&str; 4] = [
    "Recording {host}'s voice...",
    "Synthesizing audio for {host}...",
    "Bringing {host}'s words to life...",
    "Crafting {host}'s dialogue...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage<'a> {
    Initializing,
    FetchingContent,
    AnalyzingContent,
    PreparingScript,
    GeneratingScript,
    ScriptReady { segments: usize },
    Evaluating,
    StartingAudio,
    AudioSetup,
    SegmentStarted { index: usize, total: usize, host: &'a str },
    SegmentFinished { index: usize, total: usize, host: &'a str },
    Mixing,
    Finalizing,
    Ready,
}

/// Receives stage transitions from a running job.
#[async_trait]
pub trait ProgressSink: Send {
    async fn report(&mut self, stage: ProgressStage<'_>);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ProgressProjector {
    acceleration: f64,
    last: u8,
}

impl Default for ProgressProjector {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_ACCELERATION)
    }
}

impl ProgressProjector {
    pub fn new(acceleration: f64) -> Self {
        let acceleration = if acceleration.is_finite() && acceleration >= 1.0 {
            acceleration
        } else {
            DEFAULT_PROGRESS_ACCELERATION
        };
        Self {
            acceleration,
            last: 0,
        }
    }

    pub fn last(&self) -> u8 {
        self.last
    }

    /// Projects `stage` onto 0..=100. The result never drops below the previous call's.
    pub fn project(&mut self, stage: ProgressStage<'_>) -> ProgressUpdate {
        let (raw, message) = match stage {
            ProgressStage::Initializing => (0, "Initializing podcast generation...".to_string()),
            ProgressStage::FetchingContent => (2, "Researching topic on Wikipedia...".to_string()),
            ProgressStage::AnalyzingContent => (8, "Analyzing Wikipedia content...".to_string()),
            ProgressStage::PreparingScript => (12, "Preparing script generation...".to_string()),
            ProgressStage::GeneratingScript => {
                (15, "Crafting Hinglish dialogue with AI...".to_string())
            }
            ProgressStage::ScriptReady { segments } => (
                25,
                format!("Script ready! Generated {segments} dialogue segments."),
            ),
            ProgressStage::Evaluating => {
                (27, "Evaluating script quality with LLM critic...".to_string())
            }
            ProgressStage::StartingAudio => (AUDIO_PHASE_START, "Starting audio synthesis...".to_string()),
            ProgressStage::AudioSetup => (AUDIO_PHASE_START, "Setting up audio synthesis...".to_string()),
            ProgressStage::SegmentStarted { index, total, host } => (
                self.audio_percent(index, total),
                SEGMENT_MESSAGES[index % SEGMENT_MESSAGES.len()].replace("{host}", host),
            ),
            ProgressStage::SegmentFinished { index, total, host } => (
                self.audio_percent(index + 1, total),
                format!("{host}'s segment is ready!"),
            ),
            ProgressStage::Mixing => (MIXING_CHECKPOINT, "Mixing final audio...".to_string()),
            ProgressStage::Finalizing => (FINALIZING_CHECKPOINT, "Finalizing podcast...".to_string()),
            ProgressStage::Ready => (COMPLETE, "Podcast ready!".to_string()),
        };

        let percent = raw.max(self.last).min(COMPLETE);
        self.last = percent;
        ProgressUpdate { percent, message }
    }

    fn audio_percent(&self, completed: usize, total: usize) -> u8 {
        if total == 0 {
            return AUDIO_SEGMENT_CEILING;
        }
        let ratio = completed.min(total) as f64 / total as f64;
        let accelerated = (ratio * self.acceleration).min(1.0);
        let span = f64::from(AUDIO_PHASE_END - AUDIO_PHASE_START);
        // Nudge past float error so 0.5 * 1.4 lands on 0.7 and not just below it.
        let projected = AUDIO_PHASE_START + (accelerated * span + 1e-9).floor() as u8;
        projected.min(AUDIO_SEGMENT_CEILING)
    }
}
