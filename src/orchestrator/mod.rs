//! 播客生成流水线编排：协作方接口、配置、错误分类与任务运行时。

pub(crate) mod constants;
mod engine;
mod runtime;

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{CollisionPolicy, HostProfile, PipelineConfig};
pub use engine::PodcastOrchestrator;
pub use error::{ContentError, PipelineError};
pub use runtime::{JobHandle, JobRegistry};
pub use traits::{
    ContentProvider, PromptDrafter, ScriptCritic, ScriptGenerator, SpeechSynthesizer,
    SynthesisRequest,
};
pub use types::{DialogueLine, ImprovementPrompt, JobRecord, JobStatus, ScriptSequence, Speaker};

#[cfg(test)]
mod tests;
