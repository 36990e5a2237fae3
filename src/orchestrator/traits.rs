use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::orchestrator::error::ContentError;
use crate::orchestrator::types::ScriptSequence;
use crate::scoring::EvaluationResult;

#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn fetch(&self, topic: &str, lang: &str) -> Result<String, ContentError>;
}

#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Returns the raw, unvalidated payload produced for `content`.
    async fn generate(&self, content: &str) -> Result<String>;
}

#[async_trait]
pub trait ScriptCritic: Send + Sync {
    async fn evaluate(&self, script: &ScriptSequence) -> Result<String>;

    fn model_name(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
    pub rate: String,
    pub pitch: String,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes>;
}

#[async_trait]
pub trait PromptDrafter: Send + Sync {
    async fn draft(&self, evaluation: &EvaluationResult) -> Result<String>;

    fn model_name(&self) -> Option<String> {
        None
    }
}
