//! 联网协作方：维基百科、OpenAI 兼容对话接口与 edge-tts。

pub mod chat;
pub mod edge_tts;
pub mod prompts;
pub mod wikipedia;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::orchestrator::config::PipelineConfig;
use crate::orchestrator::traits::{
    ContentProvider, PromptDrafter, ScriptCritic, ScriptGenerator, SpeechSynthesizer,
};

pub use chat::{ChatClient, GroqPromptDrafter, GroqScriptCritic, GroqScriptGenerator};
pub use edge_tts::EdgeTtsSynthesizer;
pub use wikipedia::WikipediaClient;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_SCRIPT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_CRITIC_MODEL: &str = "qwen/qwen3-32b";
pub const DEFAULT_DRAFTER_MODEL: &str = "openai/gpt-oss-120b";
pub const DEFAULT_EDGE_TTS_BIN: &str = "edge-tts";
pub const USER_AGENT: &str = "RadioHost/0.1 (radiohost-core)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub api_key: String,
    pub base_url: String,
    pub script_model: String,
    pub critic_model: String,
    pub drafter_model: String,
    pub edge_tts_bin: PathBuf,
}

impl RemoteConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = get("GROQ_API_KEY")
            .ok_or_else(|| anyhow!("GROQ_API_KEY is not set"))?;

        Ok(Self {
            api_key,
            base_url: get("RADIOHOST_LLM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            script_model: get("RADIOHOST_SCRIPT_MODEL")
                .unwrap_or_else(|| DEFAULT_SCRIPT_MODEL.to_string()),
            critic_model: get("RADIOHOST_CRITIC_MODEL")
                .unwrap_or_else(|| DEFAULT_CRITIC_MODEL.to_string()),
            drafter_model: get("RADIOHOST_DRAFTER_MODEL")
                .unwrap_or_else(|| DEFAULT_DRAFTER_MODEL.to_string()),
            edge_tts_bin: get("RADIOHOST_EDGE_TTS_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EDGE_TTS_BIN)),
        })
    }
}

/// The full set of networked collaborators for one orchestrator.
pub struct RemoteStack {
    pub content: Arc<dyn ContentProvider>,
    pub generator: Arc<dyn ScriptGenerator>,
    pub critic: Arc<dyn ScriptCritic>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub drafter: Arc<dyn PromptDrafter>,
}

impl RemoteStack {
    pub fn new(remote: &RemoteConfig, pipeline: &PipelineConfig) -> Self {
        let client = Arc::new(ChatClient::new(&remote.base_url, remote.api_key.clone()));
        Self {
            content: Arc::new(WikipediaClient::new(USER_AGENT)),
            generator: Arc::new(GroqScriptGenerator::new(
                Arc::clone(&client),
                remote.script_model.clone(),
            )),
            critic: Arc::new(GroqScriptCritic::new(
                Arc::clone(&client),
                remote.critic_model.clone(),
                pipeline.host_a.name.clone(),
                pipeline.host_b.name.clone(),
            )),
            synthesizer: Arc::new(EdgeTtsSynthesizer::new(remote.edge_tts_bin.clone())),
            drafter: Arc::new(GroqPromptDrafter::new(client, remote.drafter_model.clone())),
        }
    }
}
