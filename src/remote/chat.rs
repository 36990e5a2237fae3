//! OpenAI 兼容的 chat-completions 客户端，以及基于它的脚本生成、评审与提示词起草。

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::orchestrator::traits::{PromptDrafter, ScriptCritic, ScriptGenerator};
use crate::orchestrator::types::ScriptSequence;
use crate::scoring::EvaluationResult;

use super::prompts;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.7,
            max_tokens: 1024,
            response_format: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Asks the provider for a JSON object reply.
    pub fn json(mut self) -> Self {
        self.response_format = Some(ResponseFormat {
            kind: "json_object",
        });
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

fn first_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("chat completion returned no content"))
}

pub struct ChatClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
}

impl ChatClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        }
    }

    pub async fn complete(&self, request: ChatRequest) -> Result<String> {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        let authorization = format!("Bearer {}", self.api_key);
        let model = request.model.clone();

        debug!(target: "remote", %model, "sending chat completion");
        let response: ChatResponse = tokio::task::spawn_blocking(move || -> Result<ChatResponse> {
            let response = agent
                .post(&endpoint)
                .set("Authorization", &authorization)
                .send_json(&request)
                .map_err(|err| anyhow!("chat completion request failed: {err}"))?;
            response
                .into_json()
                .context("failed to decode chat completion response")
        })
        .await
        .context("chat completion task panicked")??;

        first_content(response)
    }
}

pub struct GroqScriptGenerator {
    client: Arc<ChatClient>,
    model: String,
}

impl GroqScriptGenerator {
    pub fn new(client: Arc<ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ScriptGenerator for GroqScriptGenerator {
    async fn generate(&self, content: &str) -> Result<String> {
        let request = ChatRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(prompts::SCRIPT_SYSTEM_PROMPT),
                ChatMessage::user(prompts::script_user_prompt(content)),
            ],
        )
        .temperature(0.8)
        .max_tokens(2500)
        .json();
        let payload = self.client.complete(request).await?;
        info!(target: "remote", model = %self.model, bytes = payload.len(), "script generated");
        Ok(payload)
    }
}

pub struct GroqScriptCritic {
    client: Arc<ChatClient>,
    model: String,
    host_a: String,
    host_b: String,
}

impl GroqScriptCritic {
    pub fn new(
        client: Arc<ChatClient>,
        model: impl Into<String>,
        host_a: impl Into<String>,
        host_b: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            host_a: host_a.into(),
            host_b: host_b.into(),
        }
    }
}

#[async_trait]
impl ScriptCritic for GroqScriptCritic {
    async fn evaluate(&self, script: &ScriptSequence) -> Result<String> {
        let request = ChatRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(prompts::CRITIC_SYSTEM_PROMPT),
                ChatMessage::user(prompts::critic_user_prompt(
                    script,
                    &self.host_a,
                    &self.host_b,
                )),
            ],
        )
        .temperature(0.3)
        .max_tokens(2000)
        .json();
        self.client.complete(request).await
    }

    fn model_name(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

pub struct GroqPromptDrafter {
    client: Arc<ChatClient>,
    model: String,
}

impl GroqPromptDrafter {
    pub fn new(client: Arc<ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl PromptDrafter for GroqPromptDrafter {
    async fn draft(&self, evaluation: &EvaluationResult) -> Result<String> {
        let request = ChatRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(prompts::DRAFTER_SYSTEM_PROMPT),
                ChatMessage::user(prompts::improvement_user_prompt(evaluation)),
            ],
        )
        .temperature(0.6)
        .max_tokens(4000);
        let reply = self.client.complete(request).await?;
        Ok(prompts::strip_think_blocks(&reply))
    }

    fn model_name(&self) -> Option<String> {
        Some(self.model.clone())
    }
}
