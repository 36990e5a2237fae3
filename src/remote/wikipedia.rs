//! 维基百科内容获取与标题联想。

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::orchestrator::error::ContentError;
use crate::orchestrator::traits::ContentProvider;

pub const CONTENT_CHAR_LIMIT: usize = 4000;
pub const SUGGESTION_LIMIT: usize = 7;
pub const MIN_SUGGEST_QUERY_CHARS: usize = 2;

pub struct WikipediaClient {
    agent: ureq::Agent,
    user_agent: String,
}

impl WikipediaClient {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            user_agent: user_agent.into(),
        }
    }

    fn api_url(lang: &str) -> Option<String> {
        let valid = !lang.is_empty()
            && lang
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-');
        valid.then(|| format!("https://{lang}.wikipedia.org/w/api.php"))
    }

    async fn get_json(&self, url: String, query: Vec<(&'static str, String)>) -> anyhow::Result<Value> {
        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<Value> {
            let mut request = agent.get(&url).set("User-Agent", &user_agent);
            for (key, value) in &query {
                request = request.query(key, value);
            }
            let response = request
                .call()
                .map_err(|err| anyhow!("wikipedia request failed: {err}"))?;
            response
                .into_json()
                .context("failed to decode wikipedia response")
        })
        .await
        .context("wikipedia task panicked")?
    }

    /// Up to seven article titles matching `query`. Never fails.
    pub async fn suggest(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.chars().count() < MIN_SUGGEST_QUERY_CHARS {
            return Vec::new();
        }
        let Some(url) = Self::api_url("en") else {
            return Vec::new();
        };

        let params = vec![
            ("action", "opensearch".to_string()),
            ("search", query.to_string()),
            ("limit", SUGGESTION_LIMIT.to_string()),
            ("namespace", "0".to_string()),
            ("format", "json".to_string()),
        ];
        match self.get_json(url, params).await {
            Ok(body) => parse_suggestions(&body),
            Err(err) => {
                warn!(target: "remote", %err, "wikipedia suggestions unavailable");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ContentProvider for WikipediaClient {
    async fn fetch(&self, topic: &str, lang: &str) -> Result<String, ContentError> {
        let unavailable = |reason: anyhow::Error| ContentError::Unavailable {
            topic: topic.to_string(),
            reason,
        };
        let url = Self::api_url(lang)
            .ok_or_else(|| unavailable(anyhow!("unsupported language code '{lang}'")))?;

        let params = vec![
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("titles", topic.to_string()),
            ("prop", "extracts".to_string()),
            ("explaintext", "1".to_string()),
        ];
        let body = self.get_json(url, params).await.map_err(unavailable)?;
        let content = frame_extract(topic, &body)?;
        info!(target: "remote", %topic, chars = content.chars().count(), "wikipedia content fetched");
        Ok(content)
    }
}

/// Turns a `prop=extracts` query response into the framed content block.
pub(crate) fn frame_extract(topic: &str, body: &Value) -> Result<String, ContentError> {
    let pages = body
        .pointer("/query/pages")
        .and_then(Value::as_object)
        .ok_or_else(|| ContentError::Unavailable {
            topic: topic.to_string(),
            reason: anyhow!("response has no pages"),
        })?;
    let (page_id, page) = pages.iter().next().ok_or_else(|| ContentError::Unavailable {
        topic: topic.to_string(),
        reason: anyhow!("response has no pages"),
    })?;

    if page_id == "-1" || page.get("missing").is_some() {
        return Err(ContentError::TopicNotFound(format!(
            "Topic not found: '{topic}' is not available on Wikipedia. Please try a different topic or check the spelling."
        )));
    }

    let title = page.get("title").and_then(Value::as_str).unwrap_or(topic);
    let text = page.get("extract").and_then(Value::as_str).unwrap_or("");
    if text.trim().is_empty() {
        return Err(ContentError::TopicNotFound(format!(
            "Topic not found: '{topic}' exists on Wikipedia but has no content. Please try a different topic."
        )));
    }

    let excerpt: String = text.chars().take(CONTENT_CHAR_LIMIT).collect();
    Ok(format!("Title: {title}\n\nContent:\n{excerpt}"))
}

/// Opensearch replies with `[query, [titles...], [descriptions...], [urls...]]`.
pub(crate) fn parse_suggestions(body: &Value) -> Vec<String> {
    body.get(1)
        .and_then(Value::as_array)
        .map(|titles| {
            titles
                .iter()
                .filter_map(Value::as_str)
                .take(SUGGESTION_LIMIT)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
