use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{status_error, transport_error};
use crate::errors::TourError;
use crate::wire::Completion;

/// OpenAI chat completions: system + user message, capped tokens, fixed temperature.
pub struct OpenAIProvider {
    model: String,
    api_key: String,
    api_base: String,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(model: String, api_key: String, api_base: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            model,
            api_key,
            api_base,
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

// Minimal structs to parse the chat response
#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[async_trait]
impl super::Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, req: &Completion) -> Result<String, TourError> {
        let url = format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": req.prompt.system },
                { "role": "user", "content": req.prompt.user }
            ],
            "max_tokens": req.max_tokens,
            "temperature": req.temperature
        });

        tracing::debug!(%url, model = %self.model, "openai: POST chat completion");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("openai", e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| transport_error("openai", e))?;
        tracing::debug!(%status, bytes = text.len(), "openai: raw response received");

        if !status.is_success() {
            return Err(status_error("openai", status, &text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            TourError::Provider(format!("failed to parse OpenAI response envelope: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TourError::Provider("OpenAI response contained no message content".into()))
    }
}
