use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{status_error, transport_error, Provider};
use crate::errors::TourError;
use crate::wire::Completion;

pub struct Anthropic {
    pub model: String,
    pub api_key: String,
    pub api_base: String,
    pub api_version: String,
    client: Client,
}

impl Anthropic {
    pub fn new(
        model: String,
        api_key: String,
        api_base: String,
        api_version: String,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            model,
            api_key,
            api_base,
            api_version,
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Msg<'a>>,
    system: &'a str,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

#[async_trait]
impl Provider for Anthropic {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, req: &Completion) -> Result<String, TourError> {
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let body = MsgRequest {
            model: &self.model,
            max_tokens: req.max_tokens,
            // Anthropic caps temperature at 1.0.
            temperature: req.temperature.min(1.0),
            messages: vec![Msg { role: "user", content: &req.prompt.user }],
            system: &req.prompt.system,
        };

        tracing::debug!(%url, model = %self.model, "anthropic: POST messages");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("anthropic", e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| transport_error("anthropic", e))?;
        if !status.is_success() {
            return Err(status_error("anthropic", status, &text));
        }

        let parsed: MsgResponse = serde_json::from_str(&text)
            .map_err(|e| TourError::Provider(format!("anthropic response parse error: {e}")))?;

        let content: String = parsed
            .content
            .into_iter()
            .filter(|b| b.r#type == "text" || !b.text.is_empty())
            .map(|b| b.text)
            .collect();
        if content.is_empty() {
            return Err(TourError::Provider("anthropic: empty content".into()));
        }
        Ok(content)
    }
}
