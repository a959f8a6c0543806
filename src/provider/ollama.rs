use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{status_error, transport_error, Provider};
use crate::errors::TourError;
use crate::wire::Completion;

/// Local Ollama server; no API key.
pub struct Ollama {
    pub model: String,
    pub url: String,
    client: Client,
}

impl Ollama {
    pub fn new(model: String, url: String, timeout: Duration) -> Result<Self> {
        Ok(Self { model, url, client: Client::builder().timeout(timeout).build()? })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: String,
}

#[async_trait]
impl Provider for Ollama {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, req: &Completion) -> Result<String, TourError> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Msg { role: "system", content: &req.prompt.system },
                Msg { role: "user", content: &req.prompt.user },
            ],
            stream: false,
            options: OllamaOptions { temperature: req.temperature, num_predict: req.max_tokens },
        };

        tracing::debug!(%url, model = %self.model, "ollama: POST chat");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("ollama", e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| transport_error("ollama", e))?;
        if !status.is_success() {
            return Err(status_error("ollama", status, &text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| TourError::Provider(format!("ollama response parse error: {e}")))?;
        Ok(parsed.message.content)
    }
}
