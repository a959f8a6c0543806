use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::TourError;
use crate::wire::Completion;

pub mod openai;
pub mod anthropic;
pub mod ollama;

/// An opaque text-completion service. Implementations return the model's text
/// untouched; shaping it into stops is the normalizer's job.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// One attempt, no retry. Transport failures, non-2xx statuses and
    /// unexpected envelopes all surface as `TourError::Provider`.
    async fn complete(&self, req: &Completion) -> Result<String, TourError>;
}

pub type DynProvider = Arc<dyn Provider>;

pub fn make_provider(cfg: &Config) -> Result<DynProvider> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    match cfg.provider {
        ProviderKind::OpenAI => {
            let key = cfg
                .openai_api_key
                .clone()
                .ok_or_else(|| anyhow!("OPENAI_API_KEY env var is not set"))?;
            Ok(Arc::new(openai::OpenAIProvider::new(
                cfg.model.clone(),
                key,
                cfg.openai_base.clone(),
                timeout,
            )?))
        }
        ProviderKind::Anthropic => {
            let key = cfg
                .anthropic_api_key
                .clone()
                .ok_or_else(|| anyhow!("ANTHROPIC_API_KEY env var is not set"))?;
            Ok(Arc::new(anthropic::Anthropic::new(
                cfg.model.clone(),
                key,
                cfg.anthropic_base.clone(),
                cfg.anthropic_version.clone(),
                timeout,
            )?))
        }
        ProviderKind::Ollama => Ok(Arc::new(ollama::Ollama::new(
            cfg.model.clone(),
            cfg.ollama_url.clone(),
            timeout,
        )?)),
    }
}

/// Error text for a failed HTTP exchange, keeping the provider's own message.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> TourError {
    if err.is_timeout() {
        TourError::Provider(format!("{provider} request timed out: {err}"))
    } else {
        TourError::Provider(format!("{provider} request failed: {err}"))
    }
}

/// Pulls `error.message` out of a provider error body when there is one.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> TourError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str().map(String::from))
        })
        .unwrap_or_else(|| body.trim().to_string());
    TourError::Provider(format!("{provider} API error ({status}): {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_structured_message() {
        let err = status_error(
            "openai",
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        );
        assert_eq!(
            err,
            TourError::Provider("openai API error (401 Unauthorized): Incorrect API key provided".into())
        );

        let err = status_error("ollama", reqwest::StatusCode::NOT_FOUND, r#"{"error":"model 'x' not found"}"#);
        assert!(err.to_string().contains("model 'x' not found"));

        let err = status_error("anthropic", reqwest::StatusCode::BAD_GATEWAY, "upstream down\n");
        assert!(err.to_string().ends_with("upstream down"));
    }

    #[test]
    fn make_provider_picks_the_configured_kind() {
        let cfg = Config { provider: ProviderKind::Ollama, model: "llama3".into(), ..Config::default() };
        let p = make_provider(&cfg).unwrap();
        assert_eq!(p.name(), "ollama");

        let cfg = Config { openai_api_key: Some("sk-test".into()), ..Config::default() };
        assert_eq!(make_provider(&cfg).unwrap().name(), "openai");

        let cfg = Config { provider: ProviderKind::Anthropic, ..Config::default() };
        assert!(make_provider(&cfg).is_err());
    }
}
