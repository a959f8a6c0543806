use anyhow::{bail, Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::ProviderKind;

/// Output-token cap and sampling temperature for one kind of completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub provider: ProviderKind,
    pub model: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,
    pub openai_base: String,
    pub anthropic_base: String,
    pub anthropic_version: String,
    pub ollama_url: String,
    pub demo_username: String,
    pub demo_password: String,
    pub static_dir: PathBuf,
    pub tour_budget: Budget,
    pub refresh_budget: Budget,
    pub max_stops: i64,
    pub save_transcripts: bool,
    pub transcript_dir: PathBuf,
    pub nominatim_url: String,
    pub geocoder_user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            provider: ProviderKind::OpenAI,
            model: "gpt-4o".into(),
            timeout_secs: 120,
            openai_api_key: None,
            anthropic_api_key: None,
            openai_base: "https://api.openai.com".into(),
            anthropic_base: "https://api.anthropic.com".into(),
            anthropic_version: "2023-06-01".into(),
            ollama_url: "http://localhost:11434".into(),
            demo_username: "demo".into(),
            demo_password: "tour123".into(),
            static_dir: PathBuf::from("public"),
            tour_budget: Budget { max_tokens: 3000, temperature: 0.7 },
            refresh_budget: Budget { max_tokens: 800, temperature: 0.8 },
            max_stops: 20,
            save_transcripts: false,
            transcript_dir: PathBuf::from(".tourgen"),
            nominatim_url: "https://nominatim.openstreetmap.org".into(),
            geocoder_user_agent: concat!("tourgen/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl Config {
    /// Defaults overlaid with whatever keys the TOML file sets.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Startup checks. A hosted provider without its key is refused here rather
    /// than failing on the first user request.
    pub fn validate(&self) -> Result<()> {
        let missing = |k: &Option<String>| k.as_deref().map(str::trim).unwrap_or("").is_empty();
        match self.provider {
            ProviderKind::OpenAI if missing(&self.openai_api_key) => {
                bail!("OPENAI_API_KEY is not set; export it or pass --openai-api-key")
            }
            ProviderKind::Anthropic if missing(&self.anthropic_api_key) => {
                bail!("ANTHROPIC_API_KEY is not set; export it or pass --anthropic-api-key")
            }
            _ => {}
        }
        if self.max_stops < 1 {
            bail!("max_stops must be at least 1, got {}", self.max_stops);
        }
        if self.demo_username.is_empty() || self.demo_password.is_empty() {
            bail!("demo credentials must not be empty");
        }
        Ok(())
    }
}
