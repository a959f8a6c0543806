use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Config;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "open-ai")]
    OpenAI,
    Anthropic,
    Ollama,
}

#[derive(Parser, Debug)]
#[command(name = "tourgen", version, about = "AI walking-tour generator: HTTP backend and terminal wizard")]
pub struct Cli {
    /// TOML file layered over the built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP backend.
    Serve(ServeArgs),
    /// Walk through the tour wizard in the terminal against a running backend.
    Walk(WalkArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Write every prompt and raw model reply under the transcript directory.
    #[arg(long, default_value_t = false)]
    pub save_transcripts: bool,
}

impl ServeArgs {
    /// Flags win over file and defaults.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(h) = &self.host { cfg.host = h.clone(); }
        if let Some(p) = self.port { cfg.port = p; }
        if let Some(p) = self.provider { cfg.provider = p; }
        if let Some(m) = &self.model { cfg.model = m.clone(); }
        if let Some(k) = &self.openai_api_key { cfg.openai_api_key = Some(k.clone()); }
        if let Some(k) = &self.anthropic_api_key { cfg.anthropic_api_key = Some(k.clone()); }
        if let Some(t) = self.timeout_secs { cfg.timeout_secs = t; }
        if let Some(d) = &self.static_dir { cfg.static_dir = d.clone(); }
        if self.save_transcripts { cfg.save_transcripts = true; }
    }
}

#[derive(Args, Debug)]
pub struct WalkArgs {
    /// Base URL of a running `tourgen serve`.
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub server: String,

    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}
