use crate::errors::TourError;
use crate::wire::Completion;
use chrono::Utc;
use fs_err as fs;
use serde_json::{json, to_string_pretty};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Installs the global fmt subscriber. `TOURGEN_LOG` takes precedence over
/// the level picked from `--debug`.
pub fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("TOURGEN_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

/// Where one provider exchange was written.
#[derive(Debug)]
pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: PathBuf,
    pub response: PathBuf,
}

fn tx_dir(root: &Path, tx: Uuid) -> PathBuf {
    root.join("tx").join(tx.to_string())
}

/// Writes `<stage>.request.json` (prompt and budget) and `<stage>.response.txt`
/// (raw model text, or the provider error) under `<root>/tx/<tx>/`.
pub fn save_exchange(
    root: &Path,
    tx: Uuid,
    stage: &str,
    req: &Completion,
    outcome: &Result<String, TourError>,
) -> anyhow::Result<SavedPaths> {
    let dir = tx_dir(root, tx);
    fs::create_dir_all(&dir)?;

    let request = dir.join(format!("{stage}.request.json"));
    let body = json!({
        "transaction": tx,
        "stage": stage,
        "timestamp": Utc::now(),
        "max_tokens": req.max_tokens,
        "temperature": req.temperature,
        "system": req.prompt.system,
        "user": req.prompt.user,
    });
    fs::write(&request, to_string_pretty(&body)?)?;

    let response = dir.join(format!("{stage}.response.txt"));
    let text = match outcome {
        Ok(raw) => raw.clone(),
        Err(err) => format!("ERROR: {err}\n"),
    };
    fs::write(&response, text)?;

    Ok(SavedPaths { dir, request, response })
}
