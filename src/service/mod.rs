use std::path::PathBuf;
use uuid::Uuid;

use crate::config::{Budget, Config};
use crate::errors::TourError;
use crate::log;
use crate::normalize::{normalize_single_stop, normalize_tour_response};
use crate::prompt::{build_refresh_prompt, build_tour_prompt};
use crate::provider::DynProvider;
use crate::wire::{Completion, PromptPair, RefreshRequest, StopRecord, TourRequest, TourResult};

/// Request lifecycle for tour generation and single-stop refresh.
/// Stateless apart from read-only settings; one provider call per operation.
#[derive(Clone)]
pub struct TourService {
    provider: DynProvider,
    tour_budget: Budget,
    refresh_budget: Budget,
    max_stops: i64,
    transcript_dir: Option<PathBuf>,
}

impl TourService {
    pub fn new(provider: DynProvider, cfg: &Config) -> Self {
        Self {
            provider,
            tour_budget: cfg.tour_budget,
            refresh_budget: cfg.refresh_budget,
            max_stops: cfg.max_stops,
            transcript_dir: cfg.save_transcripts.then(|| cfg.transcript_dir.clone()),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    #[tracing::instrument(skip_all, fields(location = %req.location, stops = req.number_of_stops))]
    pub async fn generate_tour(&self, req: &TourRequest) -> Result<TourResult, TourError> {
        if req.number_of_stops > self.max_stops {
            return Err(TourError::InvalidRequest(format!(
                "numberOfStops must be at most {}, got {}",
                self.max_stops, req.number_of_stops
            )));
        }
        let prompt = build_tour_prompt(&req.location, &req.interests, req.number_of_stops)?;
        let raw = self.call("tour", prompt, self.tour_budget).await?;

        let mut stops = normalize_tour_response(&raw).map_err(|e| {
            tracing::warn!(error = %e, raw = %raw, "could not recover stops from model output");
            e
        })?;
        let wanted = usize::try_from(req.number_of_stops).unwrap_or(usize::MAX);
        if stops.len() > wanted {
            tracing::debug!(got = stops.len(), wanted, "model returned extra stops; truncating");
            stops.truncate(wanted);
        }
        tracing::info!(count = stops.len(), "tour generated");
        Ok(stops)
    }

    #[tracing::instrument(skip_all, fields(location = %req.location, excluded = req.current_stops.len()))]
    pub async fn refresh_stop(&self, req: &RefreshRequest) -> Result<StopRecord, TourError> {
        let prompt = build_refresh_prompt(&req.location, &req.interests, &req.current_stops)?;
        let raw = self.call("refresh", prompt, self.refresh_budget).await?;

        let stop = normalize_single_stop(&raw).map_err(|e| {
            tracing::warn!(error = %e, raw = %raw, "could not recover stop from model output");
            e
        })?;
        if req.current_stops.iter().any(|n| n.eq_ignore_ascii_case(&stop.name)) {
            tracing::info!(name = %stop.name, "model repeated an excluded stop");
        }
        Ok(stop)
    }

    async fn call(&self, stage: &str, prompt: PromptPair, budget: Budget) -> Result<String, TourError> {
        let completion = Completion {
            prompt,
            max_tokens: budget.max_tokens,
            temperature: budget.temperature,
        };
        let result = self.provider.complete(&completion).await;

        match &result {
            Ok(raw) => tracing::debug!(provider = self.provider.name(), raw = %raw, "model response"),
            Err(e) => tracing::error!(provider = self.provider.name(), error = %e, "provider call failed"),
        }

        if let Some(root) = &self.transcript_dir {
            match log::save_exchange(root, Uuid::new_v4(), stage, &completion, &result) {
                Ok(p) => tracing::debug!(dir = %p.dir.display(), "transcript saved"),
                Err(e) => tracing::warn!(error = %e, "could not save transcript"),
            }
        }
        result
    }
}
