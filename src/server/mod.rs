use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::auth::AuthGate;
use crate::errors::TourError;
use crate::service::TourService;
use crate::wire::{
    ErrorBody, GenerateTourBody, HealthResponse, LoginBody, LoginResponse, RefreshRequest,
    RefreshResponse, RefreshStopBody, TourRequest, TourResponse,
};

pub const HEALTH_PATH: &str = "/health";
pub const LOGIN_PATH: &str = "/api/login";
pub const GENERATE_TOUR_PATH: &str = "/api/generate-tour";
pub const REFRESH_STOP_PATH: &str = "/api/refresh-stop";

/// Shared, read-only per-process state.
#[derive(Clone)]
pub struct AppState {
    pub service: TourService,
    pub auth: AuthGate,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Generate,
    Refresh,
    Login,
}

/// A `TourError` bound to the operation it interrupted, rendered as
/// `{error, details}` with the status the error kind maps to.
#[derive(Debug)]
pub struct ApiError {
    action: Action,
    err: TourError,
}

impl ApiError {
    fn new(action: Action, err: TourError) -> Self {
        Self { action, err }
    }

    fn message(&self) -> &'static str {
        match (&self.err, self.action) {
            (TourError::InvalidRequest(_), _) => "Missing required fields",
            (TourError::InvalidCredentials, _) => "Invalid credentials",
            (TourError::Provider(_), Action::Refresh) => "Failed to refresh stop",
            (TourError::Provider(_), _) => "Failed to generate tour",
            (TourError::MalformedResponse(_), Action::Refresh) => "Failed to parse stop data",
            (TourError::MalformedResponse(_), _) => "Failed to parse tour data",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self.err {
            TourError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            TourError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            TourError::Provider(_) | TourError::MalformedResponse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody { error: self.message().to_string(), details: self.err.details() };
        (code, Json(body)).into_response()
    }
}

fn bad_body(action: Action, rejection: JsonRejection) -> ApiError {
    ApiError::new(action, TourError::InvalidRequest(rejection.body_text()))
}

fn required(field: &str, value: Option<String>) -> Result<String, TourError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TourError::InvalidRequest(format!("{field} is required")))
}

/// API routes, the entry page at `/`, and every other path served from `static_dir`.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(LOGIN_PATH, post(login))
        .route(GENERATE_TOUR_PATH, post(generate_tour))
        .route(REFRESH_STOP_PATH, post(refresh_stop))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds and serves until Ctrl-C.
pub async fn serve(addr: &str, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind http listener on {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("http server crashed")
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".into() })
}

async fn login(
    State(st): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|e| bad_body(Action::Login, e))?;
    let resp = match st.auth.login(&body.username, &body.password) {
        Ok(()) => {
            tracing::info!(user = %body.username, "login succeeded");
            (StatusCode::OK, Json(LoginResponse { success: true, message: "Login successful!".into() }))
        }
        Err(_) => {
            tracing::info!(user = %body.username, "login rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(LoginResponse { success: false, message: "Invalid credentials".into() }),
            )
        }
    };
    Ok(resp.into_response())
}

async fn generate_tour(
    State(st): State<AppState>,
    body: Result<Json<GenerateTourBody>, JsonRejection>,
) -> Result<Json<TourResponse>, ApiError> {
    let fail = |e: TourError| ApiError::new(Action::Generate, e);
    let Json(body) = body.map_err(|e| bad_body(Action::Generate, e))?;

    let number_of_stops = body
        .stop_count()
        .ok_or_else(|| fail(TourError::InvalidRequest("numberOfStops is required".into())))?;
    let req = TourRequest {
        location: required("location", body.location).map_err(fail)?,
        interests: required("interests", body.interests).map_err(fail)?,
        number_of_stops,
    };

    let stops = st.service.generate_tour(&req).await.map_err(fail)?;
    Ok(Json(TourResponse {
        success: true,
        stops,
        location: req.location,
        interests: req.interests,
    }))
}

async fn refresh_stop(
    State(st): State<AppState>,
    body: Result<Json<RefreshStopBody>, JsonRejection>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let fail = |e: TourError| ApiError::new(Action::Refresh, e);
    let Json(body) = body.map_err(|e| bad_body(Action::Refresh, e))?;

    let req = RefreshRequest {
        location: required("location", body.location).map_err(fail)?,
        interests: required("interests", body.interests).map_err(fail)?,
        current_stops: body.current_stops.unwrap_or_default(),
    };

    let stop = st.service.refresh_stop(&req).await.map_err(fail)?;
    Ok(Json(RefreshResponse { success: true, stop }))
}
