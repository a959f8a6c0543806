use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

use crate::errors::TourError;
use crate::provider::transport_error;
use crate::server::{GENERATE_TOUR_PATH, LOGIN_PATH, REFRESH_STOP_PATH};
use crate::wire::{
    ErrorBody, LoginResponse, RefreshRequest, RefreshResponse, StopRecord, TourRequest,
    TourResponse,
};

/// Talks to a running backend over its JSON API.
pub struct ApiClient {
    base: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<(StatusCode, String), TourError> {
        let resp = self
            .client
            .post(format!("{}{}", self.base, path))
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error("backend", e))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| transport_error("backend", e))?;
        Ok((status, text))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), TourError> {
        let (status, text) = self
            .post(LOGIN_PATH, &json!({ "username": username, "password": password }))
            .await?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(TourError::InvalidCredentials);
        }
        let resp: LoginResponse = decode(status, &text)?;
        if resp.success { Ok(()) } else { Err(TourError::InvalidCredentials) }
    }

    pub async fn generate_tour(&self, req: &TourRequest) -> Result<Vec<StopRecord>, TourError> {
        let (status, text) = self.post(GENERATE_TOUR_PATH, req).await?;
        let resp: TourResponse = decode(status, &text)?;
        Ok(resp.stops)
    }

    pub async fn refresh_stop(&self, req: &RefreshRequest) -> Result<StopRecord, TourError> {
        let (status, text) = self.post(REFRESH_STOP_PATH, req).await?;
        let resp: RefreshResponse = decode(status, &text)?;
        Ok(resp.stop)
    }
}

/// Success bodies decode into `T`; error envelopes map back onto `TourError`.
fn decode<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<T, TourError> {
    if status.is_success() {
        return serde_json::from_str(text)
            .map_err(|e| TourError::Provider(format!("unexpected backend response: {e}")));
    }
    let body: ErrorBody = serde_json::from_str(text).unwrap_or_else(|_| ErrorBody {
        error: format!("backend returned {status}"),
        details: text.trim().to_string(),
    });
    let detail = if body.details.is_empty() {
        body.error.clone()
    } else {
        format!("{}: {}", body.error, body.details)
    };
    Err(match status {
        StatusCode::BAD_REQUEST => TourError::InvalidRequest(detail),
        StatusCode::UNAUTHORIZED => TourError::InvalidCredentials,
        _ if body.error.starts_with("Failed to parse") => TourError::MalformedResponse(detail),
        _ => TourError::Provider(detail),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelopes_map_back_to_kinds() {
        let err = decode::<TourResponse>(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"Failed to parse tour data","details":"response is not valid JSON"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TourError::MalformedResponse("Failed to parse tour data: response is not valid JSON".into())
        );

        let err = decode::<TourResponse>(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"Failed to generate tour","details":"openai request timed out"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TourError::Provider(_)));

        let err = decode::<TourResponse>(StatusCode::BAD_REQUEST, r#"{"error":"Missing required fields"}"#)
            .unwrap_err();
        assert_eq!(err, TourError::InvalidRequest("Missing required fields".into()));

        let err = decode::<TourResponse>(StatusCode::BAD_GATEWAY, "<html>oops</html>").unwrap_err();
        assert_eq!(err, TourError::Provider("backend returned 502 Bad Gateway: <html>oops</html>".into()));
    }

    #[test]
    fn success_bodies_decode() {
        let resp: RefreshResponse = decode(
            StatusCode::OK,
            r#"{"success":true,"stop":{"name":"Orsay","description":"Art"}}"#,
        )
        .unwrap();
        assert_eq!(resp.stop.name, "Orsay");
    }
}
