use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::TourError;
use crate::provider::{status_error, transport_error};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Parses `"48.85,2.35"` (an optional leading `@` and spaces are allowed).
    pub fn parse(text: &str) -> Option<Self> {
        let (lat, lon) = text.trim().trim_start_matches('@').split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lon: f64 = lon.trim().parse().ok()?;
        ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then_some(Self { lat, lon })
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Coordinates to a human-readable place name.
    async fn reverse(&self, at: Coordinates) -> Result<String, TourError>;

    /// Address to coordinates; `Ok(None)` when the address is unknown.
    async fn forward(&self, address: &str) -> Result<Option<Coordinates>, TourError>;
}

#[derive(Debug, Default, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReverseResponse {
    pub address: Option<Address>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// "City, State, Country" from whatever parts are present; `display_name` otherwise.
pub fn place_name(resp: &ReverseResponse) -> Option<String> {
    let Some(addr) = &resp.address else {
        return resp.display_name.clone();
    };
    let locality = addr.city.as_ref().or(addr.town.as_ref()).or(addr.village.as_ref());
    let parts: Vec<&str> = [locality, addr.state.as_ref(), addr.country.as_ref()]
        .into_iter()
        .flatten()
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        resp.display_name.clone()
    } else {
        Some(parts.join(", "))
    }
}

/// OpenStreetMap Nominatim. Anonymous, but it requires an identifying user agent.
pub struct Nominatim {
    base: String,
    client: Client,
}

impl Nominatim {
    pub fn new(base: String, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).timeout(timeout).build()?;
        Ok(Self { base, client })
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, TourError> {
        let url = format!("{}/{}", self.base.trim_end_matches('/'), path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .header("Accept-Language", "en")
            .send()
            .await
            .map_err(|e| transport_error("nominatim", e))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| transport_error("nominatim", e))?;
        if !status.is_success() {
            return Err(status_error("nominatim", status, &text));
        }
        Ok(text)
    }
}

#[async_trait]
impl Geocoder for Nominatim {
    async fn reverse(&self, at: Coordinates) -> Result<String, TourError> {
        let query = [
            ("format", "json".to_string()),
            ("lat", at.lat.to_string()),
            ("lon", at.lon.to_string()),
            ("zoom", "10".to_string()),
        ];
        let text = self.get_text("reverse", &query).await?;
        let parsed: ReverseResponse = serde_json::from_str(&text)
            .map_err(|e| TourError::Provider(format!("geocoding response parse error: {e}")))?;
        place_name(&parsed)
            .ok_or_else(|| TourError::Provider("geocoding returned no place name".into()))
    }

    async fn forward(&self, address: &str) -> Result<Option<Coordinates>, TourError> {
        let query = [("format", "json".to_string()), ("limit", "1".to_string()), ("q", address.to_string())];
        let text = self.get_text("search", &query).await?;
        let hits: Vec<SearchHit> = serde_json::from_str(&text)
            .map_err(|e| TourError::Provider(format!("geocoding response parse error: {e}")))?;
        Ok(hits.into_iter().next().and_then(|h| {
            Some(Coordinates { lat: h.lat.parse().ok()?, lon: h.lon.parse().ok()? })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reverse(json: &str) -> ReverseResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn place_name_prefers_city_then_town_then_village() {
        let r = reverse(r#"{"address":{"city":"Paris","state":"Île-de-France","country":"France"},"display_name":"x"}"#);
        assert_eq!(place_name(&r).as_deref(), Some("Paris, Île-de-France, France"));

        let r = reverse(r#"{"address":{"town":"Hallstatt","country":"Austria"}}"#);
        assert_eq!(place_name(&r).as_deref(), Some("Hallstatt, Austria"));

        let r = reverse(r#"{"address":{"village":"Giethoorn","city":null,"country":"Netherlands"}}"#);
        assert_eq!(place_name(&r).as_deref(), Some("Giethoorn, Netherlands"));
    }

    #[test]
    fn place_name_falls_back_to_display_name() {
        let r = reverse(r#"{"display_name":"Somewhere, Earth"}"#);
        assert_eq!(place_name(&r).as_deref(), Some("Somewhere, Earth"));
        let r = reverse(r#"{"address":{},"display_name":"Open sea"}"#);
        assert_eq!(place_name(&r).as_deref(), Some("Open sea"));
        assert_eq!(place_name(&reverse("{}")), None);
    }

    #[test]
    fn coordinates_parse() {
        assert_eq!(Coordinates::parse("@48.85, 2.35"), Some(Coordinates { lat: 48.85, lon: 2.35 }));
        assert_eq!(Coordinates::parse("-33.9,151.2"), Some(Coordinates { lat: -33.9, lon: 151.2 }));
        assert_eq!(Coordinates::parse("Paris"), None);
        assert_eq!(Coordinates::parse("95,10"), None);
    }
}
