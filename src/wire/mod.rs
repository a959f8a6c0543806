use serde::{Deserialize, Serialize};
use serde_json::Value;

/// ========================================
/// Tour domain records
/// ========================================

/// Inputs for one tour generation, as collected by the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourRequest {
    pub location: String,
    pub interests: String,
    pub number_of_stops: i64,
}

/// One recommended place in a generated tour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Ordered stops; presentation order only.
pub type TourResult = Vec<StopRecord>;

/// Asks for one replacement stop, steering away from names already shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub location: String,
    pub interests: String,
    #[serde(default)]
    pub current_stops: Vec<String>,
}

/// ========================================
/// Provider-facing prompt shapes
/// ========================================

#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// A single completion call: the prompt plus its sampling budget.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub prompt: PromptPair,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// ========================================
/// HTTP bodies
/// ========================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
}

/// Body of `POST /api/generate-tour`. Fields stay loose so the handler can
/// answer 400 with our own envelope instead of a framework rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTourBody {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default)]
    pub number_of_stops: Option<Value>,
}

impl GenerateTourBody {
    /// Accepts `3`, `3.0` and `"3"`; anything else counts as missing.
    pub fn stop_count(&self) -> Option<i64> {
        match self.number_of_stops.as_ref()? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStopBody {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default)]
    pub current_stops: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourResponse {
    pub success: bool,
    pub stops: Vec<StopRecord>,
    pub location: String,
    pub interests: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub stop: StopRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stop_count_accepts_numbers_and_numeric_strings() {
        let body: GenerateTourBody =
            serde_json::from_value(json!({ "numberOfStops": 4 })).unwrap();
        assert_eq!(body.stop_count(), Some(4));

        let body: GenerateTourBody =
            serde_json::from_value(json!({ "numberOfStops": " 5 " })).unwrap();
        assert_eq!(body.stop_count(), Some(5));

        let body: GenerateTourBody =
            serde_json::from_value(json!({ "numberOfStops": 2.5 })).unwrap();
        assert_eq!(body.stop_count(), None);

        let body: GenerateTourBody = serde_json::from_value(json!({})).unwrap();
        assert_eq!(body.stop_count(), None);
    }

    #[test]
    fn stop_record_omits_empty_optionals() {
        let stop = StopRecord {
            name: "Louvre".into(),
            description: "Art".into(),
            ..Default::default()
        };
        let v = serde_json::to_value(&stop).unwrap();
        assert!(v.get("phone").is_none());
        assert!(v.get("images").is_none());
        assert_eq!(v["duration"], "");
    }
}
