//! Recovers stop records from free-form model text.
//!
//! The model is asked for bare JSON but does not always comply, so the text is
//! reduced in order of specificity: a fenced code block (preferring one tagged
//! `json`), then the outermost `{ ... }` span, then the raw text.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::errors::TourError;
use crate::wire::StopRecord;

/// Keys tried, in order, when the stop list arrives wrapped in an object.
const WRAPPER_KEYS: [&str; 2] = ["stops", "tour"];

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+-]*)[ \t]*\r?\n?(.*?)```").expect("fence pattern compiles")
    })
}

/// Interior of the first fenced block, preferring a `json`-tagged one.
/// Returns `None` when there is no complete fence.
fn fenced_block(text: &str) -> Option<&str> {
    let mut first = None;
    for caps in fence_regex().captures_iter(text) {
        let lang = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let body = caps.get(2)?.as_str();
        if lang.eq_ignore_ascii_case("json") {
            return Some(body);
        }
        first.get_or_insert(body);
    }
    first
}

/// Substring from the first `{` to the last `}` inclusive, when such a pair exists.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Steps 1-3: trim, strip fences, cut to the brace span.
pub fn clean_json_text(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    if cleaned.contains("```") {
        if let Some(body) = fenced_block(cleaned) {
            cleaned = body.trim();
        }
    }
    // A bare top-level array would be mangled by brace extraction.
    if cleaned.starts_with('[') && cleaned.ends_with(']') {
        return cleaned;
    }
    brace_span(cleaned).map(str::trim).unwrap_or(cleaned)
}

fn parse_json(raw: &str) -> Result<Value, TourError> {
    let cleaned = clean_json_text(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        TourError::MalformedResponse(format!("response is not valid JSON: {e}"))
    })
}

/// A wrapper key only counts when it holds something: null, `false`, `0`
/// and `""` are passed over in favour of the next candidate.
fn present(v: Option<&Value>) -> Option<&Value> {
    v.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Array itself, else `stops`, else `tour`, else the object's first value.
fn resolve_stop_list(parsed: Value) -> Result<Vec<Value>, TourError> {
    let candidate = match parsed {
        Value::Array(items) => return Ok(items),
        Value::Object(mut obj) => {
            let key = WRAPPER_KEYS
                .iter()
                .find(|k| present(obj.get(**k)).is_some())
                .map(|k| k.to_string())
                .or_else(|| obj.keys().next().cloned());
            key.and_then(|k| obj.remove(&k))
        }
        _ => None,
    };
    match candidate {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(TourError::MalformedResponse(format!(
            "expected an array of stops, found {}",
            kind_of(&other)
        ))),
        None => Err(TourError::MalformedResponse(
            "response does not contain a list of stops".into(),
        )),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    let s = match obj.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn image_list(obj: &Map<String, Value>) -> Vec<String> {
    match obj.get("images") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(u)) if !u.trim().is_empty() => vec![u.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Presence checks only: `name` and `description` are required, the rest default.
fn stop_from_value(value: &Value, position: Option<usize>) -> Result<StopRecord, TourError> {
    let at = position.map(|i| format!("stop {}", i + 1)).unwrap_or_else(|| "stop".into());
    let obj = value.as_object().ok_or_else(|| {
        TourError::MalformedResponse(format!("{at} is {} rather than an object", kind_of(value)))
    })?;
    let name = text_field(obj, "name")
        .ok_or_else(|| TourError::MalformedResponse(format!("{at} has no name")))?;
    let description = text_field(obj, "description")
        .ok_or_else(|| TourError::MalformedResponse(format!("{at} ({name}) has no description")))?;

    Ok(StopRecord {
        name,
        description,
        duration: text_field(obj, "duration").unwrap_or_default(),
        address: text_field(obj, "address").unwrap_or_default(),
        phone: text_field(obj, "phone"),
        website: text_field(obj, "website"),
        images: image_list(obj),
    })
}

/// Full-tour path: recovers the ordered stop list from model text.
pub fn normalize_tour_response(raw: &str) -> Result<Vec<StopRecord>, TourError> {
    let parsed = parse_json(raw)?;
    resolve_stop_list(parsed)?
        .iter()
        .enumerate()
        .map(|(i, v)| stop_from_value(v, Some(i)))
        .collect()
}

/// Refresh path: the parsed object itself is the stop.
pub fn normalize_single_stop(raw: &str) -> Result<StopRecord, TourError> {
    let parsed = parse_json(raw)?;
    stop_from_value(&parsed, None)
}
