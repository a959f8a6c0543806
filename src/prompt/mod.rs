use crate::errors::TourError;
use crate::wire::PromptPair;

fn system_prompt() -> &'static str {
r#"You are a tour guide API that returns ONLY valid JSON. Search for and verify real places before recommending them. Respond with ONLY the JSON object: no explanations, no markdown, no code fences, no extra text before or after."#
}

fn field_contract() -> &'static str {
r#"Each stop is a JSON object with these exact fields:
- name: The actual name of the place/attraction (verified)
- description: What to do/see there and why it matches the interests
- duration: Approximate time to spend (e.g., "1-2 hours")
- address: The actual complete street address (verified)
- phone: Phone number if available, otherwise omit it
- website: Website URL if available, otherwise omit it
- images: Array of real image URLs of the place if available, otherwise []"#
}

fn verification_rules() -> &'static str {
r#"- Do NOT make up or hallucinate any information about what a place offers.
- Get the actual address, phone number and website of each place.
- For images: only use real image URLs; if none are available use an empty array []."#
}

fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, TourError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(TourError::InvalidRequest(format!("{field} must not be empty")));
    }
    Ok(v)
}

/// Prompt for a complete tour of `number_of_stops` stops wrapped in `{"stops": [...]}`.
pub fn build_tour_prompt(
    location: &str,
    interests: &str,
    number_of_stops: i64,
) -> Result<PromptPair, TourError> {
    let location = require_text("location", location)?;
    let interests = require_text("interests", interests)?;
    if number_of_stops < 1 {
        return Err(TourError::InvalidRequest(format!(
            "numberOfStops must be a positive integer, got {number_of_stops}"
        )));
    }

    let user = format!(r#"Create a personalized walking tour with exactly {number_of_stops} stops in {location}.

Location: {location}
Interests/Activities: {interests}
Number of stops: {number_of_stops}

CRITICAL INSTRUCTIONS:
1. Only include REAL places that actually exist in {location} and can be verified.
2. For each place, verify BOTH that it exists AND what it actually offers.
3. ONLY include places that ACTUALLY match the interests "{interests}".
4. Do NOT include a place if it doesn't match the interests.
{verification_rules}
5. If you cannot find {number_of_stops} real matching places, return fewer stops.

{field_contract}

Respond with a JSON object with a "stops" array containing {number_of_stops} stops. Format:
{{
  "stops": [
    {{
      "name": "Real Place Name",
      "description": "Description here",
      "duration": "1-2 hours",
      "address": "123 Real Street, City",
      "phone": "+1234567890",
      "website": "https://example.com",
      "images": ["https://example.com/photo.jpg"]
    }}
  ]
}}"#,
        verification_rules = verification_rules(),
        field_contract = field_contract(),
    );

    Ok(PromptPair { system: system_prompt().to_string(), user })
}

/// Prompt for a single replacement stop returned as a bare JSON object.
/// Names in `exclude` are listed as places to avoid; the model is not bound by it.
pub fn build_refresh_prompt(
    location: &str,
    interests: &str,
    exclude: &[String],
) -> Result<PromptPair, TourError> {
    let location = require_text("location", location)?;
    let interests = require_text("interests", interests)?;

    let names: Vec<&str> = exclude
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect();
    let avoid = if names.is_empty() {
        String::new()
    } else {
        format!("\nPlaces to AVOID (already suggested): {}\n", names.join(", "))
    };

    let user = format!(r#"Generate ONE new tour stop for {location}.

Location: {location}
Interests/Activities: {interests}
{avoid}
CRITICAL INSTRUCTIONS:
1. Only suggest a REAL place that actually exists in {location} and can be verified.
2. It must match the interests "{interests}".
{verification_rules}
3. Make sure it's different from the places to avoid.

{field_contract}

Respond ONLY with a single raw JSON object for the stop (not wrapped in any other key), no markdown formatting, no code blocks, no extra text."#,
        verification_rules = verification_rules(),
        field_contract = field_contract(),
    );

    Ok(PromptPair { system: system_prompt().to_string(), user })
}
