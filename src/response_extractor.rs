//! Locates the JSON object inside a raw AI text response.
//!
//! Generative models often wrap their JSON in prose or markdown fences. The
//! extractor takes the span from the first `{` to the last `}` and parses it.
//! This is greedy and non-recursive: a response with two sibling objects yields
//! one span that will usually fail to parse, and that failure is reported rather
//! than guessed around.

use log::debug;
use serde_json::{Map, Value};

use crate::error::PlantError;

/// Extracts and parses the outermost `{ ... }` span of `raw`.
///
/// # Errors
///
/// Returns [`PlantError::MalformedResponse`] when `raw` has no brace pair, when
/// the last `}` precedes the first `{`, or when the span is not a JSON object.
///
/// # Examples
///
/// ```rust
/// use plant_care_core::response_extractor::extract_json_object;
///
/// let raw = "Here is the analysis:\n{\"plantName\": \"Monstera deliciosa\"}\nHope it helps!";
/// let object = extract_json_object(raw)?;
/// assert_eq!(object["plantName"], "Monstera deliciosa");
/// # Ok::<(), plant_care_core::error::PlantError>(())
/// ```
pub fn extract_json_object(raw: &str) -> Result<Map<String, Value>, PlantError> {
    let (start, end) = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(PlantError::MalformedResponse(
                "No JSON object found in response".to_string(),
            ))
        }
    };

    let candidate = &raw[start..=end];
    debug!("Extracted JSON candidate of {} bytes", candidate.len());

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(PlantError::MalformedResponse(
            "Response JSON is not an object".to_string(),
        )),
        Err(e) => Err(PlantError::MalformedResponse(format!(
            "Invalid JSON in response: {e}"
        ))),
    }
}
