//! Post-processing of inference replies before they reach the transcript.

use memchr::memmem;
use serde_json::{Map, Number, Value};
use tracing::warn;

const JSON_FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Shown in place of a reply whenever any request of a submission fails.
pub const FAILURE_MESSAGE: &str = "Failed to fetch responses.";

/// Returns the text between the first ```` ```json ```` marker and the next
/// closing fence, if both are present.
pub fn find_fenced_json(text: &str) -> Option<&str> {
    let open = memmem::find(text.as_bytes(), JSON_FENCE_OPEN.as_bytes())?;
    let body_start = open + JSON_FENCE_OPEN.len();
    let rest = &text[body_start..];
    let close = memmem::find(rest.as_bytes(), FENCE_CLOSE.as_bytes())?;
    Some(&rest[..close])
}

/// Replaces the whole reply with the pretty-printed contents of its fenced
/// JSON block. The reply passes through untouched when there is no block or
/// the block does not parse.
pub fn extract_and_pretty_print(text: &str) -> String {
    let Some(body) = find_fenced_json(text) else {
        return text.to_string();
    };
    if body.is_empty() {
        return text.to_string();
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => pretty_json(&value),
        Err(err) => {
            warn!(error = %err, "Failed to parse fenced JSON block; showing reply as-is");
            text.to_string()
        }
    }
}

/// Two-space indented JSON, printed the way a browser's `JSON.stringify`
/// prints it: integral floats lose their `.0` and array-index keys come
/// first in ascending order.
pub fn pretty_json(value: &Value) -> String {
    let normalized = normalize(value.clone());
    serde_json::to_string_pretty(&normalized).unwrap_or_else(|_| normalized.to_string())
}

// 2^53: above this, f64 no longer holds every integer exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

fn normalize(value: Value) -> Value {
    match value {
        Value::Number(number) => Value::Number(normalize_number(number)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => {
            let (mut indexed, named): (Vec<_>, Vec<_>) = map
                .into_iter()
                .map(|(key, value)| (array_index(&key), key, normalize(value)))
                .partition(|(index, _, _)| index.is_some());
            indexed.sort_by_key(|(index, _, _)| *index);
            Value::Object(
                indexed
                    .into_iter()
                    .chain(named)
                    .map(|(_, key, value)| (key, value))
                    .collect::<Map<String, Value>>(),
            )
        }
        other => other,
    }
}

/// Canonical decimal form of an integer below 2^32 - 1, which JavaScript
/// objects enumerate before every other key.
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|index| *index != u32::MAX)
}

fn normalize_number(number: Number) -> Number {
    if number.is_f64() {
        if let Some(float) = number.as_f64() {
            if float.fract() == 0.0 && float.abs() < MAX_SAFE_INTEGER {
                return Number::from(float as i64);
            }
        }
    }
    number
}

/// Builds the single assistant entry of a dual-endpoint submission.
pub fn compose_dual_reply(ask_reply: &str, prediction: &Value, results: &Value) -> String {
    format!(
        "Heavy KB Model:\n{}\n\nLight KB Model:\n{}\n\"results\": {}",
        extract_and_pretty_print(ask_reply),
        pretty_json(prediction),
        pretty_json(results)
    )
}
