//! Gambling-content filter applied to payloads served in kids mode.
//!
//! Only two shapes are walked: top-level arrays and `items` arrays. Fields
//! nested under any other key are left as they are.

use serde_json::{Map, Value};

/// Keys stripped from every object the filter visits.
pub const GAMBLING_KEYS: [&str; 7] = [
    "odds",
    "bettingTips",
    "bet",
    "bets",
    "oddsData",
    "recommendedWagers",
    "depositButton",
];

/// Return a sanitized copy of `payload`. The input is never mutated.
pub fn sanitize(payload: &Value) -> Value {
    match payload {
        Value::Array(entries) => Value::Array(entries.iter().map(sanitize).collect()),
        Value::Object(fields) => Value::Object(sanitize_object(fields)),
        other => other.clone(),
    }
}

fn sanitize_object(fields: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(fields.len());

    for (key, value) in fields {
        if GAMBLING_KEYS.contains(&key.as_str()) {
            continue;
        }

        let value = match (key.as_str(), value) {
            ("items", Value::Array(items)) => Value::Array(
                items
                    .iter()
                    .filter(|item| !is_gambling(item))
                    .map(sanitize)
                    .collect(),
            ),
            _ => value.clone(),
        };
        out.insert(key.clone(), value);
    }

    out
}

fn is_gambling(item: &Value) -> bool {
    item.get("isGambling").and_then(Value::as_bool) == Some(true)
}
