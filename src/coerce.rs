//! Lenient conversions from upstream JSON values
//!
//! The upstream API is loose about types: ids and stats show up as numbers or
//! strings depending on the endpoint. These helpers never fail; callers decide
//! what a missing value means.

use crate::PokemonId;
use serde_json::Value;

/// Parse an id from a number or a numeric string
pub fn id(value: &Value) -> Option<PokemonId> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as PokemonId)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<PokemonId>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as PokemonId)
            })
        }
        _ => None,
    }
}

/// Coerce a stat field to a number, `0.0` when absent or unparsable
pub fn stat(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

/// Render a scalar as text; strings are taken verbatim
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Interpret a legendary-style flag
pub fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "y"
        ),
        _ => false,
    }
}

/// Collect the record's types into a `/`-joined string
///
/// Accepts `types` or `type` as a string or array (of strings or `{name}`
/// objects), falling back to the `type_1`/`type_2` column pair.
pub fn types(record: &Value) -> String {
    for key in ["types", "type"] {
        match record.get(key) {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Array(items)) => {
                return items
                    .iter()
                    .filter_map(type_name)
                    .collect::<Vec<_>>()
                    .join("/")
            }
            _ => {}
        }
    }

    ["type_1", "type_2"]
        .iter()
        .filter_map(|key| record.get(*key).and_then(type_name))
        .collect::<Vec<_>>()
        .join("/")
}

fn type_name(value: &Value) -> Option<String> {
    let name = match value {
        Value::String(s) => s.trim(),
        Value::Object(map) => map.get("name")?.as_str()?.trim(),
        _ => return None,
    };

    (!name.is_empty()).then(|| name.to_string())
}
