//! Field values and cell conversion
//!
//! Field values are plain `serde_json::Value`s: string, number, bool, null or
//! nested arrays/objects, compared structurally.

pub use serde_json::Value;

use std::fmt::Write as _;

/// Parse a raw text cell into a Value
///
/// With `infer_types` set, integers and floats become numbers; everything
/// else (including empty cells) stays a trimmed string.
pub fn parse_cell(s: &str, infer_types: bool) -> Value {
    let trimmed = s.trim();

    if !infer_types || trimmed.is_empty() {
        return Value::String(trimmed.to_string());
    }

    // Try parsing as integer first
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }

    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }

    Value::String(trimmed.to_string())
}

/// Render a value as cell text: strings verbatim, null as empty, the rest as JSON
pub fn to_cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Render a value as a field name
///
/// Strings are used as-is, other values use their JSON text (`1`, `true`,
/// `null`).
pub fn to_field_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Append a canonical encoding of `value` to `out`
///
/// Two values produce the same encoding iff they compare equal, so the
/// encoding can stand in for the value as a hash key. Object keys are
/// sorted because object equality ignores key order.
pub(crate) fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(key, out);
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out);
            }
            out.push(']');
        }
        // 0.0 == -0.0
        Value::Number(n) if n.as_f64() == Some(0.0) && n.is_f64() => out.push_str("0.0"),
        Value::String(s) => write_json_string(s, out),
        other => {
            let _ = write!(out, "{}", other);
        }
    }
}

fn write_json_string(s: &str, out: &mut String) {
    let _ = write!(out, "{}", Value::String(s.to_string()));
}
