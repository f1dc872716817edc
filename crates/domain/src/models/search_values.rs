//! Decoding of the `search_values` column of export jobs.
//!
//! The web application stores request filters as a serialized map. Older
//! requests use a Python-style dict literal (`{'min': '2024-05-01T08:00',
//! 'local_host': True}`), newer ones plain JSON. Both decode to the same
//! key-value map.

use serde_json::{Map, Value};

/// Decode a raw `search_values` string into a key-value map.
pub fn decode_search_values(raw: &str) -> Result<Map<String, Value>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("search_values is empty".to_string());
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(json_err) => {
            let normalized = normalize_dict_literal(trimmed)?;
            serde_json::from_str(&normalized).map_err(|_| {
                format!(
                    "search_values is neither JSON nor a dict literal: {}",
                    json_err
                )
            })?
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!(
            "search_values must be a key-value map, got {}",
            type_name(&other)
        )),
    }
}

/// Read a scalar value as text. Numbers are rendered in their JSON form.
pub fn text_value(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Truthiness of an optional flag such as `local_host`.
///
/// Missing, `null`, `false`, `0`, and the strings `""`, `"0"`, `"false"`
/// are false. Everything else is true.
///
/// `"0"` and `"false"` are false on purpose: forms post them for an
/// unchecked box, and a plain non-empty test would route those jobs to the
/// local root.
pub fn flag_value(map: &Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

/// Rewrite a Python dict literal into JSON text.
fn normalize_dict_literal(input: &str) -> Result<String, String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let quote = c;
                let mut literal = String::new();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    if ch == quote {
                        closed = true;
                        break;
                    }
                    if ch == '\\' {
                        match chars.next() {
                            Some('n') => literal.push('\n'),
                            Some('t') => literal.push('\t'),
                            Some('r') => literal.push('\r'),
                            Some(other) => literal.push(other),
                            None => break,
                        }
                    } else {
                        literal.push(ch);
                    }
                }
                if !closed {
                    return Err("unterminated string literal in search_values".to_string());
                }
                out.push_str(&Value::String(literal).to_string());
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                out.push(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || matches!(next, '.' | '+' | '-') {
                        out.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match word.as_str() {
                    "True" | "true" => out.push_str("true"),
                    "False" | "false" => out.push_str("false"),
                    "None" | "null" => out.push_str("null"),
                    other => return Err(format!("unexpected token '{}' in search_values", other)),
                }
            }
            '}' | ']' => {
                // Python tolerates a trailing comma, JSON does not.
                let kept = out.trim_end().len();
                out.truncate(kept);
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(c);
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_json_object() {
        let map = decode_search_values(r#"{"order_id": 42, "local_host": true}"#).unwrap();
        assert_eq!(map.get("order_id"), Some(&Value::from(42)));
        assert_eq!(map.get("local_host"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_decode_dict_literal() {
        let map = decode_search_values(
            "{'min': '2024-05-01T08:00', 'max': '2024-05-01T18:30', 'action': None, 'local_host': True,}",
        )
        .unwrap();
        assert_eq!(text_value(&map, "min").as_deref(), Some("2024-05-01T08:00"));
        assert_eq!(text_value(&map, "max").as_deref(), Some("2024-05-01T18:30"));
        assert_eq!(map.get("action"), Some(&Value::Null));
        assert!(flag_value(&map, "local_host"));
    }

    #[test]
    fn test_decode_dict_literal_with_quotes_inside() {
        let map = decode_search_values(r#"{'action': "picker's \"scan\""}"#).unwrap();
        assert_eq!(
            text_value(&map, "action").as_deref(),
            Some("picker's \"scan\"")
        );
    }

    #[test]
    fn test_decode_rejects_non_map() {
        assert!(decode_search_values("[1, 2]").is_err());
        assert!(decode_search_values("'order'").is_err());
        assert!(decode_search_values("   ").is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_search_values("{'order_id': 5").is_err());
        assert!(decode_search_values("{'order_id': lambda}").is_err());
        assert!(decode_search_values("{'order_id': '5}").is_err());
    }

    #[test]
    fn test_numbers_survive_normalization() {
        let map = decode_search_values("{'order_id': 17, 'ratio': -1.5e2}").unwrap();
        assert_eq!(text_value(&map, "order_id").as_deref(), Some("17"));
        assert_eq!(map.get("ratio").and_then(Value::as_f64), Some(-150.0));
    }

    #[test]
    fn test_text_value_blank_is_missing() {
        let map = decode_search_values(r#"{"action": "  ", "flag": true}"#).unwrap();
        assert_eq!(text_value(&map, "action"), None);
        assert_eq!(text_value(&map, "flag"), None);
        assert_eq!(text_value(&map, "absent"), None);
    }

    #[test]
    fn test_flag_value_truthiness() {
        let map = decode_search_values(
            r#"{"a": true, "b": false, "c": 1, "d": 0, "e": "yes", "f": "0", "g": "false", "h": "", "i": null, "j": " FALSE "}"#,
        )
        .unwrap();
        assert!(flag_value(&map, "a"));
        assert!(!flag_value(&map, "b"));
        assert!(flag_value(&map, "c"));
        assert!(!flag_value(&map, "d"));
        assert!(flag_value(&map, "e"));
        assert!(!flag_value(&map, "f"));
        assert!(!flag_value(&map, "g"));
        assert!(!flag_value(&map, "h"));
        assert!(!flag_value(&map, "i"));
        assert!(!flag_value(&map, "j"));
        assert!(!flag_value(&map, "missing"));
    }
}
