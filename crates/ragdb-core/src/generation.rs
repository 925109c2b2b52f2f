//! Adapter between generation-service responses and plain text.
//!
//! Providers return several response shapes. All shape sniffing lives here so
//! callers only ever see a `String` (possibly empty).

use serde_json::Value;

/// Extract the answer text from a generation response.
pub fn response_text(response: &Value) -> String {
    if let Some(s) = response.as_str() {
        return s.to_string();
    }
    if let Some(s) = response.get("text").and_then(Value::as_str) {
        return s.to_string();
    }
    if let Some(s) = response.pointer("/response/text").and_then(Value::as_str) {
        return s.to_string();
    }
    response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| parts.iter().filter_map(|p| p.get("text").and_then(Value::as_str)).collect::<String>())
        .unwrap_or_default()
}

/// Parse a JSON payload out of model output.
///
/// Strips a surrounding ```` ```json ```` fence first; if the remainder is not
/// valid JSON, falls back to the widest `{...}` or `[...]` span starting at the
/// first opening bracket.
pub fn parse_structured(text: &str) -> Option<Value> {
    let cleaned = strip_fence(text.trim());
    if let Ok(v) = serde_json::from_str(cleaned) {
        return Some(v);
    }
    let start = cleaned.find(['{', '['])?;
    let close = if cleaned[start..].starts_with('{') { '}' } else { ']' };
    let end = cleaned.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&cleaned[start..=end]).ok()
}

fn strip_fence(s: &str) -> &str {
    let mut out = s;
    if out.get(..7).is_some_and(|p| p.eq_ignore_ascii_case("```json")) {
        out = &out[7..];
    } else if let Some(rest) = out.strip_prefix("```") {
        out = rest;
    }
    out.strip_suffix("```").unwrap_or(out).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_from_known_shapes() {
        assert_eq!(response_text(&json!("plain")), "plain");
        assert_eq!(response_text(&json!({"text": "a"})), "a");
        assert_eq!(response_text(&json!({"response": {"text": "b"}})), "b");
        let gemini = json!({"candidates": [{"content": {"parts": [{"text": "c1"}, {"text": "c2"}]}}]});
        assert_eq!(response_text(&gemini), "c1c2");
    }

    #[test]
    fn unknown_shape_is_empty() {
        assert_eq!(response_text(&json!({"other": 1})), "");
        assert_eq!(response_text(&Value::Null), "");
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"response\": \"ok\", \"suggestions\": []}\n```";
        assert_eq!(parse_structured(raw), Some(json!({"response": "ok", "suggestions": []})));
    }

    #[test]
    fn falls_back_to_embedded_object() {
        let raw = "Sure! Here you go: {\"task\": \"add-expense\"} hope that helps";
        assert_eq!(parse_structured(raw), Some(json!({"task": "add-expense"})));
        assert_eq!(parse_structured("no json here"), None);
    }

    #[test]
    fn non_ascii_output_does_not_split_characters() {
        let raw = "मेरा उत्तर {\"response\": \"ok\"}";
        assert_eq!(parse_structured(raw), Some(json!({"response": "ok"})));
        assert_eq!(parse_structured("回答はありません"), None);
        assert_eq!(parse_structured("```json\n{\"response\": \"धन्यवाद\"}\n```"), Some(json!({"response": "धन्यवाद"})));
    }
}
