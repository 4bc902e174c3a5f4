//! Normalization of free-form provider output into canonical shapes.
//!
//! Providers are asked for JSON but frequently wrap it in markdown fences or
//! return objects that parse yet miss required fields. Everything here turns
//! such output into either a canonical value or `InvalidResponseFormat`.

use std::sync::OnceLock;

use regex::Regex;
use rfx_types::{GatewayError, Result};
use serde_json::Value;

use crate::{ChatResponse, FieldSuggestion};

/// Name of the discriminator field in structured chatbot replies.
pub const MODE_FIELD: &str = "MODE";

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
    })
}

fn invalid(provider: &str, message: impl Into<String>) -> GatewayError {
    GatewayError::InvalidResponseFormat {
        provider: provider.to_string(),
        message: message.into(),
    }
}

/// Extract a JSON value from raw provider output.
///
/// The whole string is tried first, then the interior of each fenced code
/// block in order.
pub fn extract_json(provider: &str, raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    for caps in fence_pattern().captures_iter(trimmed) {
        if let Some(body) = caps.get(1) {
            if let Ok(value) = serde_json::from_str::<Value>(body.as_str().trim()) {
                tracing::debug!(provider, "Extracted JSON from fenced block");
                return Ok(value);
            }
        }
    }

    Err(invalid(
        provider,
        format!("response is not valid JSON: {}", preview(trimmed)),
    ))
}

/// Enforce the chatbot contract on an already-parsed value.
pub fn require_mode(provider: &str, body: Value) -> Result<ChatResponse> {
    let mode = match body.get(MODE_FIELD) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => {
            tracing::error!(provider, response = %body, "Structured reply is missing MODE");
            return Err(invalid(provider, "MODE is missing"));
        }
    };
    Ok(ChatResponse { mode, body })
}

/// Full normalization of a conversational completion.
pub fn normalize_chat(provider: &str, raw: &str, mode_required: bool) -> Result<ChatResponse> {
    let body = extract_json(provider, raw)?;
    if mode_required {
        return require_mode(provider, body);
    }
    if !body.is_object() {
        return Err(invalid(provider, "expected a JSON object"));
    }
    let mode = body
        .get(MODE_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(ChatResponse { mode, body })
}

/// Plain-text completions must not be blank.
pub fn non_empty_text(provider: &str, raw: &str) -> Result<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(invalid(provider, "empty completion"));
    }
    Ok(text.to_string())
}

/// Parse field suggestions from `{"suggestions": [...]}` or a bare array.
pub fn parse_field_suggestions(provider: &str, raw: &str) -> Result<Vec<FieldSuggestion>> {
    let value = extract_json(provider, raw)?;
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map
            .remove("suggestions")
            .ok_or_else(|| invalid(provider, "suggestions are missing"))?,
        _ => return Err(invalid(provider, "expected suggestions array")),
    };
    let suggestions: Vec<FieldSuggestion> = serde_json::from_value(list)
        .map_err(|e| invalid(provider, format!("malformed suggestions: {e}")))?;
    if suggestions.iter().any(|s| s.label.trim().is_empty()) {
        return Err(invalid(provider, "suggestion without label"));
    }
    Ok(suggestions)
}

/// Templates must be JSON objects.
pub fn parse_template(provider: &str, raw: &str) -> Result<Value> {
    parse_object(provider, raw, "template")
}

/// A JSON object; `what` names the expected document in the error.
pub fn parse_object(provider: &str, raw: &str, what: &str) -> Result<Value> {
    let value = extract_json(provider, raw)?;
    if !value.is_object() {
        return Err(invalid(provider, format!("{what} must be a JSON object")));
    }
    Ok(value)
}

fn preview(s: &str) -> String {
    const MAX: usize = 120;
    match s.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_parses() {
        let v = extract_json("openai", r#"{"MODE":"SUGGESTION","SUGGESTIONS":[]}"#).unwrap();
        assert_eq!(v["MODE"], "SUGGESTION");
    }

    #[test]
    fn fenced_json_matches_unwrapped() {
        let body = r#"{"MODE":"ASKING_FOR_INFO","QUESTIONS":[{"question_id":"q1"}]}"#;
        let fenced = format!("Here you go:\n```json\n{body}\n```\nThanks");
        assert_eq!(
            extract_json("gemini", &fenced).unwrap(),
            extract_json("gemini", body).unwrap()
        );
    }

    #[test]
    fn untagged_fence_parses() {
        let v = extract_json("gemini", "```\n[1, 2, 3]\n```").unwrap();
        assert_eq!(v, json!([1, 2, 3]));
    }

    #[test]
    fn first_parseable_fence_wins() {
        let raw = "```json\nnot json\n```\ntext\n```json\n{\"a\":1}\n```";
        assert_eq!(extract_json("gemini", raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn garbage_is_invalid_format() {
        let err = extract_json("openai", "Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponseFormat { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn missing_mode_is_invalid_like_parse_failure() {
        let missing = normalize_chat("openai", r#"{"QUESTIONS":[]}"#, true).unwrap_err();
        let unparsable = normalize_chat("openai", "{QUESTIONS", true).unwrap_err();
        assert!(matches!(missing, GatewayError::InvalidResponseFormat { .. }));
        assert!(matches!(unparsable, GatewayError::InvalidResponseFormat { .. }));
        assert_eq!(missing.is_retryable(), unparsable.is_retryable());
    }

    #[test]
    fn empty_or_non_string_mode_is_invalid() {
        assert!(normalize_chat("openai", r#"{"MODE":""}"#, true).is_err());
        assert!(normalize_chat("openai", r#"{"MODE":"  "}"#, true).is_err());
        assert!(normalize_chat("openai", r#"{"MODE":3}"#, true).is_err());
    }

    #[test]
    fn mode_is_exposed() {
        let resp = normalize_chat(
            "gemini",
            "```json\n{\"MODE\":\"PHASE_ONE_DONE\",\"COLLECTED_DATA\":{}}\n```",
            true,
        )
        .unwrap();
        assert_eq!(resp.mode, "PHASE_ONE_DONE");
        assert!(resp.body["COLLECTED_DATA"].is_object());
    }

    #[test]
    fn mode_optional_when_not_required() {
        let resp = normalize_chat("gemini", r#"{"estimated_price": 1200}"#, false).unwrap();
        assert_eq!(resp.mode, "");
        assert_eq!(resp.body["estimated_price"], 1200);
        assert!(normalize_chat("gemini", "[1]", false).is_err());
    }

    #[test]
    fn blank_text_is_invalid() {
        assert!(non_empty_text("openai", "  \n").is_err());
        assert_eq!(non_empty_text("openai", " ok \n").unwrap(), "ok");
    }

    #[test]
    fn suggestions_from_object_or_array() {
        let obj = r#"{"suggestions":[{"label":"Garanti","description":"d","isRequired":true}]}"#;
        let arr = r#"[{"label":"Garanti","description":"d","isRequired":true}]"#;
        assert_eq!(
            parse_field_suggestions("openai", obj).unwrap(),
            parse_field_suggestions("openai", arr).unwrap()
        );
    }

    #[test]
    fn suggestions_missing_is_invalid() {
        assert!(parse_field_suggestions("openai", r#"{"fields":[]}"#).is_err());
        assert!(parse_field_suggestions("openai", r#"{"suggestions":[{"label":""}]}"#).is_err());
        assert!(parse_field_suggestions("openai", r#"{"suggestions":"nope"}"#).is_err());
    }

    #[test]
    fn template_must_be_object() {
        assert!(parse_template("openai", r#"{"name":"t","sections":[]}"#).is_ok());
        assert!(parse_template("openai", "[]").is_err());
        let err = parse_object("gemini", "[1, 2]", "bid evaluation").unwrap_err();
        assert!(err.to_string().contains("bid evaluation must be a JSON object"));
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "ş".repeat(200);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 123);
    }
}
