//! Turn the classifier's raw answer into a [`ClassificationResult`].
//!
//! JSON mode makes a well-formed object the usual case, but models still
//! occasionally wrap the object in a Markdown fence, prepend a sentence, or
//! stop mid-object when they hit the token limit. A single surrounding fence
//! is removed; anything else that fails to parse is handed back verbatim as
//! `raw_response` so a human can read it.

use crate::error::ModelError;
use crate::output::{Classification, ClassificationResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\n(.*?)\n?```$").unwrap());

/// Normalise the outcome of the classification call.
pub fn normalize(answer: Result<String, ModelError>) -> ClassificationResult {
    match answer {
        Ok(raw) => parse_answer(&raw),
        Err(e) => {
            warn!("No classification available: {}", e);
            ClassificationResult::model_call_failed()
        }
    }
}

/// Parse a raw answer, falling back to `{ "raw_response": raw }`.
pub fn parse_answer(raw: &str) -> ClassificationResult {
    let body = strip_json_fence(raw);

    let parsed = serde_json::from_str::<Value>(body).and_then(|value| match value {
        Value::Object(_) => serde_json::from_value::<Classification>(value),
        other => Err(serde::de::Error::custom(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    });

    match parsed {
        Ok(classification) => {
            debug!("Classification parsed: candidato={}", classification.is_candidate);
            ClassificationResult::Classified(classification)
        }
        Err(e) => {
            warn!("Unparseable classification answer ({}), returning it raw", e);
            ClassificationResult::Unparsed {
                raw_response: raw.to_string(),
            }
        }
    }
}

fn strip_json_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match RE_JSON_FENCE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_answer() -> Value {
        json!({
            "informacion_general": {
                "nombre": "Ana Pérez",
                "correo": "ana@example.com",
                "teléfono": ["+34 600 000 000"],
                "educación": ["Ingeniería en Sistemas"],
                "experiencia": ["3 años como analista de datos"],
                "habilidades": ["Python", "SQL", "Power BI"],
                "certificaciones": ["AWS Cloud Practitioner"],
                "idiomas": ["Inglés B2"]
            },
            "candidato": true,
            "motivo_no_candidato": ""
        })
    }

    #[test]
    fn schema_answer_round_trips() {
        let raw = full_answer().to_string();
        let result = parse_answer(&raw);
        assert_eq!(serde_json::to_value(&result).unwrap(), full_answer());
    }

    #[test]
    fn prose_answer_is_kept_raw() {
        let raw = "Sure! Here is the JSON: {...}";
        assert_eq!(
            parse_answer(raw),
            ClassificationResult::Unparsed {
                raw_response: raw.to_string()
            }
        );
    }

    #[test]
    fn truncated_answer_is_kept_raw() {
        let raw = r#"{"informacion_general": {"nombre": "Ana""#;
        let v = serde_json::to_value(parse_answer(raw)).unwrap();
        assert_eq!(v, json!({ "raw_response": raw }));
    }

    #[test]
    fn fenced_answer_is_unwrapped() {
        let raw = format!("```json\n{}\n```", full_answer());
        let result = parse_answer(&raw);
        let c = result.as_classification().expect("fenced JSON should parse");
        assert_eq!(c.profile.name, "Ana Pérez");
        assert!(c.is_candidate);
    }

    #[test]
    fn bare_fence_is_unwrapped() {
        let raw = "```\n{\"candidato\": false, \"motivo_no_candidato\": \"Sin experiencia\"}\n```";
        let c = parse_answer(raw);
        let c = c.as_classification().expect("should parse");
        assert!(!c.is_candidate);
        assert_eq!(c.rejection_reason, "Sin experiencia");
    }

    #[test]
    fn non_object_json_is_a_parse_failure() {
        for raw in ["[1, 2, 3]", "\"hola\"", "42", "null"] {
            assert_eq!(
                parse_answer(raw),
                ClassificationResult::Unparsed {
                    raw_response: raw.to_string()
                },
                "input {raw}"
            );
        }
    }

    #[test]
    fn answer_without_verdict_is_kept_raw() {
        for raw in [
            "{}",
            r#"{"candidato": null}"#,
            r#"{"error": "content_filter"}"#,
            r#"{"informacion_general": {"nombre": "Ana"}, "motivo_no_candidato": ""}"#,
        ] {
            assert_eq!(
                parse_answer(raw),
                ClassificationResult::Unparsed {
                    raw_response: raw.to_string()
                },
                "input {raw}"
            );
        }
    }

    #[test]
    fn raw_response_keeps_original_whitespace() {
        let raw = "  not json\n";
        match parse_answer(raw) {
            ClassificationResult::Unparsed { raw_response } => assert_eq!(raw_response, raw),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn model_failure_becomes_error_envelope() {
        let result = normalize(Err(ModelError::Timeout { secs: 60 }));
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({ "error": "model_call_failed" })
        );
    }

    #[test]
    fn model_success_is_parsed() {
        let result = normalize(Ok(full_answer().to_string()));
        assert!(result.as_classification().is_some());
    }
}
