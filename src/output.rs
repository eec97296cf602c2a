//! Output types: per-page results, extracted text, and the classification
//! envelope returned to callers.
//!
//! The JSON field names of [`CandidateProfile`] and [`Classification`] are the
//! wire contract of the HTTP endpoint and match the schema embedded in the
//! classification prompt, so they stay in Spanish.

use crate::error::{PageError, MODEL_CALL_FAILED};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Extraction ───────────────────────────────────────────────────────────

/// Outcome of extracting one page through the OCR fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 0-based position of the page in the document.
    pub page_index: usize,
    /// Transcribed text; empty when the page failed.
    pub text: String,
    /// Wall-clock time spent rendering and transcribing this page.
    pub duration_ms: u64,
    /// Set when the page could not be rendered or transcribed.
    pub error: Option<PageError>,
}

impl PageResult {
    pub fn success(page_index: usize, text: String, duration_ms: u64) -> Self {
        Self {
            page_index,
            text,
            duration_ms,
            error: None,
        }
    }

    pub fn failure(page_index: usize, error: PageError, duration_ms: u64) -> Self {
        Self {
            page_index,
            text: String::new(),
            duration_ms,
            error: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Which path produced the extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// The document's embedded text layer was non-empty.
    TextLayer,
    /// The text layer was empty and pages were transcribed by the vision model.
    Ocr,
}

/// Text recovered from a document plus how it was obtained.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    /// Page texts in page order, joined by `\n` and trimmed.
    pub text: String,
    pub method: ExtractionMethod,
    /// Per-page OCR outcomes, in page order. Empty for [`ExtractionMethod::TextLayer`].
    pub pages: Vec<PageResult>,
}

impl ExtractionOutput {
    pub fn failed_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_failed()).count()
    }
}

// ── Classification ───────────────────────────────────────────────────────

/// General information the model extracts from a resume.
///
/// List entries are kept as raw JSON values: models return education and
/// experience either as strings or as small objects, and both are useful to
/// the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    #[serde(rename = "nombre", deserialize_with = "string_or_null")]
    pub name: String,
    #[serde(rename = "correo", deserialize_with = "string_or_null")]
    pub email: String,
    #[serde(rename = "teléfono", deserialize_with = "list_or_scalar")]
    pub phones: Vec<Value>,
    #[serde(rename = "educación", deserialize_with = "list_or_scalar")]
    pub education: Vec<Value>,
    #[serde(rename = "experiencia", deserialize_with = "list_or_scalar")]
    pub experience: Vec<Value>,
    #[serde(rename = "habilidades", deserialize_with = "list_or_scalar")]
    pub skills: Vec<Value>,
    #[serde(rename = "certificaciones", deserialize_with = "list_or_scalar")]
    pub certifications: Vec<Value>,
    #[serde(rename = "idiomas", deserialize_with = "list_or_scalar")]
    pub languages: Vec<Value>,
    /// Keys the model added beyond the schema (e.g. `cursos`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A successfully parsed classification answer.
///
/// `candidato` is the verdict and must be present; an answer without it is
/// not a classification. Everything else defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(
        rename = "informacion_general",
        default,
        deserialize_with = "profile_or_null"
    )]
    pub profile: CandidateProfile,
    #[serde(rename = "candidato", deserialize_with = "lenient_bool")]
    pub is_candidate: bool,
    #[serde(
        rename = "motivo_no_candidato",
        default,
        deserialize_with = "string_or_null"
    )]
    pub rejection_reason: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What the caller receives for one screened document.
///
/// Serialises untagged, so each variant is exactly the JSON object the HTTP
/// endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClassificationResult {
    /// The model's answer parsed as the expected schema.
    Classified(Classification),
    /// The answer was not parseable; kept verbatim for manual inspection.
    Unparsed { raw_response: String },
    /// The classification call itself failed.
    Failed { error: String },
}

impl ClassificationResult {
    pub fn model_call_failed() -> Self {
        ClassificationResult::Failed {
            error: MODEL_CALL_FAILED.to_string(),
        }
    }

    pub fn as_classification(&self) -> Option<&Classification> {
        match self {
            ClassificationResult::Classified(c) => Some(c),
            _ => None,
        }
    }
}

/// Full result of one screening run.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningOutput {
    pub result: ClassificationResult,
    pub extraction: ExtractionOutput,
    pub stats: ScreeningStats,
}

/// Timing for one screening run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreeningStats {
    pub extraction_duration_ms: u64,
    pub classification_duration_ms: u64,
    pub total_duration_ms: u64,
}

// ── Lenient field decoding ───────────────────────────────────────────────

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn list_or_scalar<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    })
}

fn profile_or_null<'de, D>(deserializer: D) -> Result<CandidateProfile, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<CandidateProfile>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "sí" | "si" | "yes" => Ok(true),
            "false" | "no" => Ok(false),
            other => Err(de::Error::custom(format!(
                "expected a boolean for `candidato`, got {other:?}"
            ))),
        },
        other => Err(de::Error::custom(format!(
            "expected a boolean for `candidato`, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failed_page_has_empty_text() {
        let p = PageResult::failure(
            2,
            PageError::RenderFailed {
                page: 3,
                detail: "bad".into(),
            },
            5,
        );
        assert!(p.is_failed());
        assert!(p.text.is_empty());
        assert_eq!(p.page_index, 2);
    }

    #[test]
    fn profile_defaults_missing_fields() {
        let c: Classification = serde_json::from_value(json!({
            "informacion_general": { "nombre": "Ana" },
            "candidato": false
        }))
        .unwrap();
        assert_eq!(c.profile.name, "Ana");
        assert_eq!(c.profile.email, "");
        assert!(c.profile.skills.is_empty());
        assert_eq!(c.rejection_reason, "");
    }

    #[test]
    fn scalar_phone_becomes_list() {
        let c: Classification = serde_json::from_value(json!({
            "informacion_general": { "teléfono": "555-0101", "idiomas": null },
            "candidato": true
        }))
        .unwrap();
        assert_eq!(c.profile.phones, vec![json!("555-0101")]);
        assert!(c.profile.languages.is_empty());
    }

    #[test]
    fn candidato_accepts_spanish_yes() {
        let c: Classification = serde_json::from_value(json!({ "candidato": "Sí" })).unwrap();
        assert!(c.is_candidate);
    }

    #[test]
    fn candidato_is_required() {
        assert!(serde_json::from_value::<Classification>(json!({})).is_err());
        assert!(serde_json::from_value::<Classification>(json!({ "candidato": null })).is_err());
        let r = serde_json::from_value::<Classification>(json!({
            "informacion_general": { "nombre": "Ana" }
        }));
        assert!(r.is_err());
    }

    #[test]
    fn candidato_rejects_garbage() {
        let r = serde_json::from_value::<Classification>(json!({ "candidato": "maybe" }));
        assert!(r.is_err());
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let input = json!({
            "informacion_general": { "nombre": "Ana", "cursos": ["Rust"] },
            "candidato": true,
            "motivo_no_candidato": "",
            "confianza": 0.9
        });
        let c: Classification = serde_json::from_value(input).unwrap();
        assert_eq!(c.profile.extra.get("cursos"), Some(&json!(["Rust"])));
        assert_eq!(c.extra.get("confianza"), Some(&json!(0.9)));
    }

    #[test]
    fn envelopes_serialise_flat() {
        let v = serde_json::to_value(ClassificationResult::model_call_failed()).unwrap();
        assert_eq!(v, json!({ "error": "model_call_failed" }));

        let v = serde_json::to_value(ClassificationResult::Unparsed {
            raw_response: "oops".into(),
        })
        .unwrap();
        assert_eq!(v, json!({ "raw_response": "oops" }));
    }
}
