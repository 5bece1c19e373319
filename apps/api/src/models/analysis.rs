//! Payloads produced by the external analysis service.
//!
//! The service returns the model output as a JSON string that is sometimes
//! wrapped in a Markdown code fence. Older deployments return it as an object.
//! Both shapes are accepted here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Characters kept in the short letter when the service did not return JSON.
pub const COVER_LETTER_PREVIEW_CHARS: usize = 1000;

/// One proposed edit to the résumé.
///
/// `current_text: None` (or blank) means the suggestion adds new content
/// rather than replacing existing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default = "default_section", deserialize_with = "nullable_section")]
    pub section: String,
    #[serde(default)]
    pub current_text: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub suggested_text: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub reason: String,
}

impl Suggestion {
    /// The text this suggestion replaces, or `None` for a pure addition.
    pub fn replaces(&self) -> Option<&str> {
        self.current_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    /// Upper-cased section name used in labeled blocks, e.g. `[NEW SKILLS]`.
    pub fn section_label(&self) -> String {
        match self.section.trim() {
            "" => "GENERAL".to_string(),
            section => section.to_uppercase(),
        }
    }
}

fn default_section() -> String {
    "general".to_string()
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_section))
}

/// The score is requested as "score out of 100 with explanation"; models
/// answer with either a bare number or a sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverallScore {
    Points(f64),
    Narrative(String),
}

/// Typed analysis catalog consumed by the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub skills_gap: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub ats_keywords: Vec<String>,
    #[serde(default)]
    pub overall_score: Option<OverallScore>,
}

/// Envelope returned by `POST /api/analyze` on the analysis service.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisEnvelope {
    #[serde(default)]
    pub analysis_id: Option<String>,
    pub analysis: Value,
}

/// A parsed analysis together with its identity.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub analysis_id: String,
    pub report: AnalysisReport,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetters {
    #[serde(default)]
    pub cover_letter_id: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub short_version: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub long_version: String,
}

/// Parses the `analysis` field, whether it holds a JSON string or an object.
pub fn parse_analysis(value: &Value) -> Result<AnalysisReport, serde_json::Error> {
    match value {
        Value::String(text) => serde_json::from_str(strip_json_fences(text)),
        other => AnalysisReport::deserialize(other),
    }
}

/// Parses a cover-letter response. Text that is not JSON becomes the long
/// letter, and its first `COVER_LETTER_PREVIEW_CHARS` characters the short one.
pub fn parse_cover_letters(raw: &str) -> CoverLetters {
    let text = strip_json_fences(raw);
    if let Ok(letters) = serde_json::from_str::<CoverLetters>(text) {
        return letters;
    }

    let long_version = text.to_string();
    let short_version = match long_version.char_indices().nth(COVER_LETTER_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &long_version[..cut]),
        None => long_version.clone(),
    };

    CoverLetters {
        cover_letter_id: None,
        short_version,
        long_version,
    }
}

/// Extracts the body of a ```json ... ``` (or bare ```) fence, wherever it
/// sits in the text. Text without a fence is returned trimmed.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(open) = text.find("```") else {
        return text;
    };

    let rest = &text[open + 3..];
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.find("```") {
        Some(close) => rest[..close].trim(),
        None => rest.trim(),
    }
}
