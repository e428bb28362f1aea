//! Extraction request/response wire types and the immutable result snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::confidence::clamp_score;
use crate::error::ExtractionError;
use crate::path::{self, FieldPath};

/// Where the free-form text came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceHint {
    Email,
    Whatsapp,
    Voice,
    #[default]
    Other,
}

impl SourceHint {
    /// Wire name of the hint.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceHint::Email => "email",
            SourceHint::Whatsapp => "whatsapp",
            SourceHint::Voice => "voice",
            SourceHint::Other => "other",
        }
    }
}

impl fmt::Display for SourceHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" | "e-mail" | "mail" => Ok(SourceHint::Email),
            "whatsapp" | "wa" => Ok(SourceHint::Whatsapp),
            "voice" | "transcript" => Ok(SourceHint::Voice),
            "other" | "" => Ok(SourceHint::Other),
            other => Err(format!("unknown source hint: {}", other)),
        }
    }
}

/// Free-form defaults passed along with every extraction request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionContext {
    /// Currency to assume when the text names none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_currency: Option<String>,

    /// Unit of measure to assume for quantities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_unit: Option<String>,

    /// Any other defaults the service understands.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExtractionContext {
    /// Flatten into the `optional_context` object sent on the wire.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        if let Some(currency) = &self.default_currency {
            map.insert("default_currency".to_string(), Value::String(currency.clone()));
        }
        if let Some(unit) = &self.default_unit {
            map.insert("default_unit".to_string(), Value::String(unit.clone()));
        }
        map
    }
}

/// Body sent to the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub raw_text: String,
    pub source_hint: SourceHint,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub optional_context: Map<String, Value>,
}

impl ExtractionRequest {
    /// Build a request, rejecting blank text.
    pub fn new(
        raw_text: impl Into<String>,
        source_hint: SourceHint,
        context: &ExtractionContext,
    ) -> Result<Self, ExtractionError> {
        let raw_text = raw_text.into();
        if raw_text.trim().is_empty() {
            return Err(ExtractionError::EmptyText);
        }
        Ok(Self {
            raw_text,
            source_hint,
            optional_context: context.to_map(),
        })
    }
}

/// Body returned by the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub extracted_data: Value,
    #[serde(default)]
    pub confidence_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub unresolved_fields: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Candidate record plus confidence metadata from one extraction call.
///
/// Immutable once built. Serializes to the same shape the service returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExtractionResponse", into = "ExtractionResponse")]
pub struct ExtractionResult {
    candidate: Value,
    confidence: BTreeMap<FieldPath, f64>,
    unresolved: BTreeSet<FieldPath>,
    warnings: Vec<String>,
    suggestions: Vec<String>,
}

impl ExtractionResult {
    /// Parse a result from the service's JSON body.
    pub fn from_json(body: &str) -> Result<Self, ExtractionError> {
        let response: ExtractionResponse = serde_json::from_str(body)
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;
        Self::try_from(response)
    }

    /// The candidate record, always a JSON object.
    pub fn candidate(&self) -> &Value {
        &self.candidate
    }

    /// The candidate value at `path`, if the service produced one.
    pub fn candidate_value(&self, path: &FieldPath) -> Option<&Value> {
        path::get(&self.candidate, path)
    }

    /// Per-field confidence scores, all within `[0, 1]`.
    pub fn confidence(&self) -> &BTreeMap<FieldPath, f64> {
        &self.confidence
    }

    /// Score for a single path.
    pub fn score(&self, path: &FieldPath) -> Option<f64> {
        self.confidence.get(path).copied()
    }

    /// Fields the service could not resolve.
    pub fn unresolved(&self) -> &BTreeSet<FieldPath> {
        &self.unresolved
    }

    pub fn is_unresolved(&self, path: &FieldPath) -> bool {
        self.unresolved.contains(path)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }
}

impl TryFrom<ExtractionResponse> for ExtractionResult {
    type Error = ExtractionError;

    fn try_from(response: ExtractionResponse) -> Result<Self, Self::Error> {
        if !response.extracted_data.is_object() {
            return Err(ExtractionError::MalformedResponse(
                "extracted_data must be an object".to_string(),
            ));
        }

        let mut confidence = BTreeMap::new();
        for (raw_path, score) in response.confidence_scores {
            let path = parse_path(&raw_path)?;
            let clamped = clamp_score(score);
            if clamped != score {
                warn!(path = %path, score, "confidence score outside [0, 1], clamped");
            }
            confidence.insert(path, clamped);
        }

        let unresolved = response
            .unresolved_fields
            .iter()
            .map(|raw_path| parse_path(raw_path))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            candidate: response.extracted_data,
            confidence,
            unresolved,
            warnings: response.warnings,
            suggestions: response.suggestions,
        })
    }
}

impl From<ExtractionResult> for ExtractionResponse {
    fn from(result: ExtractionResult) -> Self {
        Self {
            extracted_data: result.candidate,
            confidence_scores: result
                .confidence
                .into_iter()
                .map(|(path, score)| (path.to_string(), score))
                .collect(),
            unresolved_fields: result.unresolved.iter().map(ToString::to_string).collect(),
            warnings: result.warnings,
            suggestions: result.suggestions,
        }
    }
}

fn parse_path(raw: &str) -> Result<FieldPath, ExtractionError> {
    FieldPath::parse(raw).map_err(|e| ExtractionError::MalformedResponse(e.to_string()))
}
