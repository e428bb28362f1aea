//! Selective merge of an extraction candidate into a live form model.
//!
//! One [`merge`] operation serves both bulk and per-field application,
//! driven by [`MergeRequest`]. The form passed in is never modified; the
//! returned model replaces it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::confidence::ConfidenceGate;
use crate::error::PathSyntaxError;
use crate::models::extraction::ExtractionResult;
use crate::path::{self, FieldPath, Segment};

/// How candidate arrays combine with destination arrays in bulk merges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayMerge {
    /// Merge element `i` of the candidate into element `i` of the form.
    /// Extra form elements are kept.
    #[default]
    ByIndex,
    /// The candidate array replaces the form array.
    Replace,
}

/// Bulk merge behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePolicy {
    pub arrays: ArrayMerge,

    /// Leave form fields alone where the candidate holds `null`. Off by
    /// default: a key the candidate defines is written, even as `null`.
    pub skip_nulls: bool,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            arrays: ArrayMerge::ByIndex,
            skip_nulls: false,
        }
    }
}

/// Which candidate fields to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeRequest {
    /// Every field the candidate defines.
    All,
    /// Only these paths.
    Selected(BTreeSet<FieldPath>),
}

impl MergeRequest {
    /// Request a single field.
    pub fn field(path: FieldPath) -> Self {
        MergeRequest::Selected(BTreeSet::from([path]))
    }
}

/// Result of a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The new form model.
    pub model: Value,
    /// Paths that received a candidate value.
    pub written: Vec<FieldPath>,
    /// A selected path was missing from the candidate, so the whole
    /// candidate was merged instead.
    pub fell_back: bool,
}

/// Merge `result`'s candidate into a copy of `form`.
///
/// For [`MergeRequest::Selected`], every path is read from the candidate and
/// written at the same place in the form. If any selected path is absent from
/// the candidate, the whole candidate is merged as for [`MergeRequest::All`].
/// No confidence check happens here.
pub fn merge(
    form: &Value,
    result: &ExtractionResult,
    request: &MergeRequest,
    policy: &MergePolicy,
) -> MergeOutcome {
    let paths = match request {
        MergeRequest::All => return merge_all(form, result.candidate(), policy),
        MergeRequest::Selected(paths) => paths,
    };

    let missing: Vec<String> = paths
        .iter()
        .filter(|p| result.candidate_value(p).is_none())
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        warn!(
            missing = ?missing,
            "selected fields absent from candidate, applying the whole candidate"
        );
        let mut outcome = merge_all(form, result.candidate(), policy);
        outcome.fell_back = true;
        return outcome;
    }

    let mut model = form.clone();
    let mut written = Vec::with_capacity(paths.len());
    for path in paths {
        if let Some(value) = result.candidate_value(path) {
            debug!(path = %path, "applying candidate field");
            path::set_in_place(&mut model, path, value.clone());
            written.push(path.clone());
        }
    }

    MergeOutcome {
        model,
        written,
        fell_back: false,
    }
}

fn merge_all(form: &Value, candidate: &Value, policy: &MergePolicy) -> MergeOutcome {
    let mut model = if form.is_object() {
        form.clone()
    } else {
        Value::Object(Map::new())
    };
    let mut written = Vec::new();
    overlay(&mut model, candidate, policy, &mut Vec::new(), &mut written);
    debug!(fields = written.len(), "merged whole candidate");

    MergeOutcome {
        model,
        written,
        fell_back: false,
    }
}

fn overlay(
    dest: &mut Value,
    src: &Value,
    policy: &MergePolicy,
    prefix: &mut Vec<Segment>,
    written: &mut Vec<FieldPath>,
) {
    match (dest, src) {
        (Value::Object(dest), Value::Object(src)) => {
            for (key, value) in src {
                if value.is_null() && policy.skip_nulls {
                    continue;
                }
                prefix.push(Segment::Key(key.clone()));
                let slot = dest.entry(key.clone()).or_insert(Value::Null);
                overlay(slot, value, policy, prefix, written);
                prefix.pop();
            }
        }
        (Value::Array(dest), Value::Array(src)) if policy.arrays == ArrayMerge::ByIndex => {
            for (index, value) in src.iter().enumerate() {
                if index < dest.len() && value.is_null() && policy.skip_nulls {
                    continue;
                }
                if index >= dest.len() {
                    dest.push(Value::Null);
                }
                prefix.push(Segment::Index(index));
                overlay(&mut dest[index], value, policy, prefix, written);
                prefix.pop();
            }
        }
        (dest, src) => {
            *dest = src.clone();
            if let Some(path) = FieldPath::from_segments(prefix.clone()) {
                written.push(path);
            }
        }
    }
}

/// Outcome of a single-field apply.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldApplication {
    /// Only the requested field was written.
    Applied(Value),
    /// The field was absent from the candidate; the whole candidate was merged.
    WholeCandidate(Value),
    /// The field's score is below the apply threshold; nothing was written.
    Blocked { path: FieldPath, score: f64 },
}

impl FieldApplication {
    /// The new form model, unless the apply was blocked.
    pub fn into_model(self) -> Option<Value> {
        match self {
            FieldApplication::Applied(model) | FieldApplication::WholeCandidate(model) => Some(model),
            FieldApplication::Blocked { .. } => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, FieldApplication::Blocked { .. })
    }
}

/// Write every candidate field into `form` with the default policy.
pub fn apply_all(form: &Value, result: &ExtractionResult) -> Value {
    merge(form, result, &MergeRequest::All, &MergePolicy::default()).model
}

/// Apply one field by path string with the default gate and policy.
pub fn apply_field(
    form: &Value,
    result: &ExtractionResult,
    path: &str,
) -> Result<FieldApplication, PathSyntaxError> {
    let path = FieldPath::parse(path)?;
    Ok(apply_field_with(
        form,
        result,
        &path,
        &ConfidenceGate::default(),
        &MergePolicy::default(),
    ))
}

/// Apply one field, honoring the confidence gate.
///
/// Fields without a score are not gated.
pub fn apply_field_with(
    form: &Value,
    result: &ExtractionResult,
    path: &FieldPath,
    gate: &ConfidenceGate,
    policy: &MergePolicy,
) -> FieldApplication {
    if let Some(score) = result.score(path) {
        if !gate.can_auto_apply(score) {
            debug!(path = %path, score, "field below apply threshold");
            return FieldApplication::Blocked {
                path: path.clone(),
                score,
            };
        }
    }

    let outcome = merge(form, result, &MergeRequest::field(path.clone()), policy);
    if outcome.fell_back {
        FieldApplication::WholeCandidate(outcome.model)
    } else {
        FieldApplication::Applied(outcome.model)
    }
}
