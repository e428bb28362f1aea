//! Field-by-field diff between a candidate record and the live form.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::confidence::{ConfidenceGate, ConfidenceTier};
use crate::models::extraction::ExtractionResult;
use crate::path::{self, FieldPath};

/// One line of the review panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRow {
    pub path: FieldPath,
    /// Value proposed by the extraction service.
    pub candidate: Option<Value>,
    /// Value currently in the form.
    pub current: Option<Value>,
    pub score: Option<f64>,
    pub tier: Option<ConfidenceTier>,
    /// Whether the single-field apply action is available.
    pub can_apply: bool,
    pub unresolved: bool,
    /// Candidate and form disagree.
    pub changed: bool,
    /// Already applied in this session.
    pub applied: bool,
}

/// Build review rows for every scored path and every unscored candidate leaf.
///
/// Rows are ordered by path. Unscored rows can always be applied.
pub fn review_rows(
    form: &Value,
    result: &ExtractionResult,
    gate: &ConfidenceGate,
    applied: &BTreeSet<FieldPath>,
) -> Vec<ReviewRow> {
    let mut paths: BTreeSet<FieldPath> = result.confidence().keys().cloned().collect();
    paths.extend(path::leaf_paths(result.candidate()));

    paths
        .into_iter()
        .map(|path| {
            let candidate = result.candidate_value(&path).cloned();
            let current = path::get(form, &path).cloned();
            let score = result.score(&path);
            ReviewRow {
                tier: score.map(|s| gate.classify(s)),
                can_apply: score.is_none_or(|s| gate.can_auto_apply(s)),
                unresolved: result.is_unresolved(&path),
                changed: candidate.is_some() && candidate != current,
                applied: applied.contains(&path),
                candidate,
                current,
                score,
                path,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn p(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn test_rows_for_scenario() {
        let result: ExtractionResult = serde_json::from_value(json!({
            "extracted_data": {
                "customer": {"name": "Acme"},
                "items": [{"sku": "X1", "qty": 2}],
                "summary": "Leak at flange"
            },
            "confidence_scores": {"customer.name": 0.9, "items[0].sku": 0.4, "items[0].qty": 0.2, "customer.email": 0.7},
            "unresolved_fields": ["items[0].qty"]
        }))
        .unwrap();
        let form = json!({"customer": {"name": "Acme"}, "items": [{"sku": "OLD"}]});
        let applied = BTreeSet::from([p("items[0].sku")]);

        let rows = review_rows(&form, &result, &ConfidenceGate::default(), &applied);
        let paths: Vec<String> = rows.iter().map(|r| r.path.to_string()).collect();
        assert_eq!(
            paths,
            vec!["customer.email", "customer.name", "items[0].qty", "items[0].sku", "summary"]
        );

        let email = &rows[0];
        assert_eq!(email.candidate, None);
        assert!(!email.changed);
        assert_eq!(email.tier, Some(ConfidenceTier::Medium));

        let name = &rows[1];
        assert_eq!(name.tier, Some(ConfidenceTier::High));
        assert!(name.can_apply);
        assert!(!name.changed);

        let qty = &rows[2];
        assert_eq!(qty.tier, Some(ConfidenceTier::Low));
        assert!(!qty.can_apply);
        assert!(qty.unresolved);
        assert_eq!(qty.current, None);
        assert!(qty.changed);

        let sku = &rows[3];
        assert!(sku.can_apply);
        assert!(sku.applied);
        assert_eq!(sku.current, Some(json!("OLD")));

        let summary = &rows[4];
        assert_eq!(summary.score, None);
        assert_eq!(summary.tier, None);
        assert!(summary.can_apply);
    }
}
