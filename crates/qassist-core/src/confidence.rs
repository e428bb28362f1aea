//! Confidence tiers and the per-field apply gate.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default thresholds used by the review panel.
pub mod thresholds {
    /// At or above this: high confidence.
    pub const HIGH: f64 = 0.8;

    /// At or above this (and below [`HIGH`]): medium confidence.
    pub const MEDIUM: f64 = 0.6;

    /// Below this the single-field apply action is unavailable.
    pub const APPLY: f64 = 0.3;
}

/// Discrete confidence bucket shown next to each extracted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Lowercase label for display.
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds for classifying scores and gating single-field apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceGate {
    /// Minimum score for [`ConfidenceTier::High`].
    pub high: f64,

    /// Minimum score for [`ConfidenceTier::Medium`].
    pub medium: f64,

    /// Minimum score for applying a single field.
    pub apply: f64,
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self {
            high: thresholds::HIGH,
            medium: thresholds::MEDIUM,
            apply: thresholds::APPLY,
        }
    }
}

impl ConfidenceGate {
    /// Bucket a score. Out-of-range scores are clamped first.
    pub fn classify(&self, score: f64) -> ConfidenceTier {
        let score = clamp_score(score);
        if score >= self.high {
            ConfidenceTier::High
        } else if score >= self.medium {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// Whether a field with this score may be applied on its own.
    pub fn can_auto_apply(&self, score: f64) -> bool {
        clamp_score(score) >= self.apply
    }
}

/// Classify with the default thresholds.
pub fn classify(score: f64) -> ConfidenceTier {
    ConfidenceGate::default().classify(score)
}

/// Apply gate with the default threshold (`score >= 0.3`).
pub fn can_auto_apply(score: f64) -> bool {
    ConfidenceGate::default().can_auto_apply(score)
}

/// Force a score into `[0, 1]`. NaN counts as zero.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        debug!("NaN confidence score treated as 0.0");
        return 0.0;
    }
    let clamped = score.clamp(0.0, 1.0);
    if clamped != score {
        debug!(score, clamped, "confidence score out of range");
    }
    clamped
}
