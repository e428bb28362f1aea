//! Configuration structures for extraction and merging.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceGate;
use crate::error::{QassistError, Result};
use crate::merge::MergePolicy;
use crate::models::extraction::{ExtractionContext, SourceHint};

/// Main configuration for qassist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QassistConfig {
    /// Extraction service connection.
    pub service: ServiceConfig,

    /// Confidence tier and apply thresholds.
    pub confidence: ConfidenceGate,

    /// How candidate records are merged into forms.
    pub merge: MergePolicy,

    /// Defaults sent with every extraction request.
    pub context: ExtractionContext,

    /// Source hint used when none is given.
    pub source_hint: SourceHint,
}

/// Extraction service connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the backend (no trailing slash needed).
    pub base_url: String,

    /// Path of the extraction endpoint.
    pub endpoint: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Environment variable holding a bearer token, if the service needs one.
    pub api_key_env: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            endpoint: "/api/ai/extract".to_string(),
            timeout_secs: 60,
            api_key_env: None,
        }
    }
}

impl ServiceConfig {
    /// Full URL of the extraction endpoint.
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }
}

impl QassistConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that thresholds are ordered and within `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let gate = &self.confidence;
        for (name, value) in [("high", gate.high), ("medium", gate.medium), ("apply", gate.apply)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(QassistError::Config(format!(
                    "confidence.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if gate.medium > gate.high {
            return Err(QassistError::Config(format!(
                "confidence.medium ({}) exceeds confidence.high ({})",
                gate.medium, gate.high
            )));
        }
        if self.service.base_url.is_empty() {
            return Err(QassistError::Config("service.base_url is empty".to_string()));
        }
        Ok(())
    }
}
