//! Boundary to the external extraction service.

use async_trait::async_trait;
use tracing::info;

use crate::error::ExtractionError;
use crate::models::extraction::{ExtractionContext, ExtractionRequest, ExtractionResult, SourceHint};

/// Turns free-form text into a candidate record with confidence metadata.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Run one extraction. Failures are returned, never retried.
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ExtractionError>;
}

/// Build a request and delegate to `extractor`.
pub async fn extract<E: Extractor + ?Sized>(
    extractor: &E,
    raw_text: &str,
    source_hint: SourceHint,
    context: &ExtractionContext,
) -> Result<ExtractionResult, ExtractionError> {
    let request = ExtractionRequest::new(raw_text, source_hint, context)?;
    info!(source = %source_hint, chars = raw_text.len(), "requesting extraction");
    extractor.extract(&request).await
}

/// Extractor that answers every request with the same canned outcome.
///
/// Used for replaying saved service responses and in tests.
#[derive(Debug, Clone)]
pub struct StaticExtractor {
    outcome: Result<ExtractionResult, ExtractionError>,
}

impl StaticExtractor {
    /// Always succeed with `result`.
    pub fn new(result: ExtractionResult) -> Self {
        Self { outcome: Ok(result) }
    }

    /// Always fail with `error`.
    pub fn failing(error: ExtractionError) -> Self {
        Self { outcome: Err(error) }
    }
}

#[async_trait]
impl Extractor for StaticExtractor {
    async fn extract(&self, _request: &ExtractionRequest) -> Result<ExtractionResult, ExtractionError> {
        self.outcome.clone()
    }
}
