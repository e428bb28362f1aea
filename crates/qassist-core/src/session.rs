//! Extraction session controller.
//!
//! One session runs one text-in, candidate-out, review, apply/reject cycle:
//!
//! ```text
//! Idle --begin--> Extracting --complete(ok)--> Reviewing --apply_all/reject--> Idle
//!                            --complete(err)-> Idle
//! ```
//!
//! Extraction is split into [`ExtractionSession::begin`], which hands out a
//! [`PendingExtraction`] tagged with the session generation, and
//! [`ExtractionSession::complete`], which drops completions from an older
//! generation. A session that was reset while a call was in flight therefore
//! never sees that call's result.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::confidence::ConfidenceGate;
use crate::error::{ExtractionError, Result, SessionError};
use crate::extract::Extractor;
use crate::merge::{self, FieldApplication, MergePolicy, MergeRequest};
use crate::models::config::QassistConfig;
use crate::models::extraction::{ExtractionContext, ExtractionRequest, ExtractionResult, SourceHint};
use crate::path::{self, FieldPath};
use crate::review::{review_rows, ReviewRow};

/// Observable session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Extracting,
    Reviewing,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Extracting => "extracting",
            SessionState::Reviewing => "reviewing",
        }
    }
}

/// Transient review state: the candidate under review and panel visibility.
#[derive(Debug, Clone, Default, PartialEq)]
struct ReviewSession {
    result: Option<ExtractionResult>,
    visible: bool,
}

impl ReviewSession {
    fn result(&self) -> Option<&ExtractionResult> {
        self.result.as_ref()
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// An extraction call issued by [`ExtractionSession::begin`].
#[derive(Debug, Clone)]
pub struct PendingExtraction {
    generation: u64,
    request: ExtractionRequest,
}

impl PendingExtraction {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The request to send to the extraction service.
    pub fn request(&self) -> &ExtractionRequest {
        &self.request
    }

    /// Call the extractor once and tag the outcome with this generation.
    pub async fn run<E: Extractor + ?Sized>(self, extractor: &E) -> Completion {
        let outcome = extractor.extract(&self.request).await;
        Completion::new(self.generation, outcome)
    }
}

/// The outcome of a pending extraction, ready to hand back to the session.
#[derive(Debug, Clone)]
pub struct Completion {
    generation: u64,
    outcome: std::result::Result<ExtractionResult, ExtractionError>,
}

impl Completion {
    /// Wrap an outcome obtained outside [`PendingExtraction::run`].
    pub fn new(
        generation: u64,
        outcome: std::result::Result<ExtractionResult, ExtractionError>,
    ) -> Self {
        Self { generation, outcome }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What [`ExtractionSession::complete`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// The result is now under review.
    Reviewing,
    /// The completion belonged to an abandoned extraction and was dropped.
    Stale,
}

/// Owns the review state for one form instance.
#[derive(Debug, Clone)]
pub struct ExtractionSession {
    state: SessionState,
    generation: u64,
    review: ReviewSession,
    applied: BTreeSet<FieldPath>,
    source_hint: SourceHint,
    context: ExtractionContext,
    gate: ConfidenceGate,
    policy: MergePolicy,
}

impl Default for ExtractionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionSession {
    /// Create an idle session with default thresholds and merge policy.
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            review: ReviewSession::default(),
            applied: BTreeSet::new(),
            source_hint: SourceHint::default(),
            context: ExtractionContext::default(),
            gate: ConfidenceGate::default(),
            policy: MergePolicy::default(),
        }
    }

    /// Create an idle session from configuration.
    pub fn from_config(config: &QassistConfig) -> Self {
        Self::new()
            .with_gate(config.confidence)
            .with_policy(config.merge)
            .with_context(config.context.clone())
            .with_source_hint(config.source_hint)
    }

    pub fn with_gate(mut self, gate: ConfidenceGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_context(mut self, context: ExtractionContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_source_hint(mut self, hint: SourceHint) -> Self {
        self.source_hint = hint;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The candidate under review, if any.
    pub fn result(&self) -> Option<&ExtractionResult> {
        self.review.result()
    }

    pub fn is_visible(&self) -> bool {
        self.review.is_visible()
    }

    /// Paths applied individually since the result arrived.
    pub fn applied(&self) -> &BTreeSet<FieldPath> {
        &self.applied
    }

    /// The last selected source hint.
    pub fn source_hint(&self) -> SourceHint {
        self.source_hint
    }

    pub fn gate(&self) -> &ConfidenceGate {
        &self.gate
    }

    /// Show the review panel again after [`hide`](Self::hide).
    pub fn show(&mut self) {
        if self.review.result.is_some() {
            self.review.visible = true;
        }
    }

    pub fn hide(&mut self) {
        self.review.visible = false;
    }

    /// Move to `Extracting` and issue a tagged extraction call.
    ///
    /// Only accepted from `Idle`.
    pub fn begin(&mut self, raw_text: &str, source_hint: SourceHint) -> Result<PendingExtraction> {
        if self.state != SessionState::Idle {
            return Err(SessionError::Busy {
                state: self.state.name(),
            }
            .into());
        }
        let request = ExtractionRequest::new(raw_text, source_hint, &self.context)?;

        self.generation = self.generation.wrapping_add(1);
        self.source_hint = source_hint;
        self.review = ReviewSession::default();
        self.applied.clear();
        self.state = SessionState::Extracting;
        info!(
            generation = self.generation,
            source = %source_hint,
            "extraction started"
        );

        Ok(PendingExtraction {
            generation: self.generation,
            request,
        })
    }

    /// Feed a finished extraction call back into the session.
    ///
    /// Completions from an older generation are ignored. A failure returns the
    /// session to `Idle` and is passed back to the caller.
    pub fn complete(&mut self, completion: Completion) -> Result<CompletionStatus> {
        if self.state != SessionState::Extracting || completion.generation != self.generation {
            warn!(
                stale = completion.generation,
                current = self.generation,
                "dropping stale extraction result"
            );
            return Ok(CompletionStatus::Stale);
        }

        match completion.outcome {
            Ok(result) => {
                info!(
                    generation = self.generation,
                    scored = result.confidence().len(),
                    unresolved = result.unresolved().len(),
                    "extraction ready for review"
                );
                self.review = ReviewSession {
                    result: Some(result),
                    visible: true,
                };
                self.state = SessionState::Reviewing;
                Ok(CompletionStatus::Reviewing)
            }
            Err(err) => {
                warn!(generation = self.generation, error = %err, "extraction failed");
                self.clear();
                Err(err.into())
            }
        }
    }

    /// Run a whole extraction against `extractor` and enter review.
    pub async fn start<E: Extractor + ?Sized>(
        &mut self,
        extractor: &E,
        raw_text: &str,
        source_hint: SourceHint,
    ) -> Result<&ExtractionResult> {
        let pending = self.begin(raw_text, source_hint)?;
        let completion = pending.run(extractor).await;
        self.complete(completion)?;
        self.result().ok_or_else(|| {
            SessionError::NotReviewing {
                state: self.state.name(),
            }
            .into()
        })
    }

    /// Merge the whole candidate into `form` and close the session.
    pub fn apply_all(&mut self, form: &Value) -> Result<Value> {
        let result = self.reviewing()?;
        let outcome = merge::merge(form, result, &MergeRequest::All, &self.policy);
        info!(fields = outcome.written.len(), "applied whole candidate");
        self.clear();
        Ok(outcome.model)
    }

    /// Apply one field by path string. The session stays open.
    pub fn apply_field(&mut self, form: &Value, path: &str) -> Result<FieldApplication> {
        let path = FieldPath::parse(path)?;
        self.apply_path(form, &path)
    }

    /// Apply one field. Blocked fields leave the form and session untouched.
    pub fn apply_path(&mut self, form: &Value, path: &FieldPath) -> Result<FieldApplication> {
        let result = self.reviewing()?;
        let application = merge::apply_field_with(form, result, path, &self.gate, &self.policy);

        match &application {
            FieldApplication::Applied(_) => {
                debug!(path = %path, "applied field");
                self.applied.insert(path.clone());
            }
            FieldApplication::WholeCandidate(_) => {
                warn!(path = %path, "field missing from candidate, applied the whole candidate");
                let leaves = path::leaf_paths(result.candidate());
                self.applied.extend(leaves);
            }
            FieldApplication::Blocked { score, .. } => {
                debug!(path = %path, score, "apply blocked by confidence gate");
            }
        }
        Ok(application)
    }

    /// Discard the candidate without merging anything. No-op when idle.
    pub fn reject(&mut self) {
        match self.state {
            SessionState::Idle => debug!("reject on idle session ignored"),
            SessionState::Extracting => {
                info!(generation = self.generation, "extraction cancelled");
                self.generation = self.generation.wrapping_add(1);
                self.clear();
            }
            SessionState::Reviewing => {
                info!(generation = self.generation, "candidate rejected");
                self.clear();
            }
        }
    }

    /// Tear the session down from any state.
    ///
    /// Any extraction still in flight becomes stale.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.clear();
    }

    /// Review rows for the current candidate against `form`.
    pub fn rows(&self, form: &Value) -> Result<Vec<ReviewRow>> {
        let result = self.reviewing()?;
        Ok(review_rows(form, result, &self.gate, &self.applied))
    }

    fn reviewing(&self) -> std::result::Result<&ExtractionResult, SessionError> {
        match (&self.state, &self.review.result) {
            (SessionState::Reviewing, Some(result)) => Ok(result),
            _ => Err(SessionError::NotReviewing {
                state: self.state.name(),
            }),
        }
    }

    fn clear(&mut self) {
        self.state = SessionState::Idle;
        self.review = ReviewSession::default();
        self.applied.clear();
    }
}
