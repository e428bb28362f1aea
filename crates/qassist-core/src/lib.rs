//! Core library for AI-assisted form filling.
//!
//! This crate provides:
//! - Field paths (`items[2].sku`) with total `get`/`set` over JSON trees
//! - Confidence tiers and the single-field apply gate
//! - The immutable extraction result model and its wire format
//! - Selective merge of candidate records into live form models
//! - The extraction session controller with stale-result protection

pub mod confidence;
pub mod error;
pub mod extract;
pub mod merge;
pub mod models;
pub mod path;
pub mod review;
pub mod session;

pub use confidence::{can_auto_apply, classify, ConfidenceGate, ConfidenceTier};
pub use error::{ExtractionError, PathSyntaxError, QassistError, Result, SessionError};
pub use extract::{extract, Extractor, StaticExtractor};
pub use merge::{apply_all, apply_field, merge, FieldApplication, MergeOutcome, MergePolicy, MergeRequest};
pub use models::config::QassistConfig;
pub use models::extraction::{
    ExtractionContext, ExtractionRequest, ExtractionResponse, ExtractionResult, SourceHint,
};
pub use path::{FieldPath, Segment};
pub use review::{review_rows, ReviewRow};
pub use session::{Completion, CompletionStatus, ExtractionSession, PendingExtraction, SessionState};
