//! Error types for the qassist-core library.

use std::fmt;

use thiserror::Error;

/// Main error type for the qassist library.
#[derive(Error, Debug)]
pub enum QassistError {
    /// Malformed field path.
    #[error(transparent)]
    Path(#[from] PathSyntaxError),

    /// Extraction collaborator error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Session state machine error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A field path string that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid field path `{path}` at byte {position} (segment `{segment}`): {kind}")]
pub struct PathSyntaxError {
    /// The full path string as given.
    pub path: String,
    /// Byte offset where parsing failed.
    pub position: usize,
    /// The segment text that failed.
    pub segment: String,
    /// What went wrong.
    pub kind: PathErrorKind,
}

/// Reason a field path failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathErrorKind {
    /// The path string is empty.
    Empty,
    /// The path ends with a `.`.
    TrailingDot,
    /// A `.` is not followed by a key (leading or doubled dot).
    EmptySegment,
    /// A `[` has no matching `]`.
    UnclosedBracket,
    /// A `]` has no matching `[`.
    UnopenedBracket,
    /// Bracket content is empty or not a non-negative integer.
    InvalidIndex,
    /// The index is above [`MAX_INDEX`](crate::path::MAX_INDEX).
    IndexTooLarge,
    /// Something other than `.` or `[` follows a `]`.
    UnexpectedCharacter,
}

impl fmt::Display for PathErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PathErrorKind::Empty => "path is empty",
            PathErrorKind::TrailingDot => "trailing dot",
            PathErrorKind::EmptySegment => "empty key segment",
            PathErrorKind::UnclosedBracket => "unmatched `[`",
            PathErrorKind::UnopenedBracket => "unmatched `]`",
            PathErrorKind::InvalidIndex => "index must be a non-negative integer",
            PathErrorKind::IndexTooLarge => {
                return write!(f, "index is larger than {}", crate::path::MAX_INDEX);
            }
            PathErrorKind::UnexpectedCharacter => "expected `.` or `[` after `]`",
        };
        f.write_str(msg)
    }
}

/// Errors surfaced by the extraction collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Nothing to extract from.
    #[error("input text is empty")]
    EmptyText,

    /// The request never produced a response (connect, timeout, TLS).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Service { status: u16, body: String },

    /// The service is throttling requests.
    #[error("extraction service rate limit reached")]
    RateLimited,

    /// The response could not be turned into an extraction result.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors raised by the extraction session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// An extraction or review is already in progress.
    #[error("cannot start an extraction while {state}")]
    Busy { state: &'static str },

    /// The operation needs a candidate under review.
    #[error("no extraction under review (session is {state})")]
    NotReviewing { state: &'static str },
}

/// Result type for the qassist library.
pub type Result<T> = std::result::Result<T, QassistError>;
