//! HTTP client for the qassist extraction service.
//!
//! Provides [`HttpExtractor`], an [`Extractor`](qassist_core::Extractor)
//! that posts an `ExtractionRequest` as JSON and decodes the service's
//! `ExtractionResponse`.

mod error;
mod http;

pub use error::ClientError;
pub use http::HttpExtractor;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
