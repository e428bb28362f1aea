//! reqwest-backed extractor.

use std::time::Duration;

use async_trait::async_trait;
use qassist_core::models::config::ServiceConfig;
use qassist_core::{ExtractionError, ExtractionRequest, ExtractionResponse, ExtractionResult, Extractor};
use tracing::{debug, info};

use crate::error::ClientError;
use crate::Result;

/// Extractor that calls the extraction service over HTTP.
pub struct HttpExtractor {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpExtractor {
    /// Build a client from service settings.
    ///
    /// When `api_key_env` is set, the variable must exist; its value is sent
    /// as a bearer token.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let api_key = match &config.api_key_env {
            Some(var) => {
                Some(std::env::var(var).map_err(|_| ClientError::MissingApiKey(var.clone()))?)
            }
            None => None,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url(),
            api_key,
        })
    }

    /// Endpoint this client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        info!(url = %self.url, source = %request.source_hint, "calling extraction service");

        let mut builder = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!(status, bytes = body.len(), "extraction service responded");

        decode_response(status, &body)
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> std::result::Result<ExtractionResult, ExtractionError> {
        self.send(request).await.map_err(Into::into)
    }
}

/// Turn a status code and body into an extraction result.
fn decode_response(status: u16, body: &str) -> Result<ExtractionResult> {
    if status == 429 {
        return Err(ClientError::RateLimited);
    }
    if !(200..300).contains(&status) {
        return Err(ClientError::Server {
            status,
            body: body.to_string(),
        });
    }

    let response: ExtractionResponse = serde_json::from_str(body)?;
    let result = ExtractionResult::try_from(response)?;
    info!(
        scored = result.confidence().len(),
        warnings = result.warnings().len(),
        "extraction decoded"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use qassist_core::FieldPath;

    const BODY: &str = r#"{
        "extracted_data": {"customer": {"name": "Acme"}, "items": [{"sku": "X1", "qty": 2}]},
        "confidence_scores": {"customer.name": 0.9, "items[0].sku": 0.4},
        "unresolved_fields": [],
        "warnings": ["currency assumed"],
        "suggestions": []
    }"#;

    #[test]
    fn test_decode_success() {
        let result = decode_response(200, BODY).unwrap();
        assert_eq!(result.score(&FieldPath::parse("customer.name").unwrap()), Some(0.9));
        assert_eq!(result.warnings(), &["currency assumed".to_string()]);
    }

    #[test]
    fn test_decode_status_errors() {
        assert!(matches!(decode_response(429, ""), Err(ClientError::RateLimited)));

        match decode_response(502, "bad gateway") {
            Err(ClientError::Server { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_decode_malformed_bodies() {
        assert!(matches!(decode_response(200, "not json"), Err(ClientError::Json(_))));
        assert!(matches!(
            decode_response(200, r#"{"extracted_data": "text"}"#),
            Err(ClientError::Invalid(ExtractionError::MalformedResponse(_)))
        ));
    }

    #[test]
    fn test_client_errors_map_to_extraction_errors() {
        let err: ExtractionError = ClientError::RateLimited.into();
        assert_eq!(err, ExtractionError::RateLimited);

        let err: ExtractionError = ClientError::Server {
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        assert_eq!(
            err,
            ExtractionError::Service {
                status: 500,
                body: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_missing_api_key_variable() {
        let config = ServiceConfig {
            api_key_env: Some("QASSIST_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..ServiceConfig::default()
        };
        assert!(matches!(
            HttpExtractor::new(&config),
            Err(ClientError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_url_from_config() {
        let config = ServiceConfig {
            base_url: "https://qms.example.com/".to_string(),
            ..ServiceConfig::default()
        };
        let client = HttpExtractor::new(&config).unwrap();
        assert_eq!(client.url(), "https://qms.example.com/api/ai/extract");
    }
}
