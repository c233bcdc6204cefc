use crate::types::{
    AnalysisProvider, AnalysisRequest, AnalysisResult, AnalyzerConfig, AnalyzerError, InputReference,
    ProviderError, RequestId, Result,
};
use crate::utils::text::{normalize_whitespace, smart_truncate};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

const ERROR_EXCERPT_BYTES: usize = 200;

/// JSON body sent for remote documents
#[derive(Debug, Serialize)]
struct RemoteAnalysisBody<'a> {
    request_id: RequestId,
    url: &'a str,
}

/// Provider that forwards requests to a remote analysis service.
///
/// Remote locators are posted as JSON. Uploads are posted as the raw document
/// with its declared `Content-Type`, the filename and request id travel as
/// query parameters. A 2xx response carries the `AnalysisResult` as JSON.
pub struct HttpAnalysisProvider {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpAnalysisProvider {
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| AnalyzerError::Config("no analysis endpoint configured".to_string()))?;
        let endpoint = Url::parse(endpoint)?;

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_request(&self, request: &AnalysisRequest) -> std::result::Result<RequestBuilder, ProviderError> {
        let builder = match request.reference() {
            InputReference::RemoteLocator { url } => self
                .client
                .post(self.endpoint.clone())
                .json(&RemoteAnalysisBody {
                    request_id: request.id(),
                    url,
                }),
            InputReference::UploadedBlob(blob) => self
                .client
                .post(self.endpoint.clone())
                .query(&[
                    ("request_id", request.id().to_string()),
                    ("filename", blob.filename.clone()),
                ])
                .header(CONTENT_TYPE, blob.mime_type.as_str())
                .body(blob.bytes.clone()),
            InputReference::None => {
                return Err(ProviderError::ProviderRejected(
                    "request carries no input".to_string(),
                ))
            }
        };

        Ok(builder.timeout(self.timeout))
    }
}

#[async_trait]
impl AnalysisProvider for HttpAnalysisProvider {
    fn provider_name(&self) -> String {
        format!("http ({})", self.endpoint)
    }

    async fn analyze(&self, request: &AnalysisRequest) -> std::result::Result<AnalysisResult, ProviderError> {
        let start_time = Instant::now();
        debug!("Posting request {} to {}", request.id(), self.endpoint);

        let response = self
            .build_request(request)?
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport_error)?;
        let response_time_ms = start_time.elapsed().as_millis() as u64;

        if !status.is_success() {
            let excerpt = smart_truncate(&normalize_whitespace(&body), ERROR_EXCERPT_BYTES);
            warn!(
                "Analysis service rejected request {} with HTTP {} after {}ms",
                request.id(),
                status,
                response_time_ms
            );
            return Err(ProviderError::ProviderRejected(format!("HTTP {}: {}", status, excerpt)));
        }

        let result: AnalysisResult = serde_json::from_str(&body)
            .map_err(|e| ProviderError::UnknownError(format!("undecodable analysis response: {}", e)))?;

        info!(
            "Analysis service answered request {} in {}ms ({} bytes)",
            request.id(),
            response_time_ms,
            body.len()
        );
        Ok(result)
    }
}

fn classify_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout
    } else if error.is_decode() {
        ProviderError::UnknownError(error.to_string())
    } else {
        ProviderError::NetworkError(error.to_string())
    }
}
