use std::env;

// Use the interfaces crate for core types
pub use interfaces::defs::{AnalysisProvider, AnalysisRequest, AnalysisResult, AnalysisState, ProviderError};
pub use interfaces::defs::{InputReference, RequestId, ResultSection, UploadedBlob, section};

/// The single document type accepted for uploads
pub const DEFAULT_MEDIA_TYPE: &str = "application/pdf";

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub accepted_media_type: String,
    pub endpoint: Option<String>,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub baseline_delay_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            accepted_media_type: DEFAULT_MEDIA_TYPE.to_string(),
            endpoint: None,
            user_agent: "Document-Analyzer/1.0".to_string(),
            timeout_seconds: 60,
            baseline_delay_ms: 0,
        }
    }
}

impl AnalyzerConfig {
    /// Defaults overlaid with `ANALYZER_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(endpoint) = read("ANALYZER_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }
        if let Some(user_agent) = read("ANALYZER_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(media_type) = read("ANALYZER_MEDIA_TYPE") {
            config.accepted_media_type = media_type;
        }
        if let Some(timeout) = read("ANALYZER_TIMEOUT_SECONDS") {
            config.timeout_seconds = timeout.parse().map_err(|_| {
                AnalyzerError::Config(format!("ANALYZER_TIMEOUT_SECONDS must be a whole number of seconds, got '{}'", timeout))
            })?;
        }

        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        if endpoint.is_some() {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn with_baseline_delay(mut self, delay_ms: u64) -> Self {
        self.baseline_delay_ms = delay_ms;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Invalid file: declared type '{declared}' is not {accepted}")]
    InvalidInputKind { declared: String, accepted: String },

    #[error("No document selected: upload a file or provide a URL first")]
    NoInputSelected,

    #[error("An analysis is already in progress")]
    AlreadyInProgress,

    #[error("Analysis failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
