use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::defs::AnalysisProvider;
use crate::defs::AnalysisRequest;
use crate::defs::AnalysisResult;
use crate::defs::InputReference;
use crate::defs::ProviderError;
use crate::defs::section;

#[derive(Debug, Clone)]
enum ScriptedOutcome {
    Describe,
    Result(AnalysisResult),
    Error(ProviderError),
}

/// Deterministic provider used as the reference double for orchestrator
/// tests and as the offline fallback of the CLI.
///
/// By default it describes the input it was given. A fixed result or a fixed
/// failure can be scripted instead, and an optional delay simulates a slow
/// remote analysis.
pub struct BaselineAnalysisProvider {
    name: String,
    response_delay_ms: u64,
    outcome: ScriptedOutcome,
    calls: AtomicUsize,
    seen: Mutex<Vec<AnalysisRequest>>,
}

impl BaselineAnalysisProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response_delay_ms: 0,
            outcome: ScriptedOutcome::Describe,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.response_delay_ms = delay_ms;
        self
    }

    pub fn with_result(mut self, result: AnalysisResult) -> Self {
        self.outcome = ScriptedOutcome::Result(result);
        self
    }

    pub fn with_error(mut self, error: ProviderError) -> Self {
        self.outcome = ScriptedOutcome::Error(error);
        self
    }

    /// Number of `analyze` calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn simulate_processing(&self) {
        if self.response_delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.response_delay_ms)).await;
        }
    }

    fn describe(request: &AnalysisRequest) -> AnalysisResult {
        match request.reference() {
            InputReference::UploadedBlob(blob) => {
                AnalysisResult::new(format!(
                    "Uploaded document {} ({} bytes) was received for analysis.",
                    blob.filename,
                    blob.len()
                ))
                .with_section(
                    section::KEY_FINDINGS,
                    [
                        format!("File name: {}", blob.filename),
                        format!("Declared type: {}", blob.mime_type),
                        format!("Size: {} bytes", blob.len()),
                    ],
                )
                .with_section(
                    section::RECOMMENDED_ACTIONS,
                    ["Review the findings before acting on them"],
                )
                .with_section(
                    section::COMPARATIVE_ASSESSMENT,
                    ["No reference documents were supplied for comparison"],
                )
                .with_section(
                    section::RISK_NOTES,
                    ["Content was not inspected by the baseline provider"],
                )
            }
            InputReference::RemoteLocator { url } => {
                AnalysisResult::new(format!("Remote document at {} was queued for analysis.", url))
                    .with_section(section::KEY_FINDINGS, [format!("Source: {}", url)])
                    .with_section(
                        section::RECOMMENDED_ACTIONS,
                        ["Confirm the link points at the intended document"],
                    )
                    .with_section(
                        section::RISK_NOTES,
                        ["Remote content may change between analysis runs"],
                    )
            }
            // Requests are never built for an empty reference
            InputReference::None => AnalysisResult::default(),
        }
    }
}

impl Default for BaselineAnalysisProvider {
    fn default() -> Self {
        Self::new("baseline")
    }
}

#[async_trait]
impl AnalysisProvider for BaselineAnalysisProvider {
    fn provider_name(&self) -> String {
        self.name.clone()
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        self.simulate_processing().await;

        match &self.outcome {
            ScriptedOutcome::Describe => Ok(Self::describe(request)),
            ScriptedOutcome::Result(result) => Ok(result.clone()),
            ScriptedOutcome::Error(error) => Err(error.clone()),
        }
    }
}
