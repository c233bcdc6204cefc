use crate::types::{
    AnalysisProvider, AnalysisRequest, AnalysisResult, AnalysisState, AnalyzerError, InputReference,
    ProviderError, RequestId, Result,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Why a trigger was turned away without starting a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoInputSelected,
    AlreadyInProgress,
}

/// Notifications for the presentation layer, one per visible change
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    Started {
        request_id: RequestId,
        at: DateTime<Utc>,
    },
    Succeeded {
        request_id: RequestId,
        sections: usize,
    },
    Failed {
        request_id: RequestId,
        reason: ProviderError,
    },
    Rejected {
        reason: Rejection,
    },
}

impl fmt::Display for AnalysisEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { .. } => write!(f, "Analyzing document..."),
            Self::Succeeded { .. } => write!(f, "Analysis complete"),
            Self::Failed { reason, .. } => write!(f, "Analysis failed: {}", reason),
            Self::Rejected { reason: Rejection::NoInputSelected } => {
                write!(f, "No document selected: upload a file or provide a URL first")
            }
            Self::Rejected { reason: Rejection::AlreadyInProgress } => {
                write!(f, "An analysis is already in progress")
            }
        }
    }
}

/// Drives a single-flight analysis over the resolved input.
///
/// At most one request is outstanding at a time. The state lock is never held
/// across the provider call, so readers always observe `Running` while a
/// request is out, and the single-flight check and the switch to `Running`
/// happen under one write guard.
pub struct AnalysisOrchestrator {
    provider: Arc<dyn AnalysisProvider>,
    state: Arc<RwLock<AnalysisState>>,
    events: broadcast::Sender<AnalysisEvent>,
}

impl AnalysisOrchestrator {
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            provider,
            state: Arc::new(RwLock::new(AnalysisState::Idle)),
            events,
        }
    }

    pub fn provider_name(&self) -> String {
        self.provider.provider_name()
    }

    /// Snapshot of the current state
    pub async fn current_state(&self) -> AnalysisState {
        self.state.read().await.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_running()
    }

    /// Whether `trigger` would start a run for `reference` right now
    pub async fn can_trigger(&self, reference: &InputReference) -> bool {
        !reference.is_none() && !self.is_running().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisEvent> {
        self.events.subscribe()
    }

    /// Validate `reference`, snapshot it and move to `Running`.
    ///
    /// The returned request must be resolved through `complete`.
    pub async fn begin(&self, reference: &InputReference) -> Result<AnalysisRequest> {
        let request = match AnalysisRequest::snapshot(reference) {
            Some(request) => request,
            None => {
                warn!("Trigger rejected: no input selected");
                self.emit(AnalysisEvent::Rejected { reason: Rejection::NoInputSelected });
                return Err(AnalyzerError::NoInputSelected);
            }
        };

        let mut state = self.state.write().await;
        if let Some(in_flight) = state.in_flight().map(|in_flight| in_flight.id()) {
            drop(state);
            debug!("Trigger rejected: request {} is still running", in_flight);
            self.emit(AnalysisEvent::Rejected { reason: Rejection::AlreadyInProgress });
            return Err(AnalyzerError::AlreadyInProgress);
        }

        let previous = state.name();
        *state = AnalysisState::Running { request: request.clone() };
        drop(state);

        info!(
            "Analysis {} started for {} (was {})",
            request.id(),
            request.reference(),
            previous
        );
        self.emit(AnalysisEvent::Started {
            request_id: request.id(),
            at: request.requested_at(),
        });

        Ok(request)
    }

    /// Apply the provider's outcome for `request`.
    ///
    /// Returns `false` and leaves the state alone when `request` is not the
    /// one currently in flight.
    pub async fn complete(
        &self,
        request: &AnalysisRequest,
        outcome: std::result::Result<AnalysisResult, ProviderError>,
    ) -> bool {
        apply_resolution(&self.state, &self.events, request, outcome).await
    }

    /// Run one analysis to completion and return the resulting state.
    ///
    /// The provider call runs on its own task, so a caller that stops
    /// awaiting (a timeout, a `select!`) does not strand the run in `Running`:
    /// the outcome is still applied when it arrives.
    pub async fn trigger(&self, reference: &InputReference) -> Result<AnalysisState> {
        let request = self.begin(reference).await?;

        if let Err(e) = self.resolve_in_background(request.clone()).await {
            let reason = ProviderError::UnknownError(format!("analysis task failed: {}", e));
            self.complete(&request, Err(reason)).await;
        }

        Ok(self.current_state().await)
    }

    /// Start an analysis and resolve it in the background.
    ///
    /// The background task only holds a weak reference to the state; if the
    /// orchestrator is dropped first the late outcome is discarded. The
    /// handle yields whether the outcome was applied.
    pub async fn dispatch(&self, reference: &InputReference) -> Result<JoinHandle<bool>> {
        let request = self.begin(reference).await?;
        Ok(self.resolve_in_background(request))
    }

    /// Drive the provider call for `request` and apply its outcome exactly
    /// once. A panicking provider resolves the run as `UnknownError`.
    fn resolve_in_background(&self, request: AnalysisRequest) -> JoinHandle<bool> {
        let provider = self.provider.clone();
        let state = Arc::downgrade(&self.state);
        let events = self.events.clone();

        tokio::spawn(async move {
            debug!(
                "Invoking provider {} for request {}",
                provider.provider_name(),
                request.id()
            );
            let call = {
                let request = request.clone();
                tokio::spawn(async move { provider.analyze(&request).await })
            };
            let outcome = match call.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Provider task for request {} failed: {}", request.id(), e);
                    Err(ProviderError::UnknownError(format!("provider task failed: {}", e)))
                }
            };

            match state.upgrade() {
                Some(state) => apply_resolution(&state, &events, &request, outcome).await,
                None => {
                    debug!(
                        "Orchestrator dropped before request {} resolved, discarding outcome",
                        request.id()
                    );
                    false
                }
            }
        })
    }

    fn emit(&self, event: AnalysisEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

async fn apply_resolution(
    state: &RwLock<AnalysisState>,
    events: &broadcast::Sender<AnalysisEvent>,
    request: &AnalysisRequest,
    outcome: std::result::Result<AnalysisResult, ProviderError>,
) -> bool {
    let mut current = state.write().await;

    let is_in_flight = current
        .in_flight()
        .is_some_and(|in_flight| in_flight.is_same_request(request));
    if !is_in_flight {
        warn!(
            "Discarding stale outcome for request {} (state is {})",
            request.id(),
            current.name()
        );
        return false;
    }

    let event = match outcome {
        Ok(result) => {
            let sections = result.sections().len();
            info!("Analysis {} succeeded with {} sections", request.id(), sections);
            *current = AnalysisState::Succeeded { result };
            AnalysisEvent::Succeeded {
                request_id: request.id(),
                sections,
            }
        }
        Err(reason) => {
            warn!("Analysis {} failed: {}", request.id(), reason);
            *current = AnalysisState::Failed { reason: reason.clone() };
            AnalysisEvent::Failed {
                request_id: request.id(),
                reason,
            }
        }
    };
    drop(current);

    let _ = events.send(event);
    true
}
