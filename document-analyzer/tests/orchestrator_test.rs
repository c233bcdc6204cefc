use async_trait::async_trait;
use document_analyzer::{
    types::*, AnalysisEvent, AnalysisOrchestrator, BaselineAnalysisProvider, InputResolver, Rejection,
};
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing::info;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

fn remote(url: &str) -> InputReference {
    InputReference::RemoteLocator { url: url.to_string() }
}

fn upload(name: &str) -> InputReference {
    InputReference::UploadedBlob(Arc::new(UploadedBlob::new(
        b"%PDF-1.7".to_vec(),
        DEFAULT_MEDIA_TYPE,
        name,
    )))
}

#[tokio::test]
async fn test_trigger_without_input_is_rejected() -> Result<()> {
    init_tracing();

    let provider = Arc::new(BaselineAnalysisProvider::new("baseline"));
    let orchestrator = AnalysisOrchestrator::new(provider.clone());

    let rejected = orchestrator.trigger(&InputReference::None).await;
    assert!(matches!(rejected, Err(AnalyzerError::NoInputSelected)));
    assert_eq!(orchestrator.current_state().await, AnalysisState::Idle);

    // Also leaves a completed state untouched
    orchestrator.trigger(&remote("https://example.com/a.pdf")).await?;
    let completed = orchestrator.current_state().await;
    assert_eq!(completed.name(), "succeeded");

    let rejected = orchestrator.trigger(&InputReference::None).await;
    assert!(matches!(rejected, Err(AnalyzerError::NoInputSelected)));
    assert_eq!(orchestrator.current_state().await, completed);
    assert_eq!(provider.call_count(), 1, "Rejected triggers never reach the provider");

    Ok(())
}

#[tokio::test]
async fn test_single_flight_rejects_concurrent_trigger() -> Result<()> {
    init_tracing();

    let provider = Arc::new(BaselineAnalysisProvider::new("slow").with_delay(100));
    let orchestrator = AnalysisOrchestrator::new(provider.clone());
    let first = remote("https://example.com/first.pdf");
    let second = upload("second.pdf");

    let (first_outcome, second_outcome) =
        futures::join!(orchestrator.trigger(&first), orchestrator.trigger(&second));

    let first_state = first_outcome?;
    assert_eq!(first_state.name(), "succeeded");
    assert!(matches!(second_outcome, Err(AnalyzerError::AlreadyInProgress)));
    assert_eq!(provider.call_count(), 1, "Only one run may be outstanding");
    assert_eq!(provider.requests()[0].reference(), &first);

    info!("Single-flight test completed successfully!");
    Ok(())
}

#[tokio::test]
async fn test_running_state_rejects_any_input() -> Result<()> {
    let provider = Arc::new(BaselineAnalysisProvider::new("baseline"));
    let orchestrator = AnalysisOrchestrator::new(provider.clone());

    let request = orchestrator.begin(&upload("offer.pdf")).await?;
    assert!(orchestrator.is_running().await);

    for reference in [upload("offer.pdf"), remote("https://example.com/b.pdf")] {
        assert!(!orchestrator.can_trigger(&reference).await);
        let rejected = orchestrator.begin(&reference).await;
        assert!(matches!(rejected, Err(AnalyzerError::AlreadyInProgress)));
    }

    // The first run is still the one in flight
    let state = orchestrator.current_state().await;
    assert!(state.in_flight().is_some_and(|in_flight| in_flight.is_same_request(&request)));

    assert!(orchestrator.complete(&request, Ok(AnalysisResult::new("done"))).await);
    assert!(!orchestrator.is_running().await);
    assert_eq!(provider.call_count(), 0, "begin/complete never calls the provider");

    Ok(())
}

#[tokio::test]
async fn test_retrigger_after_completion_uses_new_snapshot() -> Result<()> {
    init_tracing();

    let failing = Arc::new(
        BaselineAnalysisProvider::new("failing")
            .with_error(ProviderError::NetworkError("connection reset".to_string())),
    );
    let orchestrator = AnalysisOrchestrator::new(failing.clone());

    let state = orchestrator.trigger(&remote("https://example.com/a.pdf")).await?;
    assert_eq!(
        state,
        AnalysisState::Failed { reason: ProviderError::NetworkError("connection reset".to_string()) }
    );
    assert_eq!(failing.call_count(), 1, "Failures are not retried automatically");

    // Failed is re-enterable
    let request = orchestrator.begin(&upload("retry.pdf")).await?;
    assert!(orchestrator.is_running().await);
    orchestrator.complete(&request, Err(ProviderError::Timeout)).await;
    assert_eq!(orchestrator.current_state().await.failure(), Some(&ProviderError::Timeout));

    // Succeeded is re-enterable and the prior result is discarded
    let provider = Arc::new(BaselineAnalysisProvider::new("baseline"));
    let orchestrator = AnalysisOrchestrator::new(provider.clone());
    orchestrator.trigger(&remote("https://example.com/one.pdf")).await?;
    let state = orchestrator.trigger(&remote("https://example.com/two.pdf")).await?;

    let summary = state.result().map(|result| result.summary().to_string()).unwrap_or_default();
    assert!(summary.contains("two.pdf"), "Second run reports the second input");
    assert_eq!(provider.requests()[1].reference(), &remote("https://example.com/two.pdf"));

    Ok(())
}

#[tokio::test]
async fn test_stale_resolution_is_discarded() -> Result<()> {
    init_tracing();

    let orchestrator = AnalysisOrchestrator::new(Arc::new(BaselineAnalysisProvider::default()));
    let reference = remote("https://example.com/a.pdf");

    let old = orchestrator.begin(&reference).await?;
    assert!(orchestrator.complete(&old, Err(ProviderError::Timeout)).await);

    let current = orchestrator.begin(&reference).await?;

    // Same content, different identity
    let late = orchestrator
        .complete(&old, Ok(AnalysisResult::new("late").with_section("notes", ["stale"])))
        .await;
    assert!(!late, "Outcome of a superseded request must be dropped");
    assert!(orchestrator
        .current_state()
        .await
        .in_flight()
        .is_some_and(|in_flight| in_flight.is_same_request(&current)));

    let fresh = AnalysisResult::new("fresh");
    assert!(orchestrator.complete(&current, Ok(fresh.clone())).await);
    assert_eq!(orchestrator.current_state().await.result(), Some(&fresh));

    // Nothing overwrites a completed state either, including a replayed outcome
    assert!(!orchestrator.complete(&old, Err(ProviderError::UnknownError("late".into()))).await);
    assert!(!orchestrator.complete(&current, Err(ProviderError::Timeout)).await);
    assert_eq!(orchestrator.current_state().await.result(), Some(&fresh));

    Ok(())
}

#[tokio::test]
async fn test_in_flight_request_is_a_snapshot() -> Result<()> {
    init_tracing();

    let provider = Arc::new(BaselineAnalysisProvider::new("slow").with_delay(50));
    let orchestrator = AnalysisOrchestrator::new(provider.clone());
    let mut resolver = InputResolver::new(DEFAULT_MEDIA_TYPE);

    resolver.set_upload(UploadedBlob::new(b"%PDF-1.7".to_vec(), DEFAULT_MEDIA_TYPE, "offer.pdf"))?;
    let handle = orchestrator.dispatch(&resolver.current_reference()).await?;

    // Mutating the resolver while the run is in flight
    resolver.set_remote_url("https://example.com/other.pdf");
    let state = orchestrator.current_state().await;
    let in_flight = state.in_flight().expect("run is in flight");
    assert_eq!(
        in_flight.reference().upload().map(|blob| blob.filename.as_str()),
        Some("offer.pdf")
    );

    assert!(handle.await.expect("analysis task completes"));
    let seen = provider.requests();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].reference().is_upload(), "Provider saw the snapshot, not the new URL");

    Ok(())
}

#[tokio::test]
async fn test_late_outcome_after_teardown_is_dropped() -> Result<()> {
    let provider = Arc::new(BaselineAnalysisProvider::new("slow").with_delay(50));
    let orchestrator = AnalysisOrchestrator::new(provider.clone());

    let handle = orchestrator.dispatch(&remote("https://example.com/a.pdf")).await?;
    drop(orchestrator);

    let applied = handle.await.expect("analysis task completes");
    assert!(!applied, "No orchestrator left to receive the outcome");
    assert_eq!(provider.call_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_abandoned_trigger_still_resolves() -> Result<()> {
    init_tracing();

    let provider = Arc::new(BaselineAnalysisProvider::new("slow").with_delay(100));
    let orchestrator = AnalysisOrchestrator::new(provider.clone());
    let reference = remote("https://example.com/a.pdf");

    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), orchestrator.trigger(&reference)).await;
    assert!(abandoned.is_err(), "Caller gave up before the provider answered");
    assert!(orchestrator.is_running().await);

    tokio::time::sleep(Duration::from_millis(400)).await;
    let state = orchestrator.current_state().await;
    assert_eq!(state.name(), "succeeded", "Run resolved without anyone awaiting it");

    let state = orchestrator.trigger(&remote("https://example.com/b.pdf")).await?;
    assert_eq!(state.name(), "succeeded");
    assert_eq!(provider.call_count(), 2);

    info!("Abandoned trigger test completed successfully!");
    Ok(())
}

struct PanickingProvider;

#[async_trait]
impl AnalysisProvider for PanickingProvider {
    fn provider_name(&self) -> String {
        "panicking".to_string()
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> std::result::Result<AnalysisResult, ProviderError> {
        panic!("provider bug");
    }
}

#[tokio::test]
async fn test_panicking_provider_fails_the_run() -> Result<()> {
    let orchestrator = AnalysisOrchestrator::new(Arc::new(PanickingProvider));

    let state = orchestrator.trigger(&remote("https://example.com/a.pdf")).await?;
    assert!(
        matches!(state.failure(), Some(ProviderError::UnknownError(_))),
        "unexpected state: {:?}",
        state
    );

    let handle = orchestrator.dispatch(&remote("https://example.com/b.pdf")).await?;
    assert!(handle.await.expect("resolving task completes"), "Outcome is still applied");
    assert!(!orchestrator.is_running().await, "Orchestrator is usable again");

    Ok(())
}

#[tokio::test]
async fn test_provider_failures_end_the_run() -> Result<()> {
    let failures = [
        ProviderError::NetworkError("unreachable".to_string()),
        ProviderError::Timeout,
        ProviderError::ProviderRejected("HTTP 422".to_string()),
        ProviderError::UnknownError("garbled".to_string()),
    ];

    for failure in failures {
        let provider = BaselineAnalysisProvider::new(failure.kind()).with_error(failure.clone());
        let orchestrator = AnalysisOrchestrator::new(Arc::new(provider));

        let state = orchestrator.trigger(&remote("https://example.com/a.pdf")).await?;
        assert_eq!(state.failure(), Some(&failure));
        assert!(state.result().is_none(), "Failed runs expose no partial result");
    }

    Ok(())
}

#[tokio::test]
async fn test_events_follow_transitions() -> Result<()> {
    init_tracing();

    let orchestrator = AnalysisOrchestrator::new(Arc::new(BaselineAnalysisProvider::default()));
    let mut events = orchestrator.subscribe();

    let _ = orchestrator.trigger(&InputReference::None).await;
    orchestrator.trigger(&remote("https://example.com/a.pdf")).await?;

    let rejected = events.recv().await.expect("rejection event");
    assert_eq!(rejected, AnalysisEvent::Rejected { reason: Rejection::NoInputSelected });
    assert_eq!(
        rejected.to_string(),
        "No document selected: upload a file or provide a URL first"
    );

    let started = events.recv().await.expect("start event");
    let started_id = match started {
        AnalysisEvent::Started { request_id, .. } => request_id,
        other => panic!("expected Started, got {:?}", other),
    };

    let finished = events.recv().await.expect("completion event");
    match &finished {
        AnalysisEvent::Succeeded { request_id, sections } => {
            assert_eq!(*request_id, started_id);
            assert!(*sections > 0);
        }
        other => panic!("expected Succeeded, got {:?}", other),
    }
    assert_eq!(finished.to_string(), "Analysis complete");

    Ok(())
}
