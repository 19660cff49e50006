//! End-to-end orchestration tests over the scripted mock provider:
//! event accounting, ordered emission, cancellation, timeout isolation,
//! and retry behavior.

use citescout_common::config::PipelineConfig;
use citescout_common::errors::PipelineError;
use citescout_common::model::{CitationStyle, EventStatus, FilterSet, RunState};
use citescout_pipeline::CitationPipeline;
use citescout_provider::MockProvider;
use std::sync::Arc;
use std::time::Duration;

fn test_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.provider.backoff_initial_ms = 1;
    config
}

/// A document of `count` sentences that each carry an empirical cue.
fn claim_doc(count: usize) -> String {
    (0..count)
        .map(|i| {
            format!(
                "Studies show that treatment protocol number {} improves patient recovery outcomes.",
                i
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn pipeline_with(provider: Arc<MockProvider>, config: PipelineConfig) -> CitationPipeline {
    CitationPipeline::new(provider, config)
}

#[tokio::test]
async fn test_one_terminal_event_per_sentence() {
    let doc = "Studies show that regular exercise improves cardiovascular health outcomes. \
               The committee met on a rainy Tuesday afternoon. \
               Research shows that sleep deprivation causes impaired cognitive performance.";
    let provider = Arc::new(MockProvider::new());
    let pipeline = pipeline_with(provider.clone(), test_config());

    let mut run = pipeline
        .start(
            doc,
            FilterSet::default(),
            vec![CitationStyle::Apa, CitationStyle::Bibtex],
        )
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = run.next_event().await {
        events.push(event);
    }

    assert_eq!(events.len(), 3);
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.sentence_index, i);
    }

    // Middle sentence carries no cue: immediate empty done, no search.
    assert!(!events[1].claim.needs_citation);
    assert_eq!(events[1].status, EventStatus::Done);
    assert!(events[1].results.is_empty());

    for event in [&events[0], &events[2]] {
        assert!(event.claim.needs_citation);
        assert_eq!(event.status, EventStatus::Done);
        assert!(!event.results.is_empty());
        // One citation per requested style, in request order.
        for result in &event.results {
            assert_eq!(result.citations.len(), 2);
            assert_eq!(result.citations[0].style, CitationStyle::Apa);
            assert_eq!(result.citations[1].style, CitationStyle::Bibtex);
        }
    }

    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_events_emitted_in_sentence_order_despite_random_delays() {
    let provider = Arc::new(MockProvider::new().with_random_delay(25));
    let pipeline = pipeline_with(provider, test_config());

    let mut run = pipeline
        .start(&claim_doc(8), FilterSet::default(), vec![CitationStyle::Apa])
        .unwrap();

    let mut indexes = Vec::new();
    while let Some(event) = run.next_event().await {
        indexes.push(event.sentence_index);
    }
    assert_eq!(indexes, (0..8).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_opinion_only_document_makes_no_provider_calls() {
    let doc = "I believe this approach is elegant and simple. \
               In my opinion the design is clean and readable.";
    let provider = Arc::new(MockProvider::new());
    let pipeline = pipeline_with(provider.clone(), test_config());

    let mut run = pipeline
        .start(doc, FilterSet::default(), vec![CitationStyle::Apa])
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = run.next_event().await {
        events.push(event);
    }

    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| !e.claim.needs_citation));
    assert!(events.iter().all(|e| e.results.is_empty()));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_cancellation_stops_the_stream() {
    let provider = Arc::new(MockProvider::new().with_delay(Duration::from_millis(50)));
    let pipeline = pipeline_with(provider, test_config());

    let mut run = pipeline
        .start(&claim_doc(10), FilterSet::default(), vec![CitationStyle::Apa])
        .unwrap();
    let handle = run.handle();

    let first = run.next_event().await.unwrap();
    let second = run.next_event().await.unwrap();
    assert_eq!(first.sentence_index, 0);
    assert_eq!(second.sentence_index, 1);

    handle.cancel();
    assert!(run.next_event().await.is_none());
    assert_eq!(handle.state(), RunState::Cancelled);

    // Cancelling again is a no-op.
    handle.cancel();
    assert_eq!(handle.wait_until_terminal().await, RunState::Cancelled);
}

#[tokio::test]
async fn test_slow_sentence_times_out_without_disturbing_neighbors() {
    let mut config = test_config();
    config.orchestrator.sentence_timeout_secs = 1;

    let provider = Arc::new(MockProvider::new().slow_for(1));
    let pipeline = pipeline_with(provider, config);

    let mut run = pipeline
        .start(&claim_doc(3), FilterSet::default(), vec![CitationStyle::Apa])
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = run.next_event().await {
        events.push(event);
    }

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].status, EventStatus::Done);
    assert_eq!(events[1].status, EventStatus::Error);
    assert!(events[1].error.as_deref().unwrap().contains("deadline"));
    assert!(events[1].results.is_empty());
    assert_eq!(events[2].status, EventStatus::Done);

    assert_eq!(run.handle().wait_until_terminal().await, RunState::Completed);
}

#[tokio::test]
async fn test_stalled_early_sentence_bounds_read_ahead() {
    let mut config = test_config();
    config.orchestrator.sentence_timeout_secs = 30;
    let read_ahead = config.orchestrator.event_buffer + config.orchestrator.concurrency;

    let provider = Arc::new(MockProvider::new().slow_for(0));
    let pipeline = pipeline_with(provider.clone(), config);

    let mut run = pipeline
        .start(&claim_doc(60), FilterSet::default(), vec![CitationStyle::Apa])
        .unwrap();

    // Sentence 0 never completes, so nothing can be emitted; later
    // sentences may only start within the read-ahead window instead of
    // racing through the whole document.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let calls = provider.calls();
    assert!(
        calls <= read_ahead,
        "{} searches started while sentence 0 was stalled (window {})",
        calls,
        read_ahead
    );

    run.handle().cancel();
    assert!(run.next_event().await.is_none());
}

#[tokio::test]
async fn test_rate_limited_search_retries_then_succeeds() {
    let provider = Arc::new(MockProvider::new().fail_first(1));
    let pipeline = pipeline_with(provider.clone(), test_config());

    let mut run = pipeline
        .start(&claim_doc(1), FilterSet::default(), vec![CitationStyle::Apa])
        .unwrap();

    let event = run.next_event().await.unwrap();
    assert_eq!(event.status, EventStatus::Done);
    assert!(!event.results.is_empty());
    assert!(run.next_event().await.is_none());

    // One rate-limited attempt plus the successful retry.
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_provider_outage_yields_error_event() {
    let provider = Arc::new(MockProvider::new().unavailable_for(0));
    let pipeline = pipeline_with(provider.clone(), test_config());

    let mut run = pipeline
        .start(&claim_doc(2), FilterSet::default(), vec![CitationStyle::Apa])
        .unwrap();

    let first = run.next_event().await.unwrap();
    assert_eq!(first.status, EventStatus::Error);
    let second = run.next_event().await.unwrap();
    assert_eq!(second.status, EventStatus::Done);
    assert!(run.next_event().await.is_none());

    // Unavailable is permanent: no retry for sentence 0.
    assert_eq!(provider.calls(), 2);
    assert_eq!(run.handle().wait_until_terminal().await, RunState::Completed);
}

#[tokio::test]
async fn test_empty_document_is_rejected_before_the_run_starts() {
    let provider = Arc::new(MockProvider::new());
    let pipeline = pipeline_with(provider.clone(), test_config());

    let err = pipeline
        .start("   \n  ", FilterSet::default(), vec![CitationStyle::Apa])
        .unwrap_err();
    assert!(matches!(err, PipelineError::Input { .. }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_invalid_filters_are_rejected() {
    let provider = Arc::new(MockProvider::new());
    let pipeline = pipeline_with(provider, test_config());

    let filters = FilterSet {
        year_range: Some((2024, 2015)),
        ..Default::default()
    };
    let err = pipeline
        .start(&claim_doc(1), filters, vec![CitationStyle::Apa])
        .unwrap_err();
    assert!(matches!(err, PipelineError::Input { .. }));
}

#[tokio::test]
async fn test_run_reaches_completed_after_drain() {
    let provider = Arc::new(MockProvider::new());
    let pipeline = pipeline_with(provider, test_config());

    let mut run = pipeline
        .start(&claim_doc(4), FilterSet::default(), vec![CitationStyle::Apa])
        .unwrap();
    let handle = run.handle();

    let mut count = 0;
    while run.next_event().await.is_some() {
        count += 1;
    }
    assert_eq!(count, 4);
    assert_eq!(handle.wait_until_terminal().await, RunState::Completed);
}
