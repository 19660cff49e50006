//! CiteScout Streaming Orchestrator
//!
//! Drives a document through detection, query formulation, search, ranking,
//! and formatting, and streams one terminal event per sentence in document
//! order:
//! - bounded worker concurrency (`Semaphore`)
//! - in-order emission through a reorder buffer over a bounded channel,
//!   so a slow consumer backpressures the workers; a read-ahead window
//!   keeps the reorder buffer itself bounded when one early sentence
//!   stalls behind many fast ones
//! - per-sentence deadline; a timed-out or failed sentence yields an
//!   `error` event without disturbing its neighbors
//! - cooperative cancellation over a `watch` flag

use citescout_common::config::PipelineConfig;
use citescout_common::errors::PipelineError;
use citescout_common::metrics::{
    CLAIMS_FLAGGED_TOTAL, EVENT_ERRORS_TOTAL, SENTENCES_TOTAL, SENTENCE_DURATION_SECONDS,
};
use citescout_common::model::{
    CitationResult, CitationStyle, ClaimCandidate, EventStatus, FilterSet, PipelineEvent, RunState,
};
use citescout_detect::ClaimDetector;
use citescout_format::CitationFormatter;
use citescout_provider::{search_with_retry, RetryPolicy, SearchProvider};
use citescout_query::QueryFormulator;
use citescout_rank::RelevanceRanker;
use metrics::{counter, histogram};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Shared per-run context handed to every worker.
struct WorkerContext {
    provider: Arc<dyn SearchProvider>,
    formulator: QueryFormulator,
    ranker: RelevanceRanker,
    formatter: CitationFormatter,
    retry_policy: RetryPolicy,
    min_results: usize,
    filters: FilterSet,
    styles: Vec<CitationStyle>,
}

pub struct CitationPipeline {
    provider: Arc<dyn SearchProvider>,
    config: PipelineConfig,
    detector: ClaimDetector,
}

impl CitationPipeline {
    pub fn new(provider: Arc<dyn SearchProvider>, config: PipelineConfig) -> Self {
        let detector = ClaimDetector::new(&config.detector);
        Self {
            provider,
            config,
            detector,
        }
    }

    /// Start a run over `document`. Detection happens up front; workers then
    /// process flagged sentences concurrently while events stream back in
    /// sentence order.
    pub fn start(
        &self,
        document: &str,
        filters: FilterSet,
        styles: Vec<CitationStyle>,
    ) -> Result<PipelineRun, PipelineError> {
        if document.trim().is_empty() {
            return Err(PipelineError::input("document is empty"));
        }
        filters.validate().map_err(PipelineError::input)?;

        let claims = self.detector.detect(document);
        let flagged = claims.iter().filter(|c| c.needs_citation).count();
        counter!(SENTENCES_TOTAL).increment(claims.len() as u64);
        counter!(CLAIMS_FLAGGED_TOTAL).increment(flagged as u64);
        info!(
            sentences = claims.len(),
            flagged,
            styles = styles.len(),
            "starting pipeline run"
        );

        let (state_tx, state_rx) = watch::channel(RunState::Created);
        let state_tx = Arc::new(state_tx);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel_tx = Arc::new(cancel_tx);

        let buffer = self.config.orchestrator.event_buffer.max(1);
        let (worker_tx, worker_rx) = mpsc::channel::<PipelineEvent>(buffer);
        let (out_tx, out_rx) = mpsc::channel::<PipelineEvent>(buffer);

        let context = Arc::new(WorkerContext {
            provider: Arc::clone(&self.provider),
            formulator: QueryFormulator::new(&self.config.query),
            ranker: RelevanceRanker::new(&self.config.ranker),
            formatter: CitationFormatter::new(&self.config.cache),
            retry_policy: RetryPolicy {
                max_retries: self.config.provider.max_retries,
                initial_interval: self.config.backoff_initial(),
            },
            min_results: self.config.ranker.min_results,
            filters,
            styles,
        });

        let concurrency = self.config.orchestrator.concurrency.max(1);
        // No sentence may start until the sentence `window` positions behind
        // it has been emitted; this caps the reorder buffer.
        let window = Arc::new(Semaphore::new(buffer + concurrency));

        let reorder = tokio::spawn(reorder_events(
            worker_rx,
            out_tx,
            cancel_rx.clone(),
            Arc::clone(&window),
        ));
        tokio::spawn(drive_run(
            claims,
            context,
            worker_tx,
            reorder,
            Arc::clone(&state_tx),
            cancel_rx.clone(),
            window,
            concurrency,
            self.config.sentence_timeout(),
        ));

        Ok(PipelineRun {
            events: out_rx,
            handle: RunHandle {
                cancel_tx,
                state_tx,
                state_rx,
            },
            cancel_rx,
        })
    }
}

/// One in-flight run: an ordered event stream plus its control handle.
#[derive(Debug)]
pub struct PipelineRun {
    events: mpsc::Receiver<PipelineEvent>,
    handle: RunHandle,
    cancel_rx: watch::Receiver<bool>,
}

impl PipelineRun {
    /// Next in-order event, or `None` once the run has completed or been
    /// cancelled.
    pub async fn next_event(&mut self) -> Option<PipelineEvent> {
        tokio::select! {
            biased;
            _ = cancelled(self.cancel_rx.clone()) => None,
            event = self.events.recv() => event,
        }
    }

    pub fn handle(&self) -> RunHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> RunState {
        self.handle.state()
    }
}

/// Cloneable control surface for a run.
#[derive(Clone, Debug)]
pub struct RunHandle {
    cancel_tx: Arc<watch::Sender<bool>>,
    state_tx: Arc<watch::Sender<RunState>>,
    state_rx: watch::Receiver<RunState>,
}

impl RunHandle {
    /// Request cancellation. Idempotent; no events are emitted afterwards.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
        transition(&self.state_tx, RunState::Cancelled);
    }

    pub fn state(&self) -> RunState {
        *self.state_rx.borrow()
    }

    /// Wait until the run reaches a terminal state and return it.
    pub async fn wait_until_terminal(&self) -> RunState {
        let mut rx = self.state_rx.clone();
        let state = match rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        state
    }
}

/// Move to `next` unless the run is already terminal.
fn transition(state_tx: &watch::Sender<RunState>, next: RunState) {
    state_tx.send_if_modified(|state| {
        if state.is_terminal() || *state == next {
            false
        } else {
            *state = next;
            true
        }
    });
}

/// Resolves once cancellation is requested; never resolves otherwise.
async fn cancelled(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone without cancelling; stay pending.
            std::future::pending::<()>().await;
        }
    }
}

/// Buffer out-of-order worker events and release them in ascending sentence
/// index. Sentence indexes are contiguous from zero, so the next expected
/// index advances one at a time. Each emission returns one read-ahead
/// permit to the driver; closing the window on exit unblocks it.
async fn reorder_events(
    mut worker_rx: mpsc::Receiver<PipelineEvent>,
    out_tx: mpsc::Sender<PipelineEvent>,
    cancel_rx: watch::Receiver<bool>,
    window: Arc<Semaphore>,
) {
    let mut pending: BTreeMap<usize, PipelineEvent> = BTreeMap::new();
    let mut next_index = 0usize;
    'stream: loop {
        tokio::select! {
            biased;
            _ = cancelled(cancel_rx.clone()) => break 'stream,
            received = worker_rx.recv() => {
                let Some(event) = received else {
                    debug!(emitted = next_index, "event stream drained");
                    break 'stream;
                };
                pending.insert(event.sentence_index, event);
                while let Some(event) = pending.remove(&next_index) {
                    if out_tx.send(event).await.is_err() {
                        break 'stream;
                    }
                    next_index += 1;
                    window.add_permits(1);
                }
            }
        }
    }
    window.close();
}

#[allow(clippy::too_many_arguments)]
async fn drive_run(
    claims: Vec<ClaimCandidate>,
    context: Arc<WorkerContext>,
    worker_tx: mpsc::Sender<PipelineEvent>,
    reorder: tokio::task::JoinHandle<()>,
    state_tx: Arc<watch::Sender<RunState>>,
    cancel_rx: watch::Receiver<bool>,
    window: Arc<Semaphore>,
    concurrency: usize,
    sentence_timeout: Duration,
) {
    transition(&state_tx, RunState::Running);
    let semaphore = Arc::new(Semaphore::new(concurrency));

    let mut workers = JoinSet::new();
    for claim in claims {
        // A closed window means the reorder stage is gone (cancellation or
        // a dropped consumer); stop starting sentences.
        let Ok(permit) = window.acquire().await else { break };
        permit.forget();

        let tx = worker_tx.clone();
        if !claim.needs_citation {
            // No network work; the empty event still flows through the
            // reorder stage so ordering accounting stays uniform.
            workers.spawn(async move {
                let _ = tx.send(PipelineEvent::empty_done(claim)).await;
            });
            continue;
        }
        let context = Arc::clone(&context);
        let semaphore = Arc::clone(&semaphore);
        let cancel_rx = cancel_rx.clone();
        workers.spawn(process_sentence(
            claim,
            context,
            semaphore,
            tx,
            cancel_rx,
            sentence_timeout,
        ));
    }
    drop(worker_tx);

    let mut failed = false;
    while let Some(joined) = workers.join_next().await {
        if joined.is_err() {
            failed = true;
        }
    }
    if reorder.await.is_err() {
        failed = true;
    }

    if failed {
        transition(&state_tx, RunState::Failed);
    } else {
        transition(&state_tx, RunState::Completed);
    }
}

/// One flagged sentence end to end: formulate, search (with retry and broad
/// fallback), rank, format. Always resolves to exactly one event unless the
/// run is cancelled first.
async fn process_sentence(
    claim: ClaimCandidate,
    context: Arc<WorkerContext>,
    semaphore: Arc<Semaphore>,
    tx: mpsc::Sender<PipelineEvent>,
    cancel_rx: watch::Receiver<bool>,
    sentence_timeout: Duration,
) {
    let Ok(_permit) = semaphore.acquire().await else {
        return;
    };
    let sentence_index = claim.sentence.index;
    let started = Instant::now();

    let timed_out = claim.clone();
    let event = tokio::select! {
        biased;
        _ = cancelled(cancel_rx.clone()) => return,
        outcome = tokio::time::timeout(sentence_timeout, resolve_claim(claim, &context)) => {
            match outcome {
                Ok(event) => event,
                Err(_) => {
                    warn!(sentence_index, "sentence deadline exceeded");
                    PipelineEvent::failed(timed_out, "sentence processing deadline exceeded")
                }
            }
        }
    };

    if event.status == EventStatus::Error {
        counter!(EVENT_ERRORS_TOTAL).increment(1);
    }
    histogram!(SENTENCE_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
    let _ = tx.send(event).await;
}

async fn resolve_claim(claim: ClaimCandidate, context: &WorkerContext) -> PipelineEvent {
    let queries = context.formulator.formulate(&claim, &context.filters);
    let Some(primary) = queries.first() else {
        return PipelineEvent::empty_done(claim);
    };

    let response =
        match search_with_retry(context.provider.as_ref(), primary, &context.retry_policy).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    sentence_index = claim.sentence.index,
                    error = %err,
                    "search failed"
                );
                return PipelineEvent::failed(claim, err.to_string());
            }
        };

    let mut ranked = context.ranker.rank(&response.papers, &context.filters);
    if ranked.len() < context.min_results {
        if let Some(broad) = queries.get(1) {
            match search_with_retry(context.provider.as_ref(), broad, &context.retry_policy).await {
                Ok(broad_response) => {
                    ranked = context.ranker.rank_with_fallback(
                        &response.papers,
                        &broad_response.papers,
                        &context.filters,
                    );
                }
                Err(err) => {
                    // The primary results still stand; the broadened query
                    // is best-effort.
                    debug!(
                        sentence_index = claim.sentence.index,
                        error = %err,
                        "broad query failed"
                    );
                }
            }
        }
    }

    let results: Vec<CitationResult> = ranked
        .into_iter()
        .map(|result| CitationResult {
            citations: context.formatter.format_all(&result.paper, &context.styles),
            result,
        })
        .collect();

    PipelineEvent {
        sentence_index: claim.sentence.index,
        claim,
        results,
        status: EventStatus::Done,
        error: None,
    }
}
