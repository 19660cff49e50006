//! Metrics names and registration
//!
//! Uses the `metrics` facade with a stable naming prefix; installing a
//! recorder/exporter is the host application's concern.

use metrics::{describe_counter, describe_histogram, Unit};

/// Metrics prefix for all CiteScout metrics
pub const METRICS_PREFIX: &str = "citescout";

/// Counter: sentences segmented from submitted documents
pub const SENTENCES_TOTAL: &str = "citescout_sentences_total";

/// Counter: sentences flagged as needing a citation
pub const CLAIMS_FLAGGED_TOTAL: &str = "citescout_claims_flagged_total";

/// Counter: provider search requests issued
pub const PROVIDER_REQUESTS_TOTAL: &str = "citescout_provider_requests_total";

/// Counter: provider retries after rate limiting
pub const PROVIDER_RETRIES_TOTAL: &str = "citescout_provider_retries_total";

/// Counter: per-sentence error events emitted
pub const EVENT_ERRORS_TOTAL: &str = "citescout_event_errors_total";

/// Counter: citation cache hits
pub const CACHE_HITS_TOTAL: &str = "citescout_cache_hits_total";

/// Histogram: end-to-end per-sentence chain latency in seconds
pub const SENTENCE_DURATION_SECONDS: &str = "citescout_sentence_duration_seconds";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(SENTENCES_TOTAL, Unit::Count, "Sentences segmented");
    describe_counter!(
        CLAIMS_FLAGGED_TOTAL,
        Unit::Count,
        "Sentences flagged as needing a citation"
    );
    describe_counter!(
        PROVIDER_REQUESTS_TOTAL,
        Unit::Count,
        "Provider search requests issued"
    );
    describe_counter!(
        PROVIDER_RETRIES_TOTAL,
        Unit::Count,
        "Provider retries after rate limiting"
    );
    describe_counter!(EVENT_ERRORS_TOTAL, Unit::Count, "Error events emitted");
    describe_counter!(CACHE_HITS_TOTAL, Unit::Count, "Citation cache hits");
    describe_histogram!(
        SENTENCE_DURATION_SECONDS,
        Unit::Seconds,
        "Per-sentence chain latency in seconds"
    );
}
