//! CiteScout Search Gateway
//!
//! Boundary to the scholarly search index:
//! - `SearchProvider` trait for the pipeline to depend on
//! - `SemanticScholarClient` real implementation (reqwest + governor quota)
//! - `search_with_retry` bounded exponential backoff for rate limiting
//! - `MockProvider` scripted test double

mod mock;
mod semantic_scholar;

pub use mock::MockProvider;
pub use semantic_scholar::SemanticScholarClient;

use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use citescout_common::errors::ProviderError;
use citescout_common::metrics::PROVIDER_RETRIES_TOTAL;
use citescout_common::model::{PaperCandidate, Query};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::warn;

/// Provider health signal accompanying a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Ok,
    RateLimited,
    Unavailable,
}

impl From<&ProviderError> for ProviderStatus {
    fn from(err: &ProviderError) -> Self {
        match err {
            ProviderError::RateLimited => ProviderStatus::RateLimited,
            _ => ProviderStatus::Unavailable,
        }
    }
}

/// Candidate papers plus the provider status for one query.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub papers: Vec<PaperCandidate>,
    pub status: ProviderStatus,
}

/// The scholarly search boundary. Implementations must be cheap to share
/// across workers (`Arc<dyn SearchProvider>`).
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &Query) -> Result<ProviderResponse, ProviderError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Bounded-retry policy for rate-limited responses.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retries after the first attempt.
    pub max_retries: u32,
    /// Initial backoff interval; doubles per retry.
    pub initial_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_interval: Duration::from_millis(500),
        }
    }
}

/// Execute a search, retrying only rate-limited failures with exponential
/// backoff, up to `policy.max_retries` times. Every other failure is
/// permanent and surfaces immediately.
pub async fn search_with_retry(
    provider: &dyn SearchProvider,
    query: &Query,
    policy: &RetryPolicy,
) -> Result<ProviderResponse, ProviderError> {
    let attempts = AtomicU32::new(0);
    let backoff = ExponentialBackoff {
        initial_interval: policy.initial_interval,
        max_elapsed_time: None,
        ..Default::default()
    };

    retry(backoff, || async {
        match provider.search(query).await {
            Ok(response) => Ok(response),
            Err(err) if err.is_retryable() => {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt > policy.max_retries {
                    warn!(
                        provider = provider.name(),
                        sentence_index = query.sentence_index,
                        attempts = attempt,
                        "rate limit retries exhausted"
                    );
                    Err(backoff::Error::permanent(err))
                } else {
                    counter!(PROVIDER_RETRIES_TOTAL).increment(1);
                    warn!(
                        provider = provider.name(),
                        sentence_index = query.sentence_index,
                        attempt,
                        "rate limited, backing off"
                    );
                    Err(backoff::Error::transient(err))
                }
            }
            Err(err) => Err(backoff::Error::permanent(err)),
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use citescout_common::model::{ClaimType, FilterSet, QueryKind};

    fn query() -> Query {
        Query {
            terms: vec!["exercise".into(), "cardiovascular".into()],
            kind: QueryKind::Precise,
            sentence_index: 0,
            claim_type: ClaimType::Empirical,
            filters: FilterSet::default(),
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_rate_limiting() {
        let provider = MockProvider::new().with_papers(2).fail_first(2);
        let response = search_with_retry(&provider, &query(), &fast_policy())
            .await
            .unwrap();
        assert_eq!(response.status, ProviderStatus::Ok);
        assert_eq!(response.papers.len(), 2);
        // 2 failures + 1 success
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_budget() {
        let provider = MockProvider::new().fail_first(10);
        let err = search_with_retry(&provider, &query(), &fast_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited));
        // 1 initial attempt + 2 retries
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_is_not_retried() {
        let provider = MockProvider::new().unavailable_for(0);
        let err = search_with_retry(&provider, &query(), &fast_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { .. }));
        assert_eq!(provider.calls(), 1);
        assert_eq!(ProviderStatus::from(&err), ProviderStatus::Unavailable);
    }
}
