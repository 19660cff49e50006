//! Scripted provider double for tests
//!
//! Supports call counting, per-call failure scripts, fixed and random
//! delays, and per-sentence slow/unavailable behavior so orchestration
//! tests can exercise ordering, timeouts, and retry paths without a
//! network.

use crate::{ProviderResponse, ProviderStatus, SearchProvider};
use async_trait::async_trait;
use citescout_common::errors::ProviderError;
use citescout_common::model::{PaperCandidate, Query};
use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub struct MockProvider {
    calls: AtomicUsize,
    fail_first: AtomicUsize,
    fixed_delay: Option<Duration>,
    max_random_delay_ms: Option<u64>,
    slow_sentences: HashSet<usize>,
    unavailable_sentences: HashSet<usize>,
    papers_per_query: usize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first: AtomicUsize::new(0),
            fixed_delay: None,
            max_random_delay_ms: None,
            slow_sentences: HashSet::new(),
            unavailable_sentences: HashSet::new(),
            papers_per_query: 3,
        }
    }

    /// Number of papers fabricated per successful query.
    pub fn with_papers(mut self, count: usize) -> Self {
        self.papers_per_query = count;
        self
    }

    /// The first `count` calls fail with `RateLimited`.
    pub fn fail_first(self, count: usize) -> Self {
        self.fail_first.store(count, Ordering::SeqCst);
        self
    }

    /// Every call sleeps this long before responding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.fixed_delay = Some(delay);
        self
    }

    /// Every call sleeps a uniform random duration up to `max_ms`.
    pub fn with_random_delay(mut self, max_ms: u64) -> Self {
        self.max_random_delay_ms = Some(max_ms);
        self
    }

    /// Queries for this sentence hang far beyond any reasonable deadline.
    pub fn slow_for(mut self, sentence_index: usize) -> Self {
        self.slow_sentences.insert(sentence_index);
        self
    }

    /// Queries for this sentence fail with `Unavailable`.
    pub fn unavailable_for(mut self, sentence_index: usize) -> Self {
        self.unavailable_sentences.insert(sentence_index);
        self
    }

    /// Total search calls observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// A fabricated paper with deterministic metadata.
    pub fn sample_paper(id: &str, rank: usize) -> PaperCandidate {
        PaperCandidate {
            id: id.to_string(),
            title: Some(format!("Sample Paper {}", id)),
            authors: vec!["John Smith".to_string(), "Jane Doe".to_string()],
            year: Some(2021),
            venue: Some("Journal of Medicine".to_string()),
            doi: Some(format!("10.1000/{}", id)),
            url: Some(format!("https://example.org/{}", id)),
            abstract_text: Some("A fabricated abstract.".to_string()),
            citation_count: 100_u32.saturating_sub(rank as u32 * 10),
            open_access: true,
            provider_relevance_score: 1.0 / (1.0 + rank as f32),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    async fn search(&self, query: &Query) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self
            .fail_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ProviderError::RateLimited);
        }

        if self.slow_sentences.contains(&query.sentence_index) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(delay) = self.fixed_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(max_ms) = self.max_random_delay_ms {
            let ms = rand::thread_rng().gen_range(0..=max_ms);
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        if self.unavailable_sentences.contains(&query.sentence_index) {
            return Err(ProviderError::Unavailable {
                message: "scripted outage".to_string(),
            });
        }

        let papers = (0..self.papers_per_query)
            .map(|rank| Self::sample_paper(&format!("s{}-p{}", query.sentence_index, rank), rank))
            .collect();

        Ok(ProviderResponse {
            papers,
            status: ProviderStatus::Ok,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citescout_common::model::{ClaimType, FilterSet, QueryKind};

    fn query(sentence_index: usize) -> Query {
        Query {
            terms: vec!["test".into()],
            kind: QueryKind::Precise,
            sentence_index,
            claim_type: ClaimType::Empirical,
            filters: FilterSet::default(),
        }
    }

    #[tokio::test]
    async fn test_mock_counts_calls_and_fabricates_papers() {
        let provider = MockProvider::new().with_papers(2);
        let response = provider.search(&query(4)).await.unwrap();
        assert_eq!(response.papers.len(), 2);
        assert_eq!(response.papers[0].id, "s4-p0");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_fail_first_then_recovers() {
        let provider = MockProvider::new().fail_first(1);
        assert!(provider.search(&query(0)).await.is_err());
        assert!(provider.search(&query(0)).await.is_ok());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_scripted_unavailability() {
        let provider = MockProvider::new().unavailable_for(7);
        assert!(provider.search(&query(7)).await.is_err());
        assert!(provider.search(&query(8)).await.is_ok());
    }
}
