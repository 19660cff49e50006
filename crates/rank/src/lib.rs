//! CiteScout Relevance Ranker
//!
//! Two stages per query:
//! 1. hard filtering against the caller's `FilterSet` (conservative: a
//!    violating candidate never appears in the output),
//! 2. composite scoring and strict ordering with deterministic tie breaks.
//!
//! Scoring weights are fixed constants so rankings stay comparable across
//! sentences; they are tunable defaults, not user configuration.

use chrono::Datelike;
use citescout_common::config::RankerConfig;
use citescout_common::model::{FilterSet, PaperCandidate, RankedResult};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Primary signal: the provider's own relevance ordering.
const WEIGHT_RELEVANCE: f32 = 0.6;
/// Linear decay over the recency horizon.
const WEIGHT_RECENCY: f32 = 0.25;
/// Log-scaled citation impact.
const WEIGHT_IMPACT: f32 = 0.15;

/// Citation count at which the impact factor saturates.
const IMPACT_SATURATION: f32 = 1000.0;

pub struct RelevanceRanker {
    top_k: usize,
    min_results: usize,
    recency_horizon_years: u32,
    current_year: i32,
}

impl RelevanceRanker {
    pub fn new(config: &RankerConfig) -> Self {
        Self::with_current_year(config, chrono::Utc::now().year())
    }

    /// Deterministic constructor for tests.
    pub fn with_current_year(config: &RankerConfig, current_year: i32) -> Self {
        Self {
            top_k: config.top_k,
            min_results: config.min_results,
            recency_horizon_years: config.recency_horizon_years,
            current_year,
        }
    }

    /// Filter, score, and order one query's candidates, capped at top-K.
    pub fn rank(&self, candidates: &[PaperCandidate], filters: &FilterSet) -> Vec<RankedResult> {
        let mut results: Vec<RankedResult> = candidates
            .iter()
            .filter(|paper| passes_filters(paper, filters))
            .map(|paper| RankedResult {
                composite_score: self.composite_score(paper),
                paper: paper.clone(),
                rank: 0,
            })
            .collect();

        self.order_and_truncate(&mut results);
        results
    }

    /// Rank the primary candidates; when fewer than `min_results` survive
    /// filtering, merge in the secondary (broad) query's candidates,
    /// deduplicated by paper id, before truncating to top-K.
    pub fn rank_with_fallback(
        &self,
        primary: &[PaperCandidate],
        secondary: &[PaperCandidate],
        filters: &FilterSet,
    ) -> Vec<RankedResult> {
        let mut results = self.rank(primary, filters);
        if results.len() >= self.min_results || secondary.is_empty() {
            return results;
        }

        let seen: HashSet<&str> = results.iter().map(|r| r.paper.id.as_str()).collect();
        let extra: Vec<PaperCandidate> = secondary
            .iter()
            .filter(|p| !seen.contains(p.id.as_str()))
            .cloned()
            .collect();
        debug!(
            primary = results.len(),
            merged = extra.len(),
            "merging broad query results"
        );

        results.extend(self.rank(&extra, filters));
        self.order_and_truncate(&mut results);
        results
    }

    /// Weighted blend of relevance, recency, and impact. Each factor lies
    /// in [0, 1], so the composite does too.
    pub fn composite_score(&self, paper: &PaperCandidate) -> f32 {
        WEIGHT_RELEVANCE * paper.provider_relevance_score.clamp(0.0, 1.0)
            + WEIGHT_RECENCY * self.recency_factor(paper.year)
            + WEIGHT_IMPACT * impact_factor(paper.citation_count)
    }

    /// Linear decay from 1.0 (current year) to 0.0 at the horizon. Missing
    /// years score zero.
    fn recency_factor(&self, year: Option<i32>) -> f32 {
        let Some(year) = year else { return 0.0 };
        let age = (self.current_year - year).max(0) as f32;
        (1.0 - age / self.recency_horizon_years as f32).clamp(0.0, 1.0)
    }

    fn order_and_truncate(&self, results: &mut Vec<RankedResult>) {
        results.sort_by(compare_results);
        results.truncate(self.top_k);
        for (i, result) in results.iter_mut().enumerate() {
            result.rank = i + 1;
        }
    }
}

/// Strict total order for result sets with unique ids: composite desc,
/// citation count desc, year desc, id asc.
fn compare_results(a: &RankedResult, b: &RankedResult) -> Ordering {
    b.composite_score
        .total_cmp(&a.composite_score)
        .then_with(|| b.paper.citation_count.cmp(&a.paper.citation_count))
        .then_with(|| b.paper.year.unwrap_or(i32::MIN).cmp(&a.paper.year.unwrap_or(i32::MIN)))
        .then_with(|| a.paper.id.cmp(&b.paper.id))
}

/// Conservative hard filter: every active constraint must hold.
fn passes_filters(paper: &PaperCandidate, filters: &FilterSet) -> bool {
    if let Some((min, max)) = filters.year_range {
        match paper.year {
            Some(year) if (min..=max).contains(&year) => {}
            _ => return false,
        }
    }
    if !filters.venues.is_empty() {
        let Some(venue) = &paper.venue else { return false };
        if !filters
            .venues
            .iter()
            .any(|v| v.eq_ignore_ascii_case(venue))
        {
            return false;
        }
    }
    if !filters.fields_of_study.is_empty() {
        // Provider records carry no field-of-study tags beyond what the
        // query already constrained server-side; venue text is the only
        // local signal, so require a case-insensitive substring overlap.
        let haystack = format!(
            "{} {}",
            paper.venue.as_deref().unwrap_or(""),
            paper.abstract_text.as_deref().unwrap_or("")
        )
        .to_lowercase();
        if !filters
            .fields_of_study
            .iter()
            .any(|f| haystack.contains(&f.to_lowercase()))
        {
            return false;
        }
    }
    if let Some(min_citations) = filters.min_citation_count {
        if paper.citation_count < min_citations {
            return false;
        }
    }
    if filters.open_access_only && !paper.open_access {
        return false;
    }
    true
}

/// ln(1 + citations) / ln(1 + saturation), clamped to 1.
fn impact_factor(citation_count: u32) -> f32 {
    ((1.0 + citation_count as f32).ln() / (1.0 + IMPACT_SATURATION).ln()).min(1.0)
}
