//! Core data model for the citation pipeline
//!
//! Every type here is owned by a single pipeline run and immutable once
//! produced. `Sentence.index` is a total order over the document and is
//! preserved through every derived entity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A sentence extracted from the submitted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Position in document order, starting at 0.
    pub index: usize,
    /// Sentence text, trimmed.
    pub text: String,
    /// Byte span `(start, end)` into the original document.
    pub char_span: (usize, usize),
}

/// Category of claim a sentence asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    /// Numbers, percentages, prevalence figures.
    Statistical,
    /// Comparatives and superlatives ("higher than", "3 times").
    Comparative,
    /// Causal or empirical assertions ("shows", "causes", "found that").
    Empirical,
    /// Attributed but unsourced ("studies suggest", "experts argue").
    Attributed,
    /// Definitional or classification claims ("is defined as").
    Definitional,
    /// No claim detected.
    None,
}

/// A sentence scored for whether it needs a citation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimCandidate {
    pub sentence: Sentence,
    pub needs_citation: bool,
    /// Detector confidence in [0, 1].
    pub confidence: f32,
    pub claim_type: ClaimType,
}

/// Whether a query is the precise primary or the broadened secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Precise,
    Broad,
}

/// A search query derived from one claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Ordered search terms; phrases are kept as single terms.
    pub terms: Vec<String>,
    pub kind: QueryKind,
    /// Index of the sentence this query was derived from.
    pub sentence_index: usize,
    pub claim_type: ClaimType,
    /// Structural filters, shared unchanged across the whole document.
    pub filters: FilterSet,
}

impl Query {
    /// The query string sent to the provider.
    pub fn text(&self) -> String {
        self.terms.join(" ")
    }
}

/// Caller-supplied structural constraints, applied uniformly to every search
/// in a run. Unset fields mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Inclusive `(min, max)` publication-year range.
    pub year_range: Option<(i32, i32)>,
    /// Acceptable venues; empty means any.
    pub venues: BTreeSet<String>,
    /// Required fields of study; empty means any.
    pub fields_of_study: BTreeSet<String>,
    pub min_citation_count: Option<u32>,
    pub open_access_only: bool,
}

impl FilterSet {
    /// True when no field constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        self.year_range.is_none()
            && self.venues.is_empty()
            && self.fields_of_study.is_empty()
            && self.min_citation_count.is_none()
            && !self.open_access_only
    }

    /// Validate internal consistency (`min <= max` for the year range).
    pub fn validate(&self) -> Result<(), String> {
        if let Some((min, max)) = self.year_range {
            if min > max {
                return Err(format!("year_range min {} exceeds max {}", min, max));
            }
        }
        Ok(())
    }
}

/// Paper metadata as returned by the scholarly search provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperCandidate {
    /// Provider-assigned stable identifier.
    pub id: String,
    pub title: Option<String>,
    /// Full author names in publication order.
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub venue: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub abstract_text: Option<String>,
    pub citation_count: u32,
    pub open_access: bool,
    /// Relevance signal derived from the provider's result ordering, in (0, 1].
    pub provider_relevance_score: f32,
}

/// A paper with its composite score and final rank within one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub paper: PaperCandidate,
    pub composite_score: f32,
    /// 1-based rank within the result set.
    pub rank: usize,
}

/// Supported bibliographic styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    Apa,
    Mla,
    Chicago,
    Ieee,
    Harvard,
    Vancouver,
    Bibtex,
}

impl CitationStyle {
    pub const ALL: [CitationStyle; 7] = [
        CitationStyle::Apa,
        CitationStyle::Mla,
        CitationStyle::Chicago,
        CitationStyle::Ieee,
        CitationStyle::Harvard,
        CitationStyle::Vancouver,
        CitationStyle::Bibtex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CitationStyle::Apa => "apa",
            CitationStyle::Mla => "mla",
            CitationStyle::Chicago => "chicago",
            CitationStyle::Ieee => "ieee",
            CitationStyle::Harvard => "harvard",
            CitationStyle::Vancouver => "vancouver",
            CitationStyle::Bibtex => "bibtex",
        }
    }

    /// Parse a style name, case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "apa" => Some(CitationStyle::Apa),
            "mla" => Some(CitationStyle::Mla),
            "chicago" => Some(CitationStyle::Chicago),
            "ieee" => Some(CitationStyle::Ieee),
            "harvard" => Some(CitationStyle::Harvard),
            "vancouver" => Some(CitationStyle::Vancouver),
            "bibtex" => Some(CitationStyle::Bibtex),
            _ => None,
        }
    }
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered citation. Pure function of `(PaperCandidate, style)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedCitation {
    pub style: CitationStyle,
    pub text: String,
}

/// Terminal status of a per-sentence pipeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Done,
    Error,
}

/// One ranked paper together with its rendered citations, one per requested
/// style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationResult {
    pub result: RankedResult,
    pub citations: Vec<FormattedCitation>,
}

/// The unit of streamed output: exactly one terminal event per sentence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub sentence_index: usize,
    pub claim: ClaimCandidate,
    pub results: Vec<CitationResult>,
    pub status: EventStatus,
    /// Set when `status == Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineEvent {
    /// An immediate `done` event for a sentence that needs no citation.
    pub fn empty_done(claim: ClaimCandidate) -> Self {
        Self {
            sentence_index: claim.sentence.index,
            claim,
            results: Vec::new(),
            status: EventStatus::Done,
            error: None,
        }
    }

    /// An `error` event carrying the failure reason; results are empty.
    pub fn failed(claim: ClaimCandidate, error: impl Into<String>) -> Self {
        Self {
            sentence_index: claim.sentence.index,
            claim,
            results: Vec::new(),
            status: EventStatus::Error,
            error: Some(error.into()),
        }
    }
}

/// Lifecycle of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Created,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    /// Terminal states admit no further transitions or events.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_set_default_is_unconstrained() {
        let filters = FilterSet::default();
        assert!(filters.is_unconstrained());
        assert!(filters.validate().is_ok());
    }

    #[test]
    fn test_filter_set_rejects_inverted_year_range() {
        let filters = FilterSet {
            year_range: Some((2024, 2015)),
            ..Default::default()
        };
        assert!(filters.validate().is_err());
    }

    #[test]
    fn test_citation_style_parse_roundtrip() {
        for style in CitationStyle::ALL {
            assert_eq!(CitationStyle::parse(style.as_str()), Some(style));
        }
        assert_eq!(CitationStyle::parse("APA"), Some(CitationStyle::Apa));
        assert_eq!(CitationStyle::parse("turabian"), None);
    }

    #[test]
    fn test_query_text_joins_terms() {
        let query = Query {
            terms: vec!["Machine Learning".into(), "mortality".into()],
            kind: QueryKind::Precise,
            sentence_index: 0,
            claim_type: ClaimType::Empirical,
            filters: FilterSet::default(),
        };
        assert_eq!(query.text(), "Machine Learning mortality");
    }

    #[test]
    fn test_run_state_terminality() {
        assert!(!RunState::Created.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Cancelled.is_terminal());
        assert!(RunState::Failed.is_terminal());
    }
}
