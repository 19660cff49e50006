//! CiteScout Query Formulator
//!
//! Builds 1-2 search queries from a flagged claim:
//! - a precise primary query from capitalized noun phrases, preserved
//!   numerals, and the longest content words,
//! - for statistical/comparative claims, a broadened secondary query that
//!   drops the least-informative terms to improve recall.
//!
//! The caller's `FilterSet` is attached to both queries unchanged.

use citescout_common::config::QueryConfig;
use citescout_common::model::{ClaimCandidate, ClaimType, FilterSet, Query, QueryKind};
use regex_lite::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Stop words and claim-cue boilerplate stripped from queries. Cue verbs
/// ("show", "suggests") are included so the query carries the claim's
/// subject matter, not its phrasing.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do",
    "does", "did", "will", "would", "could", "should", "may", "might", "can", "it", "its", "this",
    "that", "these", "those", "not", "also", "which", "who", "studies", "research", "show",
    "shows", "shown", "suggest", "suggests", "evidence", "data", "indicates", "indicate",
    "demonstrate", "demonstrates", "according", "generally", "commonly", "widely", "significant",
    "significantly", "however", "therefore", "furthermore", "moreover", "although", "because",
    "such", "their", "they", "them", "there", "both", "each", "than", "then", "when", "where",
    "while", "thus", "since", "after",
];

pub struct QueryFormulator {
    phrase_re: Regex,
    word_re: Regex,
    numeral_re: Regex,
    max_terms: usize,
    broad_min_terms: usize,
}

impl QueryFormulator {
    pub fn new(config: &QueryConfig) -> Self {
        Self {
            // Capitalized bigrams/trigrams, e.g. "Machine Learning".
            phrase_re: Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b")
                .expect("static phrase pattern"),
            word_re: Regex::new(r"\b[a-zA-Z]{4,}\b").expect("static word pattern"),
            numeral_re: Regex::new(r"\b\d[\d.,]*\s*(?:%|°C|°F)?").expect("static numeral pattern"),
            max_terms: config.max_terms,
            broad_min_terms: config.broad_min_terms,
        }
    }

    /// Build queries for one claim. Returns an empty vector when the claim
    /// does not need a citation or no usable terms remain.
    pub fn formulate(&self, claim: &ClaimCandidate, filters: &FilterSet) -> Vec<Query> {
        if !claim.needs_citation {
            return Vec::new();
        }

        let terms = self.extract_terms(&claim.sentence.text);
        if terms.is_empty() {
            debug!(
                sentence_index = claim.sentence.index,
                "no query terms extracted"
            );
            return Vec::new();
        }

        let mut queries = vec![Query {
            terms: terms.clone(),
            kind: QueryKind::Precise,
            sentence_index: claim.sentence.index,
            claim_type: claim.claim_type,
            filters: filters.clone(),
        }];

        if matches!(
            claim.claim_type,
            ClaimType::Statistical | ClaimType::Comparative
        ) {
            if let Some(broad) = self.broaden(&terms) {
                queries.push(Query {
                    terms: broad,
                    kind: QueryKind::Broad,
                    sentence_index: claim.sentence.index,
                    claim_type: claim.claim_type,
                    filters: filters.clone(),
                });
            }
        }

        queries
    }

    /// Term extraction order: capitalized phrases, numerals verbatim, then
    /// content words longest-first, deduplicated case-insensitively and
    /// capped at `max_terms`.
    fn extract_terms(&self, sentence: &str) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut terms: Vec<String> = Vec::new();

        for m in self.phrase_re.find_iter(sentence) {
            let phrase = m.as_str();
            let key = phrase.to_lowercase();
            let all_stop = key.split_whitespace().all(|w| STOP_WORDS.contains(&w));
            if !all_stop && seen.insert(key.clone()) {
                for word in key.split_whitespace() {
                    seen.insert(word.to_string());
                }
                terms.push(phrase.to_string());
            }
        }

        for m in self.numeral_re.find_iter(sentence) {
            let numeral = m.as_str().trim();
            // Strip a trailing sentence period but keep decimals intact.
            let numeral = numeral.trim_end_matches(['.', ',']);
            if numeral.chars().any(|c| c.is_ascii_digit())
                && seen.insert(numeral.to_lowercase())
            {
                terms.push(numeral.to_string());
            }
        }

        let mut content: Vec<String> = Vec::new();
        for m in self.word_re.find_iter(sentence) {
            let word = m.as_str().to_lowercase();
            if !STOP_WORDS.contains(&word.as_str()) && !seen.contains(&word) {
                seen.insert(word.clone());
                content.push(word);
            }
        }
        // Longer words first: more specific terms carry more signal.
        content.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        terms.extend(content);

        terms.truncate(self.max_terms);
        terms
    }

    /// Drop the least-informative (shortest) third of the terms, keeping at
    /// least `broad_min_terms`. Returns None when broadening would not
    /// change the query.
    fn broaden(&self, terms: &[String]) -> Option<Vec<String>> {
        if terms.len() <= self.broad_min_terms {
            return None;
        }
        let keep = (terms.len() - terms.len() / 3).max(self.broad_min_terms);
        if keep == terms.len() {
            return None;
        }

        let mut by_length: Vec<(usize, &String)> = terms.iter().enumerate().collect();
        by_length.sort_by(|a, b| {
            b.1.len()
                .cmp(&a.1.len())
                .then_with(|| a.0.cmp(&b.0))
        });
        let kept: HashSet<usize> = by_length.iter().take(keep).map(|(i, _)| *i).collect();

        // Preserve the original term order.
        Some(
            terms
                .iter()
                .enumerate()
                .filter(|(i, _)| kept.contains(i))
                .map(|(_, t)| t.clone())
                .collect(),
        )
    }
}

impl Default for QueryFormulator {
    fn default() -> Self {
        Self::new(&QueryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citescout_common::model::Sentence;

    fn claim(text: &str, claim_type: ClaimType) -> ClaimCandidate {
        ClaimCandidate {
            sentence: Sentence {
                index: 3,
                text: text.to_string(),
                char_span: (0, text.len()),
            },
            needs_citation: true,
            confidence: 0.5,
            claim_type,
        }
    }

    #[test]
    fn test_extracts_capitalized_phrases() {
        let formulator = QueryFormulator::default();
        let queries = formulator.formulate(
            &claim(
                "Machine Learning methods have significantly improved Natural Language Processing tasks.",
                ClaimType::Empirical,
            ),
            &FilterSet::default(),
        );
        assert_eq!(queries.len(), 1);
        assert!(queries[0].terms.contains(&"Machine Learning".to_string()));
        assert!(queries[0]
            .terms
            .contains(&"Natural Language Processing".to_string()));
    }

    #[test]
    fn test_excludes_stop_words() {
        let formulator = QueryFormulator::default();
        let queries = formulator.formulate(
            &claim(
                "Studies show that the treatment was effective.",
                ClaimType::Empirical,
            ),
            &FilterSet::default(),
        );
        let text = queries[0].text().to_lowercase();
        for stop in ["the", "that", "show", "studies"] {
            assert!(!text.split_whitespace().any(|w| w == stop));
        }
    }

    #[test]
    fn test_preserves_numerals() {
        let formulator = QueryFormulator::default();
        let queries = formulator.formulate(
            &claim(
                "Mortality increased by 30% between 2010 and 2020.",
                ClaimType::Statistical,
            ),
            &FilterSet::default(),
        );
        assert!(queries[0].terms.iter().any(|t| t == "30%"));
    }

    #[test]
    fn test_caps_at_max_terms() {
        let formulator = QueryFormulator::default();
        let queries = formulator.formulate(
            &claim(
                "Cardiovascular exercise reduces mortality inflammation cholesterol \
                 hypertension diabetes obesity fatigue insomnia depression.",
                ClaimType::Empirical,
            ),
            &FilterSet::default(),
        );
        assert!(queries[0].terms.len() <= 8);
    }

    #[test]
    fn test_deduplicates_case_insensitively() {
        let formulator = QueryFormulator::default();
        let queries = formulator.formulate(
            &claim(
                "Exercise exercise EXERCISE reduces heart disease risk.",
                ClaimType::Empirical,
            ),
            &FilterSet::default(),
        );
        let count = queries[0]
            .terms
            .iter()
            .filter(|t| t.eq_ignore_ascii_case("exercise"))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_statistical_claim_gets_broad_secondary() {
        let formulator = QueryFormulator::default();
        let queries = formulator.formulate(
            &claim(
                "Global temperatures have risen by 1.1°C since pre-industrial times.",
                ClaimType::Statistical,
            ),
            &FilterSet::default(),
        );
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].kind, QueryKind::Precise);
        assert_eq!(queries[1].kind, QueryKind::Broad);
        assert!(queries[1].terms.len() < queries[0].terms.len());
        // Broad terms are a subset of the precise terms, order preserved.
        let mut precise = queries[0].terms.iter();
        for term in &queries[1].terms {
            assert!(precise.any(|t| t == term));
        }
    }

    #[test]
    fn test_empirical_claim_gets_single_query() {
        let formulator = QueryFormulator::default();
        let queries = formulator.formulate(
            &claim(
                "Studies show that exercise reduces cardiovascular risk substantially.",
                ClaimType::Empirical,
            ),
            &FilterSet::default(),
        );
        assert_eq!(queries.len(), 1);
    }

    #[test]
    fn test_unflagged_claim_yields_no_queries() {
        let formulator = QueryFormulator::default();
        let mut c = claim("I believe this approach is elegant.", ClaimType::None);
        c.needs_citation = false;
        assert!(formulator
            .formulate(&c, &FilterSet::default())
            .is_empty());
    }

    #[test]
    fn test_filters_attached_unchanged() {
        let formulator = QueryFormulator::default();
        let filters = FilterSet {
            year_range: Some((2015, 2024)),
            open_access_only: true,
            ..Default::default()
        };
        let queries = formulator.formulate(
            &claim(
                "Mortality increased by 30% compared to the prior decade.",
                ClaimType::Statistical,
            ),
            &filters,
        );
        for q in &queries {
            assert_eq!(q.filters, filters);
            assert_eq!(q.sentence_index, 3);
        }
    }
}
