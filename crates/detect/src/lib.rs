//! CiteScout Claim Detector
//!
//! Splits free-form text into sentences and scores each for whether it
//! asserts a claim needing evidentiary support. Output is one
//! `ClaimCandidate` per kept sentence, in document order. Each call starts
//! fresh; nothing is shared between documents.

mod classifier;
mod segment;

pub use classifier::{ClaimClassifier, ClassifierConfig};
pub use segment::split_sentences;

use citescout_common::config::DetectorConfig;
use citescout_common::model::ClaimCandidate;
use tracing::debug;

pub struct ClaimDetector {
    classifier: ClaimClassifier,
    min_sentence_chars: usize,
}

impl ClaimDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            classifier: ClaimClassifier::new(ClassifierConfig {
                confidence_threshold: config.confidence_threshold,
            }),
            min_sentence_chars: config.min_sentence_chars,
        }
    }

    /// Detect claims in `text`. Malformed or empty input yields an empty
    /// vector, never an error.
    pub fn detect(&self, text: &str) -> Vec<ClaimCandidate> {
        let sentences = split_sentences(text, self.min_sentence_chars);
        let candidates: Vec<ClaimCandidate> = sentences
            .into_iter()
            .map(|s| self.classifier.classify(s))
            .collect();
        debug!(
            sentences = candidates.len(),
            flagged = candidates.iter().filter(|c| c.needs_citation).count(),
            "claim detection complete"
        );
        candidates
    }
}

impl Default for ClaimDetector {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citescout_common::model::ClaimType;

    #[test]
    fn test_detect_preserves_document_order() {
        let detector = ClaimDetector::default();
        let claims = detector.detect(
            "Studies show that exercise reduces cardiovascular risk. \
             The weather was pleasant throughout the conference. \
             Mortality fell by 12% compared to the prior decade.",
        );
        assert_eq!(claims.len(), 3);
        assert!(claims[0].needs_citation);
        assert!(!claims[1].needs_citation);
        assert!(claims[2].needs_citation);
        assert_eq!(claims[2].claim_type, ClaimType::Statistical);
        for (i, claim) in claims.iter().enumerate() {
            assert_eq!(claim.sentence.index, i);
        }
    }

    #[test]
    fn test_detect_empty_input_is_empty() {
        let detector = ClaimDetector::default();
        assert!(detector.detect("").is_empty());
        assert!(detector.detect(" \u{0} \u{fffd} ").is_empty());
    }
}
