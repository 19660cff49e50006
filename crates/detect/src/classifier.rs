//! Cue-based claim classifier
//!
//! Flags sentences that assert facts conventionally requiring a citation:
//! quantitative assertions, comparative claims, causal/empirical verbs, and
//! attributed-but-unsourced statements. Questions, already-cited sentences,
//! and the author's own opinion or methodology are never flagged.

use citescout_common::model::{ClaimCandidate, ClaimType, Sentence};
use regex_lite::Regex;

/// One weighted cue pattern mapped to a claim type.
struct Cue {
    pattern: Regex,
    claim_type: ClaimType,
    weight: f32,
}

/// Sentences matching any of these are considered already sourced or not the
/// kind of statement that takes a citation.
struct Suppressors {
    already_cited: Vec<Regex>,
    own_voice: Vec<Regex>,
}

/// Claim detector configuration knobs (tunable defaults, not protocol
/// constants).
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Threshold separating needs_citation true/false.
    pub confidence_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.2,
        }
    }
}

pub struct ClaimClassifier {
    cues: Vec<Cue>,
    suppressors: Suppressors,
    config: ClassifierConfig,
}

impl ClaimClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            cues: build_cues(),
            suppressors: build_suppressors(),
            config,
        }
    }

    /// Score one sentence. Confidence combines summed cue weights (with
    /// saturation) and a short-sentence penalty; the claim type is the
    /// highest-priority matched cue group.
    pub fn classify(&self, sentence: Sentence) -> ClaimCandidate {
        if self.is_suppressed(&sentence.text) {
            return ClaimCandidate {
                sentence,
                needs_citation: false,
                confidence: 0.0,
                claim_type: ClaimType::None,
            };
        }

        let mut total_weight = 0.0f32;
        let mut best: Option<(ClaimType, f32)> = None;
        for cue in &self.cues {
            if cue.pattern.is_match(&sentence.text) {
                total_weight += cue.weight;
                let better = match best {
                    None => true,
                    Some((ty, w)) => {
                        priority(cue.claim_type) < priority(ty)
                            || (priority(cue.claim_type) == priority(ty) && cue.weight > w)
                    }
                };
                if better {
                    best = Some((cue.claim_type, cue.weight));
                }
            }
        }

        let confidence = self.confidence(total_weight, &sentence.text);
        let needs_citation = confidence >= self.config.confidence_threshold;
        ClaimCandidate {
            sentence,
            needs_citation,
            claim_type: if needs_citation {
                best.map(|(ty, _)| ty).unwrap_or(ClaimType::None)
            } else {
                ClaimType::None
            },
            confidence,
        }
    }

    /// Bounded score: saturation over summed weights, scaled down for very
    /// short sentences where a single cue word is weak evidence.
    fn confidence(&self, total_weight: f32, text: &str) -> f32 {
        if total_weight <= 0.0 {
            return 0.0;
        }
        let saturated = total_weight / (total_weight + 1.0);
        let words = text.split_whitespace().count();
        let length_factor = (words as f32 / 6.0).min(1.0);
        (saturated * length_factor).clamp(0.0, 1.0)
    }

    fn is_suppressed(&self, text: &str) -> bool {
        if text.trim_end().ends_with('?') {
            return true;
        }
        self.suppressors
            .already_cited
            .iter()
            .chain(self.suppressors.own_voice.iter())
            .any(|re| re.is_match(text))
    }
}

/// Priority order for resolving the claim type when several cue groups
/// match: statistical > comparative > empirical > attributed > definitional.
fn priority(ty: ClaimType) -> u8 {
    match ty {
        ClaimType::Statistical => 0,
        ClaimType::Comparative => 1,
        ClaimType::Empirical => 2,
        ClaimType::Attributed => 3,
        ClaimType::Definitional => 4,
        ClaimType::None => 5,
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).expect("static cue pattern")
}

fn build_cues() -> Vec<Cue> {
    let cue = |pattern: &str, claim_type, weight| Cue {
        pattern: re(pattern),
        claim_type,
        weight,
    };
    vec![
        // Statistical
        cue(r"\d+(\.\d+)?\s*%", ClaimType::Statistical, 0.6),
        cue(
            r"\bstatistics (show|indicate|suggest)\b",
            ClaimType::Statistical,
            0.6,
        ),
        cue(
            r"\b(prevalence|incidence|proportion|rate) of\b",
            ClaimType::Statistical,
            0.45,
        ),
        cue(
            r"\d{1,3}(,\d{3})+\s+(people|cases|deaths|patients)\b",
            ClaimType::Statistical,
            0.6,
        ),
        cue(r"\bapproximately \d", ClaimType::Statistical, 0.45),
        cue(
            r"\b(rose|risen|increased|decreased|declined|fell|grew|grown) by \d",
            ClaimType::Statistical,
            0.6,
        ),
        cue(
            r"\d+(\.\d+)?\s*(°|degrees|percent|million|billion|thousand)",
            ClaimType::Statistical,
            0.6,
        ),
        cue(
            r"\b(statistically )?significant(ly)?\b",
            ClaimType::Statistical,
            0.45,
        ),
        // Comparative
        cue(
            r"\b(higher|lower|greater|fewer|more|less|better|worse) than\b",
            ClaimType::Comparative,
            0.45,
        ),
        cue(r"\bcompared (to|with)\b", ClaimType::Comparative, 0.45),
        cue(r"\b\d+\s*(times|fold)\b", ClaimType::Comparative, 0.45),
        // Empirical
        cue(
            r"\bstudies (show|suggest|indicate|demonstrate|have shown)\b",
            ClaimType::Empirical,
            0.6,
        ),
        cue(
            r"\bresearch (shows|suggests|indicates|demonstrates|has shown)\b",
            ClaimType::Empirical,
            0.6,
        ),
        cue(
            r"\bevidence (suggests|indicates|shows|demonstrates)\b",
            ClaimType::Empirical,
            0.6,
        ),
        cue(
            r"\bit (has been|is) (shown|demonstrated|found|reported|established)\b",
            ClaimType::Empirical,
            0.6,
        ),
        cue(r"\bfound that\b", ClaimType::Empirical, 0.45),
        cue(
            r"\b(causes?|caused by|leads? to|results? in|due to|attributed to)\b",
            ClaimType::Empirical,
            0.6,
        ),
        cue(
            r"\b(correlated|associated|linked) with\b",
            ClaimType::Empirical,
            0.6,
        ),
        cue(
            r"\b(meta-analysis|systematic review|randomized|clinical trial|cohort study|longitudinal)\b",
            ClaimType::Empirical,
            0.6,
        ),
        cue(
            r"\b(previous|prior|earlier|recent|past) (studies|research|work|literature|findings)\b",
            ClaimType::Empirical,
            0.45,
        ),
        cue(
            r"\b(reduces?|increases?) (the )?(risk|likelihood|chance|probability)\b",
            ClaimType::Empirical,
            0.45,
        ),
        cue(
            r"\bhas a significant (effect|impact|influence)\b",
            ClaimType::Empirical,
            0.45,
        ),
        // Attributed
        cue(r"\baccording to\b", ClaimType::Attributed, 0.45),
        cue(
            r"\bexperts (argue|suggest|believe|claim|agree)\b",
            ClaimType::Attributed,
            0.6,
        ),
        cue(
            r"\bis (widely|generally|commonly) (accepted|known|believed|recognized)\b",
            ClaimType::Attributed,
            0.45,
        ),
        cue(
            r"\bhas been (proven|demonstrated|established|shown)\b",
            ClaimType::Attributed,
            0.45,
        ),
        // Definitional
        cue(
            r"\bis (defined|classified|characterized) as\b",
            ClaimType::Definitional,
            0.3,
        ),
        cue(r"\brefers? to\b", ClaimType::Definitional, 0.3),
    ]
}

fn build_suppressors() -> Suppressors {
    Suppressors {
        already_cited: vec![
            re(r"\[\d+\]"),
            re(r"\(\w[\w\s.]*,?\s*\d{4}\)"),
            re(r"\bibid\."),
            re(r"\bop\.\s*cit\."),
        ],
        own_voice: vec![
            re(r"\b(i|we) (believe|think|feel|argue|propose|assume|prefer)\b"),
            re(r"\bin (my|our) (opinion|view|experience)\b"),
            re(r"\bwe (used|use|present|describe|introduce)\b"),
            re(r"\bin this (paper|study|work|section)\b"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> ClaimCandidate {
        let classifier = ClaimClassifier::new(ClassifierConfig::default());
        classifier.classify(Sentence {
            index: 0,
            text: text.to_string(),
            char_span: (0, text.len()),
        })
    }

    #[test]
    fn test_studies_show_flagged() {
        let claim = classify("Studies show that exercise reduces cardiovascular risk.");
        assert!(claim.needs_citation);
        assert_eq!(claim.claim_type, ClaimType::Empirical);
    }

    #[test]
    fn test_percentage_is_statistical() {
        let claim = classify("The treatment was effective in 73% of patients.");
        assert!(claim.needs_citation);
        assert_eq!(claim.claim_type, ClaimType::Statistical);
    }

    #[test]
    fn test_temperature_example_is_statistical() {
        let claim =
            classify("Global temperatures have risen by 1.1°C since pre-industrial times.");
        assert!(claim.needs_citation);
        assert_eq!(claim.claim_type, ClaimType::Statistical);
    }

    #[test]
    fn test_comparison_flagged() {
        let claim = classify("The treated group performed better compared to matched controls.");
        assert!(claim.needs_citation);
        assert_eq!(claim.claim_type, ClaimType::Comparative);
    }

    #[test]
    fn test_causation_flagged() {
        let claim = classify("Smoking causes lung cancer in a majority of long-term users.");
        assert!(claim.needs_citation);
        assert_eq!(claim.claim_type, ClaimType::Empirical);
    }

    #[test]
    fn test_correlation_flagged() {
        assert!(classify("Obesity is strongly correlated with type 2 diabetes.").needs_citation);
    }

    #[test]
    fn test_meta_analysis_flagged() {
        assert!(classify("A meta-analysis of 50 studies found a strong effect.").needs_citation);
    }

    #[test]
    fn test_attributed_claim() {
        let claim = classify("According to leading researchers, the findings hold broadly.");
        assert!(claim.needs_citation);
        assert_eq!(claim.claim_type, ClaimType::Attributed);
    }

    #[test]
    fn test_plain_statement_not_flagged() {
        let claim = classify("The sky is blue over the city today.");
        assert!(!claim.needs_citation);
        assert_eq!(claim.claim_type, ClaimType::None);
        assert_eq!(claim.confidence, 0.0);
    }

    #[test]
    fn test_opinion_not_flagged() {
        let claim = classify("I believe this approach is elegant.");
        assert!(!claim.needs_citation);
        assert_eq!(claim.claim_type, ClaimType::None);
    }

    #[test]
    fn test_question_not_flagged() {
        assert!(!classify("Does exercise reduce cardiovascular risk?").needs_citation);
    }

    #[test]
    fn test_already_cited_bracket_not_flagged() {
        assert!(!classify("Exercise reduces the risk of heart disease [1].").needs_citation);
    }

    #[test]
    fn test_already_cited_author_year_not_flagged() {
        assert!(!classify("Studies confirm this effect (Smith, 2020).").needs_citation);
    }

    #[test]
    fn test_confidence_is_bounded() {
        let claim = classify(
            "Studies show that smoking causes cancer, is correlated with heart disease, \
             increased by 40% compared to controls, and statistics show significant effects.",
        );
        assert!(claim.confidence > 0.0 && claim.confidence <= 1.0);
    }

    #[test]
    fn test_statistical_priority_over_empirical() {
        let claim = classify("Studies show mortality increased by 12% over the decade.");
        assert!(claim.needs_citation);
        assert_eq!(claim.claim_type, ClaimType::Statistical);
    }
}
