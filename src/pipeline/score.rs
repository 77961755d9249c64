//! Composite desirability score for validated candidates

use crate::model::request::GenerationRequest;
use crate::phoneme::WordSpan;
use crate::pipeline::validate::ValidationOutcome;
use crate::reference::{FrequencyTable, FunctionPatternTable, ReferenceData};

pub const FREQUENCY_WEIGHT: f64 = 0.4;
pub const FUNCTION_WEIGHT: f64 = 0.3;
pub const MATCH_BONUS_WEIGHT: f64 = 0.2;
pub const LENGTH_FIT_WEIGHT: f64 = 0.1;

/// Bonus per matched word, capped at 100
const MATCH_BONUS_STEP: f64 = 30.0;

/// Each component lies in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub frequency: f64,
    pub function: f64,
    pub match_bonus: f64,
    pub length_fit: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        FREQUENCY_WEIGHT * self.frequency
            + FUNCTION_WEIGHT * self.function
            + MATCH_BONUS_WEIGHT * self.match_bonus
            + LENGTH_FIT_WEIGHT * self.length_fit
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub sentence: String,
    pub matched_words: Vec<String>,
    pub matched_spans: Vec<WordSpan>,
    pub word_count: usize,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Position in the accumulated pool; breaks score ties
    pub order: usize,
}

pub struct SentenceScorer<'a> {
    frequency: &'a FrequencyTable,
    patterns: Option<&'a FunctionPatternTable>,
}

impl<'a> SentenceScorer<'a> {
    pub fn new(frequency: &'a FrequencyTable, patterns: Option<&'a FunctionPatternTable>) -> Self {
        Self { frequency, patterns }
    }

    pub fn for_request(reference: &'a ReferenceData, request: &GenerationRequest) -> Self {
        Self::new(
            reference.frequency(request.language),
            reference.function_patterns(request.language),
        )
    }

    pub fn breakdown(
        &self,
        sentence: &str,
        matched_words: &[String],
        request: &GenerationRequest,
    ) -> ScoreBreakdown {
        let frequency = round2(self.frequency.sentence_score(sentence));

        let function = match (request.communicative_function, self.patterns) {
            (Some(function), Some(patterns)) if patterns.matches(function, sentence) => 100.0,
            _ => 0.0,
        };

        let match_bonus = (MATCH_BONUS_STEP * matched_words.len() as f64).min(100.0);

        ScoreBreakdown {
            frequency: clamp(frequency),
            function: clamp(function),
            match_bonus: clamp(match_bonus),
            length_fit: 100.0,
        }
    }

    /// Score passing outcomes, best first; equal scores keep pool order
    pub fn score(
        &self,
        pool: Vec<ValidationOutcome>,
        request: &GenerationRequest,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = pool
            .into_iter()
            .filter(|outcome| outcome.passed)
            .enumerate()
            .map(|(order, outcome)| {
                let breakdown = self.breakdown(&outcome.sentence, &outcome.matched_words, request);
                ScoredCandidate {
                    score: breakdown.total(),
                    sentence: outcome.sentence,
                    matched_words: outcome.matched_words,
                    matched_spans: outcome.matched_spans,
                    word_count: outcome.word_count,
                    breakdown,
                    order,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.order.cmp(&b.order)));
        scored
    }
}

fn clamp(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::request::{
        CommunicativeFunction, DiagnosisType, Language, PhonemePosition, TargetSpec,
        TherapyApproach,
    };

    fn request(function: Option<CommunicativeFunction>) -> GenerationRequest {
        GenerationRequest {
            language: Language::Ko,
            age: 5,
            count: 3,
            target: Some(TargetSpec::new("ㄹ", PhonemePosition::Onset, 1)),
            sentence_length: 2,
            diagnosis: DiagnosisType::Ssd,
            therapy_approach: TherapyApproach::MinimalPairs,
            theme: None,
            communicative_function: function,
            core_words: None,
            phonological_rules_mode: None,
        }
    }

    fn passed(sentence: &str, matched: &[&str]) -> ValidationOutcome {
        ValidationOutcome {
            sentence: sentence.to_string(),
            passed: true,
            matched_words: matched.iter().map(|w| w.to_string()).collect(),
            matched_spans: Vec::new(),
            word_count: sentence.split_whitespace().count(),
            fail_reason: None,
        }
    }

    #[test]
    fn test_breakdown_and_weights() {
        let table = FrequencyTable::from_json(r#"{"라면": 70, "주세요": 90}"#).unwrap();
        let patterns = FunctionPatternTable::korean().unwrap();
        let scorer = SentenceScorer::new(&table, Some(&patterns));

        let request = request(Some(CommunicativeFunction::Request));
        let b = scorer.breakdown("라면 주세요", &["라면".to_string()], &request);
        assert_eq!(b.frequency, 80.0);
        assert_eq!(b.function, 100.0);
        assert_eq!(b.match_bonus, 30.0);
        assert_eq!(b.length_fit, 100.0);
        assert!((b.total() - (32.0 + 30.0 + 6.0 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_match_bonus_caps() {
        let table = FrequencyTable::empty();
        let scorer = SentenceScorer::new(&table, None);
        let words: Vec<String> = (0..5).map(|i| format!("w{}", i)).collect();
        let b = scorer.breakdown("a b", &words, &request(None));
        assert_eq!(b.match_bonus, 100.0);
        assert_eq!(b.frequency, 50.0);
    }

    #[test]
    fn test_function_needs_patterns() {
        let table = FrequencyTable::empty();
        let scorer = SentenceScorer::new(&table, None);
        let b = scorer.breakdown("우유 주세요", &[], &request(Some(CommunicativeFunction::Request)));
        assert_eq!(b.function, 0.0);
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let table = FrequencyTable::empty();
        let scorer = SentenceScorer::new(&table, None);
        let pool = vec![
            passed("a b", &["a"]),
            passed("c d", &["c", "d"]),
            passed("e f", &["e"]),
            passed("g h", &[]),
        ];
        let scored = scorer.score(pool, &request(None));

        let sentences: Vec<&str> = scored.iter().map(|s| s.sentence.as_str()).collect();
        assert_eq!(sentences, vec!["c d", "a b", "e f", "g h"]);
        assert!(scored.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_failed_outcomes_ignored() {
        let table = FrequencyTable::empty();
        let scorer = SentenceScorer::new(&table, None);
        let mut failed = passed("x y", &[]);
        failed.passed = false;
        assert!(scorer.score(vec![failed], &request(None)).is_empty());
    }

    #[test]
    fn test_order_counts_passing_outcomes_only() {
        let table = FrequencyTable::empty();
        let scorer = SentenceScorer::new(&table, None);
        let mut failed = passed("x y", &["x"]);
        failed.passed = false;
        let pool = vec![failed, passed("a b", &[]), passed("c d", &[])];

        let scored = scorer.score(pool, &request(None));
        let orders: Vec<usize> = scored.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1]);
    }
}

#[cfg(test)]
mod proptests {
    use super::tests_support::*;
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn scores_non_increasing_with_ties_in_pool_order(
            pool in prop::collection::vec((0usize..5, any::<bool>()), 0..40),
        ) {
            let table = FrequencyTable::empty();
            let scorer = SentenceScorer::new(&table, None);
            let outcomes: Vec<ValidationOutcome> = pool
                .iter()
                .enumerate()
                .map(|(i, &(matches, ok))| outcome(i, matches, ok))
                .collect();
            let passing = pool.iter().filter(|(_, ok)| *ok).count();

            let scored = scorer.score(outcomes, &plain_request());

            prop_assert_eq!(scored.len(), passing);
            for pair in scored.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pair[0].order < pair[1].order);
                }
            }
        }
    }
}
