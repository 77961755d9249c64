//! Per-run quality metrics

use crate::model::request::Language;
use crate::pipeline::score::ScoredCandidate;
use crate::pipeline::validate::ValidationOutcome;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

const KOREAN_PARTICLES: &[&str] = &[
    "은", "는", "이", "가", "을", "를", "에", "에서", "으로", "로", "와", "과", "하고", "이랑", "랑",
    "도", "만", "까지", "부터", "의", "에게", "한테", "께", "보다",
];

const KOREAN_NOUN_ENDINGS: &[&str] = &[
    "이", "가", "은", "는", "을", "를", "에", "에서", "으로", "로", "와", "과", "도", "만", "의",
    "에게", "한테",
];

const KOREAN_VERB_ENDINGS: &[char] = &['요', '어', '아', '야', '다', '지', '네', '래'];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineMetrics {
    /// Raw candidates returned by the generator across all attempts
    pub total_generated: usize,
    pub unsafe_filtered: usize,
    pub validation_passed: usize,
    /// `validation_passed / total_generated * 100`
    pub validation_rate: f64,
    pub fail_reasons: BTreeMap<String, usize>,
    pub unique_structures: usize,
    /// Unique nouns over total nouns in the selected items, as a percentage
    pub vocabulary_diversity: f64,
    pub final_count: usize,
    /// Contrast sets that passed validation, before truncation
    pub contrast_sets_validated: usize,
}

impl PipelineMetrics {
    pub fn record_batch(&mut self, generated: usize, safe: usize, outcomes: &[ValidationOutcome]) {
        self.total_generated += generated;
        self.unsafe_filtered += generated.saturating_sub(safe);
        for outcome in outcomes {
            match &outcome.fail_reason {
                None => self.validation_passed += 1,
                Some(reason) => {
                    *self.fail_reasons.entry(reason.tag().to_string()).or_insert(0) += 1
                }
            }
        }
        self.validation_rate = if self.total_generated > 0 {
            self.validation_passed as f64 / self.total_generated as f64 * 100.0
        } else {
            0.0
        };
    }

    pub fn record_selection(&mut self, selected: &[ScoredCandidate], language: Language) {
        self.final_count = selected.len();

        let structures: BTreeSet<String> = selected
            .iter()
            .map(|c| sentence_structure(&c.sentence, language))
            .collect();
        self.unique_structures = structures.len();

        let all_nouns: Vec<String> = selected
            .iter()
            .flat_map(|c| extract_nouns(&c.sentence, language))
            .collect();
        self.vocabulary_diversity = if all_nouns.is_empty() {
            0.0
        } else {
            let unique: BTreeSet<&String> = all_nouns.iter().collect();
            unique.len() as f64 / all_nouns.len() as f64 * 100.0
        };
    }

    pub fn log(&self) {
        let fail_reasons = self
            .fail_reasons
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            generated = self.total_generated,
            unsafe_filtered = self.unsafe_filtered,
            passed = self.validation_passed,
            validation_rate = format!("{:.0}%", self.validation_rate),
            fail_reasons = %fail_reasons,
            unique_structures = self.unique_structures,
            vocabulary_diversity = format!("{:.0}%", self.vocabulary_diversity),
            final_count = self.final_count,
            contrast_sets = self.contrast_sets_validated,
            "Pipeline metrics"
        );
    }
}

fn strip_suffix_longest<'a>(word: &'a str, suffixes: &[&str]) -> Option<(&'a str, &'a str)> {
    let mut sorted: Vec<&str> = suffixes.to_vec();
    sorted.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
    sorted.into_iter().find_map(|suffix| {
        let stem = word.strip_suffix(suffix)?;
        (!stem.is_empty()).then(|| (stem, &word[stem.len()..]))
    })
}

/// Abstract sentence shape: `"강아지가 밥을 먹어요"` -> `"N가 N을 V"`.
/// English sentences are compared as lowercased text.
pub fn sentence_structure(sentence: &str, language: Language) -> String {
    if language != Language::Ko {
        return sentence.to_lowercase();
    }
    sentence
        .split_whitespace()
        .map(|word| {
            if let Some((_, particle)) = strip_suffix_longest(word, KOREAN_PARTICLES) {
                return format!("N{}", particle);
            }
            match word.chars().last() {
                Some(c) if KOREAN_VERB_ENDINGS.contains(&c) => "V".to_string(),
                Some(c @ ('!' | '?' | '~')) => format!("V{}", c),
                _ => "X".to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Particle-stripped nouns of at least two characters (word set for English)
pub fn extract_nouns(sentence: &str, language: Language) -> BTreeSet<String> {
    if language != Language::Ko {
        return sentence.to_lowercase().split_whitespace().map(str::to_string).collect();
    }
    sentence
        .split_whitespace()
        .map(|word| match strip_suffix_longest(word, KOREAN_NOUN_ENDINGS) {
            Some((stem, _)) => stem,
            None => word,
        })
        .filter(|noun| noun.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::score::ScoreBreakdown;
    use crate::pipeline::validate::FailReason;

    #[test]
    fn test_korean_structure() {
        assert_eq!(sentence_structure("강아지가 밥을 먹어요", Language::Ko), "N가 N을 V");
        assert_eq!(sentence_structure("라면이랑 김밥 먹을래?", Language::Ko), "N이랑 X V?");
        assert_eq!(sentence_structure("Red Car", Language::En), "red car");
    }

    #[test]
    fn test_extract_nouns() {
        let nouns = extract_nouns("강아지가 밥을 먹어요", Language::Ko);
        assert!(nouns.contains("강아지"));
        assert!(!nouns.contains("밥"));
        assert!(nouns.contains("먹어요"));
    }

    #[test]
    fn test_record_batch_counts() {
        let mut metrics = PipelineMetrics::default();
        let outcomes = vec![
            ValidationOutcome {
                sentence: "a b".into(),
                passed: true,
                matched_words: vec![],
                matched_spans: vec![],
                word_count: 2,
                fail_reason: None,
            },
            ValidationOutcome {
                sentence: "a".into(),
                passed: false,
                matched_words: vec![],
                matched_spans: vec![],
                word_count: 1,
                fail_reason: Some(FailReason::WordCount { expected: 2, got: 1 }),
            },
        ];
        metrics.record_batch(4, 2, &outcomes);

        assert_eq!(metrics.total_generated, 4);
        assert_eq!(metrics.unsafe_filtered, 2);
        assert_eq!(metrics.validation_passed, 1);
        assert_eq!(metrics.validation_rate, 25.0);
        assert_eq!(metrics.fail_reasons.get("word_count"), Some(&1));
    }

    #[test]
    fn test_record_selection() {
        let make = |s: &str| ScoredCandidate {
            sentence: s.to_string(),
            matched_words: vec![],
            matched_spans: vec![],
            word_count: 3,
            score: 50.0,
            breakdown: ScoreBreakdown::default(),
            order: 0,
        };
        let mut metrics = PipelineMetrics::default();
        let picked = [make("강아지가 밥을 먹어요"), make("강아지가 물을 마셔요")];
        metrics.record_selection(&picked, Language::Ko);

        assert_eq!(metrics.final_count, 2);
        assert_eq!(metrics.unique_structures, 1);
        // nouns: 강아지, 먹어요, 강아지, 마셔요
        assert_eq!(metrics.vocabulary_diversity, 75.0);
    }
}
