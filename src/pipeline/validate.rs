//! Hard constraints: exact word count, phonological-rule mode (Korean),
//! core-word use (core vocabulary), then target-phoneme evidence

use crate::model::request::{
    GenerationRequest, Language, PhonologicalRulesMode, TargetSpec, TherapyApproach,
};
use crate::phoneme::phonology::check_rules;
use crate::phoneme::{PhonemeMatch, PhonemeMatcher, WordSpan};
use crate::reference::core_vocab::{find_core_word, resolve_core_words};
use std::fmt;

/// Why a candidate was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    WordCount { expected: usize, got: usize },
    Phonology { mode: PhonologicalRulesMode, environments: usize },
    CoreVocabulary,
    Phoneme { found: usize, need: usize },
}

impl FailReason {
    /// Stable tag used for metrics keys
    pub fn tag(&self) -> &'static str {
        match self {
            FailReason::WordCount { .. } => "word_count",
            FailReason::Phonology { .. } => "phonological_rule",
            FailReason::CoreVocabulary => "core_vocabulary",
            FailReason::Phoneme { .. } => "phoneme",
        }
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::WordCount { expected, got } => {
                write!(f, "word_count: expected {}, got {}", expected, got)
            }
            FailReason::Phonology { mode: PhonologicalRulesMode::Train, .. } => {
                f.write_str("phonological_rule: no rule environment to train")
            }
            FailReason::Phonology { environments, .. } => {
                write!(f, "phonological_rule: {} environment(s) to avoid", environments)
            }
            FailReason::CoreVocabulary => f.write_str("core_vocabulary: no core word used"),
            FailReason::Phoneme { found, need } => {
                write!(f, "phoneme: found {}, need {}", found, need)
            }
        }
    }
}

/// Per-candidate verdict. `passed` iff `fail_reason` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub sentence: String,
    pub passed: bool,
    pub matched_words: Vec<String>,
    /// Where each matched word sits in `sentence`; parallel to `matched_words`
    pub matched_spans: Vec<WordSpan>,
    pub word_count: usize,
    pub fail_reason: Option<FailReason>,
}

impl ValidationOutcome {
    fn pass(sentence: String, found: PhonemeMatch, word_count: usize) -> Self {
        Self {
            sentence,
            passed: true,
            matched_words: found.matched_words,
            matched_spans: found.spans,
            word_count,
            fail_reason: None,
        }
    }

    fn fail(sentence: String, found: PhonemeMatch, word_count: usize, reason: FailReason) -> Self {
        Self {
            sentence,
            passed: false,
            matched_words: found.matched_words,
            matched_spans: found.spans,
            word_count,
            fail_reason: Some(reason),
        }
    }
}

/// Request-derived checks, resolved once per batch
struct Constraints<'r> {
    sentence_length: usize,
    rules_mode: Option<PhonologicalRulesMode>,
    core_words: Option<Vec<String>>,
    target: Option<&'r TargetSpec>,
    language: Language,
}

impl<'r> Constraints<'r> {
    fn from_request(request: &'r GenerationRequest) -> Self {
        let core_words = (request.therapy_approach == TherapyApproach::CoreVocabulary)
            .then(|| resolve_core_words(request.language, request.core_words.as_deref()));
        Self {
            sentence_length: request.sentence_length,
            rules_mode: request.enforced_rules_mode(),
            core_words,
            target: request.phoneme_target(),
            language: request.language,
        }
    }
}

/// Pure predicate over candidates; holds the active language's matcher
pub struct SentenceValidator<'a> {
    matcher: &'a dyn PhonemeMatcher,
}

impl<'a> SentenceValidator<'a> {
    pub fn new(matcher: &'a dyn PhonemeMatcher) -> Self {
        Self { matcher }
    }

    pub fn validate(
        &self,
        candidates: Vec<String>,
        request: &GenerationRequest,
    ) -> Vec<ValidationOutcome> {
        let constraints = Constraints::from_request(request);
        candidates
            .into_iter()
            .map(|candidate| self.check(candidate, &constraints))
            .collect()
    }

    pub fn validate_one(&self, sentence: String, request: &GenerationRequest) -> ValidationOutcome {
        self.check(sentence, &Constraints::from_request(request))
    }

    fn check(&self, sentence: String, constraints: &Constraints<'_>) -> ValidationOutcome {
        let word_count = sentence.split_whitespace().count();
        if word_count != constraints.sentence_length {
            let reason = FailReason::WordCount {
                expected: constraints.sentence_length,
                got: word_count,
            };
            return ValidationOutcome::fail(sentence, PhonemeMatch::default(), word_count, reason);
        }

        if let Some(mode) = constraints.rules_mode {
            let rules = check_rules(&sentence, mode);
            if !rules.passed {
                let reason = FailReason::Phonology {
                    mode,
                    environments: rules.environments.len(),
                };
                return ValidationOutcome::fail(
                    sentence,
                    PhonemeMatch::default(),
                    word_count,
                    reason,
                );
            }
        }

        if let Some(core_words) = &constraints.core_words {
            if find_core_word(&sentence, core_words, constraints.language).is_none() {
                let reason = FailReason::CoreVocabulary;
                return ValidationOutcome::fail(
                    sentence,
                    PhonemeMatch::default(),
                    word_count,
                    reason,
                );
            }
        }

        let Some(target) = constraints.target else {
            return ValidationOutcome::pass(sentence, PhonemeMatch::default(), word_count);
        };

        let found = self.matcher.find_matches(&sentence, target);
        if !found.meets_minimum {
            let reason = FailReason::Phoneme {
                found: found.count,
                need: target.min_occurrences,
            };
            return ValidationOutcome::fail(sentence, found, word_count, reason);
        }
        ValidationOutcome::pass(sentence, found, word_count)
    }
}
