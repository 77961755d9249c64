//! Contrast-set checks for minimal-pair and maximal-opposition drills
//!
//! A set is kept when both sentences have exactly `sentence_length` tokens,
//! the target sentence carries the target phoneme, each named word appears
//! inside a token of its own sentence, and neither sentence trips the guard.

use crate::model::item::ContrastSet;
use crate::model::request::GenerationRequest;
use crate::phoneme::PhonemeMatcher;
use crate::reference::SafetyGuard;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContrastRejection {
    Unsafe,
    TokenCount {
        target: usize,
        contrast: usize,
        expected: usize,
    },
    Phoneme {
        found: usize,
        need: usize,
    },
    TargetWordMissing(String),
    ContrastWordMissing(String),
}

impl fmt::Display for ContrastRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContrastRejection::Unsafe => f.write_str("unsafe text"),
            ContrastRejection::TokenCount {
                target,
                contrast,
                expected,
            } => write!(
                f,
                "token count: target {}, contrast {}, expected {}",
                target, contrast, expected
            ),
            ContrastRejection::Phoneme { found, need } => {
                write!(f, "phoneme: found {}, need {}", found, need)
            }
            ContrastRejection::TargetWordMissing(word) => {
                write!(f, "target word '{}' not in target tokens", word)
            }
            ContrastRejection::ContrastWordMissing(word) => {
                write!(f, "contrast word '{}' not in contrast tokens", word)
            }
        }
    }
}

/// Korean tokens carry particles, so a word only has to sit inside a token
fn word_in_tokens(word: &str, tokens: &[String]) -> bool {
    word.is_empty() || tokens.iter().any(|token| token.contains(word))
}

pub struct ContrastValidator<'a> {
    matcher: &'a dyn PhonemeMatcher,
    guard: &'a SafetyGuard,
}

impl<'a> ContrastValidator<'a> {
    pub fn new(matcher: &'a dyn PhonemeMatcher, guard: &'a SafetyGuard) -> Self {
        Self { matcher, guard }
    }

    pub fn check(
        &self,
        set: &ContrastSet,
        request: &GenerationRequest,
    ) -> Result<(), ContrastRejection> {
        if !self.guard.is_safe(&set.target_sentence.text)
            || !self.guard.is_safe(&set.contrast_sentence.text)
        {
            return Err(ContrastRejection::Unsafe);
        }

        let target = set.target_sentence.tokens.len();
        let contrast = set.contrast_sentence.tokens.len();
        if target != request.sentence_length || contrast != request.sentence_length {
            return Err(ContrastRejection::TokenCount {
                target,
                contrast,
                expected: request.sentence_length,
            });
        }

        if let Some(spec) = request.phoneme_target() {
            let found = self.matcher.find_matches(&set.target_sentence.text, spec);
            if !found.meets_minimum {
                return Err(ContrastRejection::Phoneme {
                    found: found.count,
                    need: spec.min_occurrences,
                });
            }
        }

        if !word_in_tokens(&set.target_word, &set.target_sentence.tokens) {
            return Err(ContrastRejection::TargetWordMissing(set.target_word.clone()));
        }
        if !word_in_tokens(&set.contrast_word, &set.contrast_sentence.tokens) {
            return Err(ContrastRejection::ContrastWordMissing(set.contrast_word.clone()));
        }
        Ok(())
    }

    /// Passing sets in input order
    pub fn validate(
        &self,
        sets: Vec<ContrastSet>,
        request: &GenerationRequest,
    ) -> Vec<ContrastSet> {
        sets.into_iter()
            .enumerate()
            .filter_map(|(index, set)| match self.check(&set, request) {
                Ok(()) => Some(set),
                Err(reason) => {
                    debug!(index, reason = %reason, "Contrast set rejected");
                    None
                }
            })
            .collect()
    }
}
