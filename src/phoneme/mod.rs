//! Phoneme detection for the two supported languages
//!
//! `korean` decomposes Hangul syllable blocks; `english` looks words up in a
//! pronouncing dictionary and falls back to a letter-to-sound predictor.
//! Both expose the same sentence-level query through [`PhonemeMatcher`].

pub mod english;
pub mod korean;
pub mod phonology;

pub use english::{CmuDictionary, EnglishPhonemeEngine, LetterToSoundPredictor, PhoneSource};
pub use korean::{decompose, KoreanPhonemeEngine, Syllable};
pub use phonology::{PhonologicalRule, RuleCheck, RuleEnvironment};

use crate::model::request::TargetSpec;

/// A stretch of the sentence as written, in char offsets (end exclusive)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl WordSpan {
    /// Narrow to the part between the first and last char accepted by `keep`
    pub fn trimmed(&self, keep: impl Fn(char) -> bool) -> WordSpan {
        let chars: Vec<char> = self.text.chars().collect();
        let Some(first) = chars.iter().position(|&c| keep(c)) else {
            return self.clone();
        };
        let last = chars.iter().rposition(|&c| keep(c)).unwrap_or(first);
        WordSpan {
            text: chars[first..=last].iter().collect(),
            start: self.start + first,
            end: self.start + last + 1,
        }
    }
}

/// Whitespace tokens with their char offsets
pub fn tokenize(sentence: &str) -> Vec<WordSpan> {
    let mut spans = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (index, ch) in sentence.chars().enumerate() {
        if ch.is_whitespace() {
            if let Some((start, text)) = current.take() {
                spans.push(WordSpan { end: start + text.chars().count(), start, text });
            }
        } else {
            current.get_or_insert_with(|| (index, String::new())).1.push(ch);
        }
    }
    if let Some((start, text)) = current {
        spans.push(WordSpan { end: start + text.chars().count(), start, text });
    }
    spans
}

/// Sentence-level match evidence
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhonemeMatch {
    /// Qualifying words in sentence order, in the matcher's normalized form
    pub matched_words: Vec<String>,
    /// Where each matched word sits in the sentence; parallel to `matched_words`
    pub spans: Vec<WordSpan>,
    pub count: usize,
    pub meets_minimum: bool,
}

impl PhonemeMatch {
    pub fn new(matches: Vec<(String, WordSpan)>, min_occurrences: usize) -> Self {
        let count = matches.len();
        let (matched_words, spans) = matches.into_iter().unzip();
        Self {
            matched_words,
            spans,
            count,
            meets_minimum: count >= min_occurrences,
        }
    }
}

/// Language-specific detector consulted by the validator
pub trait PhonemeMatcher: Send + Sync {
    fn find_matches(&self, sentence: &str, target: &TargetSpec) -> PhonemeMatch;

    fn name(&self) -> &'static str;
}

/// Uppercase a phone and drop its stress digits (`"AH0"` -> `"AH"`)
pub fn normalize_phone(phone: &str) -> String {
    phone
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_ascii_uppercase()
}
