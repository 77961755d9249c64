//! Hangul syllable-block engine
//!
//! Every precomposed syllable in U+AC00..=U+D7A3 is
//! `BASE + (onset * 21 + nucleus) * 28 + coda`, so decomposition is pure
//! arithmetic against the jamo tables below.

use crate::model::request::{PhonemePosition, TargetSpec};
use crate::phoneme::{tokenize, PhonemeMatch, PhonemeMatcher};

const SYLLABLE_BASE: u32 = 0xAC00;
const SYLLABLE_LAST: u32 = 0xD7A3;
const NUCLEUS_COUNT: u32 = 21;
const CODA_COUNT: u32 = 28;

const ONSETS: [&str; 19] = [
    "ㄱ", "ㄲ", "ㄴ", "ㄷ", "ㄸ", "ㄹ", "ㅁ", "ㅂ", "ㅃ", "ㅅ", "ㅆ", "ㅇ", "ㅈ", "ㅉ", "ㅊ", "ㅋ",
    "ㅌ", "ㅍ", "ㅎ",
];

const NUCLEI: [&str; 21] = [
    "ㅏ", "ㅐ", "ㅑ", "ㅒ", "ㅓ", "ㅔ", "ㅕ", "ㅖ", "ㅗ", "ㅘ", "ㅙ", "ㅚ", "ㅛ", "ㅜ", "ㅝ", "ㅞ",
    "ㅟ", "ㅠ", "ㅡ", "ㅢ", "ㅣ",
];

/// Index 0 is the empty coda
const CODAS: [&str; 28] = [
    "", "ㄱ", "ㄲ", "ㄳ", "ㄴ", "ㄵ", "ㄶ", "ㄷ", "ㄹ", "ㄺ", "ㄻ", "ㄼ", "ㄽ", "ㄾ", "ㄿ", "ㅀ",
    "ㅁ", "ㅂ", "ㅄ", "ㅅ", "ㅆ", "ㅇ", "ㅈ", "ㅊ", "ㅋ", "ㅌ", "ㅍ", "ㅎ",
];

/// Silent in onset position, a velar nasal in coda position
pub const ZERO_CONSONANT: &str = "ㅇ";

/// Onset, nucleus and coda of one syllable block; `coda` is `""` when absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syllable {
    pub onset: &'static str,
    pub nucleus: &'static str,
    pub coda: &'static str,
}

impl Syllable {
    pub fn has_coda(&self) -> bool {
        !self.coda.is_empty()
    }
}

/// Split a precomposed syllable into its jamo. Anything else yields `None`.
pub fn decompose(ch: char) -> Option<Syllable> {
    let code = ch as u32;
    if !(SYLLABLE_BASE..=SYLLABLE_LAST).contains(&code) {
        return None;
    }
    let offset = code - SYLLABLE_BASE;
    let onset = offset / (NUCLEUS_COUNT * CODA_COUNT);
    let nucleus = (offset % (NUCLEUS_COUNT * CODA_COUNT)) / CODA_COUNT;
    let coda = offset % CODA_COUNT;

    Some(Syllable {
        onset: ONSETS[onset as usize],
        nucleus: NUCLEI[nucleus as usize],
        coda: CODAS[coda as usize],
    })
}

/// Whether any syllable of `word` carries `phoneme` at `position`
pub fn matches_position(word: &str, phoneme: &str, position: PhonemePosition) -> bool {
    word.chars()
        .filter_map(decompose)
        .any(|syllable| syllable_matches(&syllable, phoneme, position))
}

fn syllable_matches(syllable: &Syllable, phoneme: &str, position: PhonemePosition) -> bool {
    let coda_hit = syllable.has_coda() && syllable.coda == phoneme;
    if phoneme == ZERO_CONSONANT {
        // ㅇ only ever counts as a coda
        return match position {
            PhonemePosition::Coda | PhonemePosition::Any => coda_hit,
            PhonemePosition::Onset | PhonemePosition::Nucleus => false,
        };
    }
    match position {
        PhonemePosition::Onset => syllable.onset == phoneme,
        PhonemePosition::Nucleus => syllable.nucleus == phoneme,
        PhonemePosition::Coda => coda_hit,
        PhonemePosition::Any => {
            syllable.onset == phoneme || syllable.nucleus == phoneme || coda_hit
        }
    }
}

/// Scan whitespace tokens, keeping whole tokens with a qualifying syllable
pub fn find_matches(
    sentence: &str,
    phoneme: &str,
    position: PhonemePosition,
    min_occurrences: usize,
) -> PhonemeMatch {
    let phoneme = phoneme.trim();
    let matches = tokenize(sentence)
        .into_iter()
        .filter(|span| matches_position(&span.text, phoneme, position))
        .map(|span| (span.text.clone(), span))
        .collect();
    PhonemeMatch::new(matches, min_occurrences)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KoreanPhonemeEngine;

impl KoreanPhonemeEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PhonemeMatcher for KoreanPhonemeEngine {
    fn find_matches(&self, sentence: &str, target: &TargetSpec) -> PhonemeMatch {
        find_matches(sentence, &target.phoneme, target.position, target.min_occurrences)
    }

    fn name(&self) -> &'static str {
        "korean-syllable"
    }
}
