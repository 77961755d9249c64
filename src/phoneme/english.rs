//! English phone lookup: pronouncing dictionary first, letter-to-sound rules second

use crate::error::{EngineError, EngineResult};
use crate::model::request::TargetSpec;
use crate::phoneme::{normalize_phone, tokenize, PhonemeMatch, PhonemeMatcher};
use fxhash::FxHashMap;
use std::path::Path;
use std::sync::Arc;

const EMBEDDED_DICTIONARY: &str = include_str!("../../data/cmudict_sample.dict");

/// Longest phone symbol kept after normalization (`"HH"`, `"AH"`, ...)
const MAX_PHONE_LEN: usize = 3;

/// A word -> phone-sequence provider
pub trait PhoneSource: Send + Sync {
    /// Normalized phones of a lowercase alphabetic word, or `None` when unknown
    fn phones(&self, word: &str) -> Option<Vec<String>>;

    /// Human-readable name of this source.
    fn name(&self) -> &'static str;
}

/// Reduce a token to its lowercase letters (`"Red,"` -> `"red"`)
pub fn clean_word(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

fn normalize_phones<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    raw.map(normalize_phone)
        .filter(|p| {
            !p.is_empty() && p.len() <= MAX_PHONE_LEN && p.chars().all(|c| c.is_ascii_alphabetic())
        })
        .collect()
}

/// CMU Pronouncing Dictionary in its plain-text format
#[derive(Debug, Default, Clone)]
pub struct CmuDictionary {
    entries: FxHashMap<String, Vec<String>>,
}

impl CmuDictionary {
    /// Parse `WORD  P1 P2 ...` lines. `;;;` lines are comments, `WORD(2)`
    /// alternates never replace the first pronunciation seen.
    pub fn parse(text: &str) -> Self {
        let mut entries = FxHashMap::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(head) = parts.next() else { continue };
            let word = match head.find('(') {
                Some(idx) => &head[..idx],
                None => head,
            };
            let key = clean_word(word);
            if key.is_empty() || entries.contains_key(&key) {
                continue;
            }
            let phones = normalize_phones(parts);
            if !phones.is_empty() {
                entries.insert(key, phones);
            }
        }
        Self { entries }
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::internal(format!(
                "Failed to read pronunciation dictionary {}: {}",
                path.display(),
                e
            ))
        })?;
        let dictionary = Self::parse(&text);
        if dictionary.is_empty() {
            return Err(EngineError::internal(format!(
                "Pronunciation dictionary {} has no entries",
                path.display()
            )));
        }
        Ok(dictionary)
    }

    /// The child-vocabulary subset compiled into the binary
    pub fn embedded() -> Self {
        Self::parse(EMBEDDED_DICTIONARY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }
}

impl PhoneSource for CmuDictionary {
    fn phones(&self, word: &str) -> Option<Vec<String>> {
        self.entries.get(word).cloned()
    }

    fn name(&self) -> &'static str {
        "cmudict"
    }
}

/// Rule-based grapheme-to-phoneme guess for out-of-vocabulary words.
///
/// Approximate by construction: digraphs, vowel teams, r-colored vowels,
/// soft c/g, silent final e and doubled consonants. Any word with at least
/// one ASCII letter yields a non-empty sequence.
#[derive(Debug, Default, Clone, Copy)]
pub struct LetterToSoundPredictor;

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn is_consonant(c: char) -> bool {
    c.is_ascii_lowercase() && !is_vowel(c) && c != 'y'
}

fn long_vowel(c: char) -> &'static str {
    match c {
        'a' => "EY",
        'e' => "IY",
        'i' => "AY",
        'o' => "OW",
        _ => "UW",
    }
}

fn short_vowel(c: char) -> &'static str {
    match c {
        'a' => "AE",
        'e' => "EH",
        'i' => "IH",
        'o' => "AA",
        _ => "AH",
    }
}

fn consonant(c: char) -> &'static [&'static str] {
    match c {
        'b' => &["B"],
        'd' => &["D"],
        'f' => &["F"],
        'h' => &["HH"],
        'j' => &["JH"],
        'k' | 'q' => &["K"],
        'l' => &["L"],
        'm' => &["M"],
        'n' => &["N"],
        'p' => &["P"],
        'r' => &["R"],
        's' => &["S"],
        't' => &["T"],
        'v' => &["V"],
        'w' => &["W"],
        'x' => &["K", "S"],
        'z' => &["Z"],
        _ => &[],
    }
}

impl LetterToSoundPredictor {
    pub fn new() -> Self {
        Self
    }

    pub fn predict(&self, word: &str) -> Vec<String> {
        let letters: Vec<char> = word
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let n = letters.len();
        let at = |i: usize| letters.get(i).copied();
        let rest = |i: usize, pat: &str| {
            pat.chars().enumerate().all(|(k, p)| at(i + k) == Some(p))
        };

        let mut phones: Vec<&'static str> = Vec::with_capacity(n + 2);
        let mut i = 0;
        while i < n {
            let c = letters[i];

            if i == 0 && (rest(0, "kn") || rest(0, "wr")) {
                phones.push(if c == 'k' { "N" } else { "R" });
                i += 2;
                continue;
            }
            if rest(i, "tch") {
                phones.push("CH");
                i += 3;
                continue;
            }
            if rest(i, "igh") {
                phones.push("AY");
                i += 3;
                continue;
            }
            let digraph: Option<&[&'static str]> = match (c, at(i + 1)) {
                ('c', Some('h')) => Some(&["CH"]),
                ('s', Some('h')) => Some(&["SH"]),
                ('t', Some('h')) => Some(&["TH"]),
                ('p', Some('h')) => Some(&["F"]),
                ('w', Some('h')) => Some(&["W"]),
                ('c', Some('k')) => Some(&["K"]),
                ('n', Some('g')) => Some(&["NG"]),
                ('q', Some('u')) => Some(&["K", "W"]),
                ('e', Some('e')) | ('e', Some('a')) => Some(&["IY"]),
                ('o', Some('o')) => Some(&["UW"]),
                ('a', Some('i')) | ('a', Some('y')) => Some(&["EY"]),
                ('o', Some('a')) | ('o', Some('w')) => Some(&["OW"]),
                ('o', Some('u')) => Some(&["AW"]),
                ('o', Some('i')) | ('o', Some('y')) => Some(&["OY"]),
                _ => None,
            };
            if let Some(found) = digraph {
                phones.extend_from_slice(found);
                i += 2;
                continue;
            }

            if is_vowel(c) && at(i + 1) == Some('r') && at(i + 2).map_or(true, is_consonant) {
                match c {
                    'a' => phones.extend_from_slice(&["AA", "R"]),
                    'o' => phones.extend_from_slice(&["AO", "R"]),
                    _ => phones.push("ER"),
                }
                i += 2;
                if at(i) == Some('r') {
                    i += 1;
                }
                continue;
            }

            if is_vowel(c) {
                if c == 'e' && i == n - 1 && n > 2 && !is_vowel(letters[i - 1]) {
                    // silent final e
                    i += 1;
                    continue;
                }
                let magic_e = i + 2 == n - 1
                    && at(i + 1).map_or(false, is_consonant)
                    && at(i + 2) == Some('e');
                if magic_e || (c == 'e' && n <= 2 && i == n - 1) {
                    phones.push(long_vowel(c));
                } else {
                    phones.push(short_vowel(c));
                }
                i += 1;
                continue;
            }

            if c == 'y' {
                phones.push(match i {
                    0 => "Y",
                    _ if i == n - 1 => "IY",
                    _ => "IH",
                });
                i += 1;
                continue;
            }

            let soft = at(i + 1).map_or(false, |next| matches!(next, 'e' | 'i' | 'y'));
            match c {
                'c' => phones.push(if soft { "S" } else { "K" }),
                'g' => phones.push(if soft { "JH" } else { "G" }),
                _ => phones.extend_from_slice(consonant(c)),
            }
            i += 1;
            if at(i) == Some(c) {
                i += 1;
            }
        }

        phones.into_iter().map(str::to_string).collect()
    }
}

impl PhoneSource for LetterToSoundPredictor {
    fn phones(&self, word: &str) -> Option<Vec<String>> {
        let phones = self.predict(word);
        (!phones.is_empty()).then_some(phones)
    }

    fn name(&self) -> &'static str {
        "letter-to-sound"
    }
}

/// Presence-based English matcher. Position is accepted but not consulted.
#[derive(Clone)]
pub struct EnglishPhonemeEngine {
    dictionary: Arc<dyn PhoneSource>,
    fallback: Arc<dyn PhoneSource>,
}

impl EnglishPhonemeEngine {
    pub fn new(dictionary: Arc<dyn PhoneSource>, fallback: Arc<dyn PhoneSource>) -> Self {
        Self {
            dictionary,
            fallback,
        }
    }

    pub fn with_dictionary(dictionary: CmuDictionary) -> Self {
        Self::new(Arc::new(dictionary), Arc::new(LetterToSoundPredictor::new()))
    }

    pub fn embedded() -> Self {
        Self::with_dictionary(CmuDictionary::embedded())
    }

    /// Stress-free phones of a word; empty when the word has no letters
    pub fn phones_of(&self, word: &str) -> Vec<String> {
        let word = clean_word(word);
        if word.is_empty() {
            return Vec::new();
        }
        self.dictionary
            .phones(&word)
            .or_else(|| self.fallback.phones(&word))
            .unwrap_or_default()
    }

    pub fn contains_phoneme(&self, word: &str, target_phone: &str) -> bool {
        let target = normalize_phone(target_phone);
        !target.is_empty() && self.phones_of(word).iter().any(|p| *p == target)
    }

    /// Matched words are reported cleaned (`"It's"` -> `"its"`); their spans
    /// cover the token as written, minus surrounding punctuation.
    pub fn find_phoneme_matches(
        &self,
        sentence: &str,
        target_phone: &str,
        min_occurrences: usize,
    ) -> PhonemeMatch {
        let matches = tokenize(sentence)
            .into_iter()
            .filter_map(|span| {
                let word = clean_word(&span.text);
                if word.is_empty() || !self.contains_phoneme(&word, target_phone) {
                    return None;
                }
                Some((word, span.trimmed(char::is_alphabetic)))
            })
            .collect();
        PhonemeMatch::new(matches, min_occurrences)
    }
}

impl std::fmt::Debug for EnglishPhonemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnglishPhonemeEngine")
            .field("dictionary", &self.dictionary.name())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl PhonemeMatcher for EnglishPhonemeEngine {
    fn find_matches(&self, sentence: &str, target: &TargetSpec) -> PhonemeMatch {
        self.find_phoneme_matches(sentence, &target.phoneme, target.min_occurrences)
    }

    fn name(&self) -> &'static str {
        "english-phones"
    }
}
