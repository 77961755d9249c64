//! Core-vocabulary word lists
//!
//! High-utility words (more, want, no, ...) that core-vocabulary drills are
//! built around. A request may bring its own list; otherwise the built-in
//! list for its language applies.

use crate::model::request::Language;
use crate::phoneme::english::clean_word;
use fxhash::FxHashSet;

const KOREAN_CORE_WORDS: &[&str] =
    &["더", "또", "아니", "네", "싫어", "줘", "이거", "저거", "뭐", "어디"];

const ENGLISH_CORE_WORDS: &[&str] =
    &["more", "want", "no", "yes", "help", "go", "stop", "my", "that", "what"];

pub fn default_core_words(language: Language) -> &'static [&'static str] {
    match language {
        Language::Ko => KOREAN_CORE_WORDS,
        Language::En => ENGLISH_CORE_WORDS,
    }
}

/// Trim, drop blanks and duplicates, keep first-seen order
pub fn normalize_core_words<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    words
        .iter()
        .map(|w| w.as_ref().trim())
        .filter(|w| !w.is_empty() && seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}

/// The caller's words when any survive normalization, else the defaults
pub fn resolve_core_words(language: Language, words: Option<&[String]>) -> Vec<String> {
    let cleaned = words.map(normalize_core_words).unwrap_or_default();
    if !cleaned.is_empty() {
        return cleaned;
    }
    default_core_words(language).iter().map(|w| w.to_string()).collect()
}

/// First core word the sentence uses.
///
/// Korean tokens carry particles and endings (`이거를`, `줘요`), so a token
/// counts when it starts with the core word. English tokens are compared
/// cleaned and lowercased.
pub fn find_core_word<'a>(
    sentence: &str,
    core_words: &'a [String],
    language: Language,
) -> Option<&'a str> {
    let tokens: Vec<&str> = sentence.split_whitespace().collect();
    core_words
        .iter()
        .find(|core| match language {
            Language::Ko => tokens.iter().any(|token| token.starts_with(core.as_str())),
            Language::En => {
                let core = core.to_lowercase();
                tokens.iter().any(|token| clean_word(token) == core)
            }
        })
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keeps_order() {
        let words = vec![" 더 ", "", "줘", "더", "  ", "이거"];
        assert_eq!(normalize_core_words(&words), vec!["더", "줘", "이거"]);
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let blank = vec!["  ".to_string()];
        let resolved = resolve_core_words(Language::En, Some(&blank));
        assert_eq!(resolved.len(), 10);
        assert_eq!(resolved[0], "more");

        assert_eq!(resolve_core_words(Language::Ko, None)[0], "더");

        let custom = vec!["우유".to_string()];
        assert_eq!(resolve_core_words(Language::Ko, Some(&custom)), vec!["우유"]);
    }

    #[test]
    fn test_find_core_word_korean_prefix() {
        let words = resolve_core_words(Language::Ko, None);
        assert_eq!(find_core_word("우유 줘요", &words, Language::Ko), Some("줘"));
        assert_eq!(find_core_word("이거를 봐", &words, Language::Ko), Some("이거"));
        assert_eq!(find_core_word("우유 주세요", &words, Language::Ko), None);
    }

    #[test]
    fn test_find_core_word_english_whole_word() {
        let words = resolve_core_words(Language::En, None);
        assert_eq!(find_core_word("I want juice.", &words, Language::En), Some("want"));
        assert_eq!(find_core_word("More, please!", &words, Language::En), Some("more"));
        assert_eq!(find_core_word("Mommy goes now", &words, Language::En), None);
    }
}
