//! Child-safety guard: drops sentences containing a disallowed term

use crate::error::{EngineError, EngineResult};
use serde::Deserialize;
use std::path::Path;

const EMBEDDED_TERMS: &str = include_str!("../../data/forbidden_words.json");

#[derive(Deserialize)]
struct TermFile {
    forbidden: Vec<String>,
}

/// Immutable once built; shared by every run
#[derive(Debug, Clone, Default)]
pub struct SafetyGuard {
    terms: Vec<String>,
}

impl SafetyGuard {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        terms.sort();
        terms.dedup();
        Self { terms }
    }

    /// `{"forbidden": [...]}`
    pub fn from_json(text: &str) -> EngineResult<Self> {
        let file: TermFile = serde_json::from_str(text)
            .map_err(|e| EngineError::internal(format!("Invalid disallowed-term list: {}", e)))?;
        Ok(Self::new(file.forbidden))
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::internal(format!(
                "Failed to read disallowed-term list {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&text)
    }

    pub fn embedded() -> EngineResult<Self> {
        Self::from_json(EMBEDDED_TERMS)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Case-insensitive substring check
    pub fn is_safe(&self, sentence: &str) -> bool {
        let lowered = sentence.to_lowercase();
        !self.terms.iter().any(|term| lowered.contains(term.as_str()))
    }

    pub fn filter_unsafe(&self, candidates: Vec<String>) -> Vec<String> {
        candidates.into_iter().filter(|s| self.is_safe(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_unsafe() {
        let guard = SafetyGuard::embedded().unwrap();
        let kept = guard.filter_unsafe(vec![
            "라면이 맛있어요".to_string(),
            "술을 마시고 싶어".to_string(),
            "The red car is fast".to_string(),
        ]);
        assert_eq!(kept, vec!["라면이 맛있어요", "The red car is fast"]);
    }

    #[test]
    fn test_case_insensitive_substring() {
        let guard = SafetyGuard::new(["Beer"]);
        assert!(!guard.is_safe("Dad drinks BEER now"));
        assert!(!guard.is_safe("rootbeers"));
        assert!(guard.is_safe("Dad drinks milk"));
    }

    #[test]
    fn test_empty_guard_keeps_everything() {
        let guard = SafetyGuard::new(Vec::<String>::new());
        assert_eq!(guard.filter_unsafe(vec!["anything".into()]).len(), 1);
    }
}
