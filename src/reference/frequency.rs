//! Word-familiarity lookup (0-100, higher is more familiar)

use crate::error::{EngineError, EngineResult};
use fxhash::FxHashMap;
use std::collections::HashMap;
use std::path::Path;

/// Score for words missing from the table
pub const NEUTRAL_FREQUENCY: f64 = 50.0;

const EMBEDDED_KOREAN: &str = include_str!("../../data/korean_frequency.json");

#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    scores: FxHashMap<String, f64>,
}

impl FrequencyTable {
    /// A table that scores every word as neutral
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a flat JSON object `{"word": score, ...}`; scores are clamped to 0-100
    pub fn from_json(text: &str) -> EngineResult<Self> {
        let raw: HashMap<String, f64> = serde_json::from_str(text)
            .map_err(|e| EngineError::internal(format!("Invalid frequency table: {}", e)))?;
        let scores = raw
            .into_iter()
            .map(|(word, score)| (word, score.clamp(0.0, 100.0)))
            .collect();
        Ok(Self { scores })
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::internal(format!(
                "Failed to read frequency table {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&text)
    }

    pub fn embedded_korean() -> EngineResult<Self> {
        Self::from_json(EMBEDDED_KOREAN)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Longest known prefix of `word` wins, so `엄마가` scores as `엄마`
    pub fn word_score(&self, word: &str) -> f64 {
        if self.scores.is_empty() {
            return NEUTRAL_FREQUENCY;
        }
        let mut ends: Vec<usize> = word.char_indices().map(|(i, _)| i).skip(1).collect();
        ends.push(word.len());
        ends.iter()
            .rev()
            .find_map(|&end| self.scores.get(&word[..end]).copied())
            .unwrap_or(NEUTRAL_FREQUENCY)
    }

    /// Mean word score over whitespace tokens
    pub fn sentence_score(&self, sentence: &str) -> f64 {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if words.is_empty() {
            return NEUTRAL_FREQUENCY;
        }
        words.iter().map(|w| self.word_score(w)).sum::<f64>() / words.len() as f64
    }
}
