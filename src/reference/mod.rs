//! Process-wide read-only reference data
//!
//! Built once at startup and shared behind an `Arc` by every pipeline run.
//! Nothing here is mutated after construction.

pub mod core_vocab;
pub mod frequency;
pub mod patterns;
pub mod safety;

pub use core_vocab::{find_core_word, resolve_core_words};
pub use frequency::{FrequencyTable, NEUTRAL_FREQUENCY};
pub use patterns::FunctionPatternTable;
pub use safety::SafetyGuard;

use crate::config::DataConfig;
use crate::error::EngineResult;
use crate::model::request::Language;
use crate::phoneme::{CmuDictionary, EnglishPhonemeEngine, KoreanPhonemeEngine, PhonemeMatcher};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub guard: SafetyGuard,
    pub korean_frequency: FrequencyTable,
    pub english_frequency: FrequencyTable,
    pub korean_functions: FunctionPatternTable,
    pub korean: KoreanPhonemeEngine,
    pub english: EnglishPhonemeEngine,
}

impl ReferenceData {
    /// Everything from the data files compiled into the crate
    pub fn embedded() -> EngineResult<Self> {
        Self::load(&DataConfig::default())
    }

    /// Configured paths override the embedded files one by one
    pub fn load(config: &DataConfig) -> EngineResult<Self> {
        let guard = match &config.forbidden_words_path {
            Some(path) => SafetyGuard::load(path)?,
            None => SafetyGuard::embedded()?,
        };
        let korean_frequency = match &config.frequency_path {
            Some(path) => FrequencyTable::load(path)?,
            None => FrequencyTable::embedded_korean()?,
        };
        let dictionary = match &config.pronunciation_dict_path {
            Some(path) => CmuDictionary::load(path)?,
            None => CmuDictionary::embedded(),
        };

        info!(
            forbidden_terms = guard.len(),
            frequency_entries = korean_frequency.len(),
            dictionary_entries = dictionary.len(),
            "Reference data loaded"
        );

        Ok(Self {
            guard,
            korean_frequency,
            english_frequency: FrequencyTable::empty(),
            korean_functions: FunctionPatternTable::korean()?,
            korean: KoreanPhonemeEngine::new(),
            english: EnglishPhonemeEngine::with_dictionary(dictionary),
        })
    }

    pub fn matcher(&self, language: Language) -> &dyn PhonemeMatcher {
        match language {
            Language::Ko => &self.korean,
            Language::En => &self.english,
        }
    }

    pub fn frequency(&self, language: Language) -> &FrequencyTable {
        match language {
            Language::Ko => &self.korean_frequency,
            Language::En => &self.english_frequency,
        }
    }

    /// Cue patterns exist for Korean only
    pub fn function_patterns(&self, language: Language) -> Option<&FunctionPatternTable> {
        match language {
            Language::Ko => Some(&self.korean_functions),
            Language::En => None,
        }
    }
}
