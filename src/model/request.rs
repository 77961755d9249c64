//! Generation request: the immutable input of one pipeline run

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_AGE: u8 = 3;
pub const MAX_AGE: u8 = 7;
pub const MAX_COUNT: usize = 20;
pub const MIN_SENTENCE_LENGTH: usize = 2;
pub const MAX_SENTENCE_LENGTH: usize = 6;
pub const MAX_PHONEME_CHARS: usize = 3;
pub const MAX_MIN_OCCURRENCES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosisType {
    /// Speech sound disorder
    #[serde(rename = "SSD")]
    Ssd,
    /// Autism spectrum disorder
    #[serde(rename = "ASD")]
    Asd,
    /// Language delay
    #[serde(rename = "LD")]
    Ld,
}

impl DiagnosisType {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosisType::Ssd => "SSD",
            DiagnosisType::Asd => "ASD",
            DiagnosisType::Ld => "LD",
        }
    }

    /// Approaches a clinician may pick for this diagnosis
    pub fn allowed_approaches(&self) -> &'static [TherapyApproach] {
        match self {
            DiagnosisType::Ssd => &[
                TherapyApproach::MinimalPairs,
                TherapyApproach::MaximalOppositions,
                TherapyApproach::Complexity,
            ],
            DiagnosisType::Asd | DiagnosisType::Ld => &[TherapyApproach::CoreVocabulary],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TherapyApproach {
    MinimalPairs,
    MaximalOppositions,
    Complexity,
    CoreVocabulary,
}

impl TherapyApproach {
    pub fn code(&self) -> &'static str {
        match self {
            TherapyApproach::MinimalPairs => "minimal_pairs",
            TherapyApproach::MaximalOppositions => "maximal_oppositions",
            TherapyApproach::Complexity => "complexity",
            TherapyApproach::CoreVocabulary => "core_vocabulary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicativeFunction {
    Request,
    Reject,
    Help,
    Choice,
    Attention,
    Question,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhonemePosition {
    Onset,
    Nucleus,
    Coda,
    Any,
}

/// How Korean phonological-rule environments are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhonologicalRulesMode {
    /// Reject sentences with any environment
    Avoid,
    /// No check
    Allow,
    /// Require at least one environment
    Train,
}

fn default_min_occurrences() -> usize {
    1
}

/// Target phoneme: (symbol, position, minimum qualifying words)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    pub phoneme: String,
    pub position: PhonemePosition,
    #[serde(default = "default_min_occurrences")]
    pub min_occurrences: usize,
}

impl TargetSpec {
    pub fn new(
        phoneme: impl Into<String>,
        position: PhonemePosition,
        min_occurrences: usize,
    ) -> Self {
        Self {
            phoneme: phoneme.into(),
            position,
            min_occurrences,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub language: Language,
    pub age: u8,
    pub count: usize,
    #[serde(default)]
    pub target: Option<TargetSpec>,
    pub sentence_length: usize,
    pub diagnosis: DiagnosisType,
    pub therapy_approach: TherapyApproach,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub communicative_function: Option<CommunicativeFunction>,
    /// Core-vocabulary words; the built-in list applies when absent or blank
    #[serde(default, alias = "core_words")]
    pub core_words: Option<Vec<String>>,
    #[serde(default, alias = "phonological_rules_mode")]
    pub phonological_rules_mode: Option<PhonologicalRulesMode>,
}

impl GenerationRequest {
    /// Shape/range checks run before any pipeline work
    pub fn validate(&self) -> EngineResult<()> {
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(EngineError::invalid_field(
                "age",
                format!("age must be between {} and {}, got {}", MIN_AGE, MAX_AGE, self.age),
            ));
        }
        if !(1..=MAX_COUNT).contains(&self.count) {
            return Err(EngineError::invalid_field(
                "count",
                format!("count must be between 1 and {}, got {}", MAX_COUNT, self.count),
            ));
        }
        if !(MIN_SENTENCE_LENGTH..=MAX_SENTENCE_LENGTH).contains(&self.sentence_length) {
            return Err(EngineError::invalid_field(
                "sentenceLength",
                format!(
                    "sentenceLength must be between {} and {}, got {}",
                    MIN_SENTENCE_LENGTH, MAX_SENTENCE_LENGTH, self.sentence_length
                ),
            ));
        }

        if let Some(target) = &self.target {
            let chars = target.phoneme.trim().chars().count();
            if chars == 0 || target.phoneme.chars().count() > MAX_PHONEME_CHARS {
                return Err(EngineError::invalid_field(
                    "target.phoneme",
                    format!("target.phoneme must be 1-{} characters", MAX_PHONEME_CHARS),
                ));
            }
            if !(1..=MAX_MIN_OCCURRENCES).contains(&target.min_occurrences) {
                return Err(EngineError::invalid_field(
                    "target.minOccurrences",
                    format!(
                        "target.minOccurrences must be between 1 and {}, got {}",
                        MAX_MIN_OCCURRENCES, target.min_occurrences
                    ),
                ));
            }
        } else if self.therapy_approach != TherapyApproach::CoreVocabulary {
            return Err(EngineError::invalid_field(
                "target",
                "target is required for non-core_vocabulary therapyApproach",
            ));
        }

        let allowed = self.diagnosis.allowed_approaches();
        if !allowed.contains(&self.therapy_approach) {
            let names: Vec<&str> = allowed.iter().map(|a| a.code()).collect();
            return Err(EngineError::invalid_field(
                "therapyApproach",
                format!(
                    "therapyApproach '{}' is not allowed for diagnosis '{}'. Allowed: {}",
                    self.therapy_approach.code(),
                    self.diagnosis.code(),
                    names.join(", ")
                ),
            ));
        }

        if let Some(theme) = &self.theme {
            if theme.trim().is_empty() {
                return Err(EngineError::invalid_field("theme", "theme must not be blank"));
            }
        }

        Ok(())
    }

    /// The phoneme constraint Validate actually enforces.
    ///
    /// Core-vocabulary drills target functional communication, so they carry no
    /// effective phoneme constraint even when the request echoes a target.
    pub fn phoneme_target(&self) -> Option<&TargetSpec> {
        if self.therapy_approach == TherapyApproach::CoreVocabulary {
            return None;
        }
        self.target.as_ref()
    }

    /// Rules mode that actually gates sentences: Korean only, and `allow` means none
    pub fn enforced_rules_mode(&self) -> Option<PhonologicalRulesMode> {
        if self.language != Language::Ko {
            return None;
        }
        match self.phonological_rules_mode {
            Some(PhonologicalRulesMode::Allow) | None => None,
            mode => mode,
        }
    }

    /// Contrast approaches ask the generator for paired sentence sets
    pub fn wants_contrast_sets(&self) -> bool {
        matches!(
            self.therapy_approach,
            TherapyApproach::MinimalPairs | TherapyApproach::MaximalOppositions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            language: Language::Ko,
            age: 5,
            count: 5,
            target: Some(TargetSpec::new("ㄹ", PhonemePosition::Onset, 1)),
            sentence_length: 4,
            diagnosis: DiagnosisType::Ssd,
            therapy_approach: TherapyApproach::MinimalPairs,
            theme: None,
            communicative_function: None,
            core_words: None,
            phonological_rules_mode: None,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "language": "ko",
            "age": 5,
            "count": 10,
            "target": {"phoneme": "ㄹ", "position": "onset"},
            "sentenceLength": 4,
            "diagnosis": "SSD",
            "therapyApproach": "minimal_pairs",
            "communicativeFunction": "request"
        }"#;
        let req: GenerationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.sentence_length, 4);
        assert_eq!(req.target.as_ref().unwrap().min_occurrences, 1);
        assert_eq!(req.communicative_function, Some(CommunicativeFunction::Request));
        assert_eq!(req.core_words, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_deserialize_optional_extras() {
        let json = r#"{
            "language": "ko",
            "age": 4,
            "count": 3,
            "sentenceLength": 2,
            "diagnosis": "ASD",
            "therapyApproach": "core_vocabulary",
            "coreWords": ["더", "줘"],
            "phonological_rules_mode": "avoid"
        }"#;
        let req: GenerationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.core_words, Some(vec!["더".to_string(), "줘".to_string()]));
        assert_eq!(req.phonological_rules_mode, Some(PhonologicalRulesMode::Avoid));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_enforced_rules_mode() {
        let mut req = request();
        assert_eq!(req.enforced_rules_mode(), None);

        req.phonological_rules_mode = Some(PhonologicalRulesMode::Allow);
        assert_eq!(req.enforced_rules_mode(), None);

        req.phonological_rules_mode = Some(PhonologicalRulesMode::Train);
        assert_eq!(req.enforced_rules_mode(), Some(PhonologicalRulesMode::Train));

        req.language = Language::En;
        assert_eq!(req.enforced_rules_mode(), None);
    }

    #[test]
    fn test_range_checks() {
        let mut req = request();
        req.count = 21;
        assert!(req.validate().is_err());

        let mut req = request();
        req.sentence_length = 7;
        assert!(req.validate().is_err());

        let mut req = request();
        req.age = 2;
        assert!(req.validate().is_err());

        let mut req = request();
        req.target = Some(TargetSpec::new("ㄹ", PhonemePosition::Onset, 4));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_phoneme_length_counts_chars() {
        // Three Hangul jamo are nine bytes but three characters
        let mut req = request();
        req.target = Some(TargetSpec::new("ㄱㄴㄷ", PhonemePosition::Any, 1));
        assert!(req.validate().is_ok());

        req.target = Some(TargetSpec::new("ㄱㄴㄷㄹ", PhonemePosition::Any, 1));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_target_required_unless_core_vocabulary() {
        let mut req = request();
        req.target = None;
        assert!(req.validate().is_err());

        req.diagnosis = DiagnosisType::Asd;
        req.therapy_approach = TherapyApproach::CoreVocabulary;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_approach_must_fit_diagnosis() {
        let mut req = request();
        req.diagnosis = DiagnosisType::Ld;
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_core_vocabulary_has_no_effective_target() {
        let mut req = request();
        req.diagnosis = DiagnosisType::Asd;
        req.therapy_approach = TherapyApproach::CoreVocabulary;
        assert!(req.target.is_some());
        assert!(req.phoneme_target().is_none());
    }
}
