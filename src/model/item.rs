//! Output units of a pipeline run

use crate::model::request::{
    CommunicativeFunction, DiagnosisType, PhonemePosition, TargetSpec, TherapyApproach,
};
use crate::pipeline::metrics::PipelineMetrics;
use serde::{Deserialize, Serialize};

/// A matched word located inside the item text (character offsets, end exclusive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedWord {
    pub word: String,
    pub start_index: usize,
    pub end_index: usize,
    pub positions: Vec<PhonemePosition>,
}

/// Final drill sentence handed to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapyItem {
    pub id: String,
    pub text: String,
    pub target: Option<TargetSpec>,
    pub matched_words: Vec<MatchedWord>,
    pub word_count: usize,
    pub score: f64,
    pub diagnosis: DiagnosisType,
    pub approach: TherapyApproach,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<CommunicativeFunction>,
}

/// A sentence split into the tokens it was generated as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizedSentence {
    pub text: String,
    pub tokens: Vec<String>,
}

impl TokenizedSentence {
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self {
            text: tokens.join(" "),
            tokens,
        }
    }
}

/// Target sentence paired with a sentence built around a contrasting word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContrastSet {
    pub target_word: String,
    pub contrast_word: String,
    pub target_sentence: TokenizedSentence,
    pub contrast_sentence: TokenizedSentence,
}

/// Outcome of one run. `generated_count == items.len() <= requested_count`.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub items: Vec<TherapyItem>,
    pub requested_count: usize,
    pub generated_count: usize,
    pub average_score: f64,
    pub processing_time_ms: u64,
    /// Set when fewer items than requested survived the funnel
    pub advisory: Option<String>,
    /// Validated sets for contrast approaches, at most `requested_count`
    pub contrast_sets: Vec<ContrastSet>,
    pub metrics: PipelineMetrics,
}

impl PipelineResult {
    pub fn is_short(&self) -> bool {
        self.generated_count < self.requested_count
    }

    pub fn meta(&self) -> GenerateMeta {
        GenerateMeta {
            requested_count: self.requested_count,
            generated_count: self.generated_count,
            average_score: self.average_score,
            processing_time_ms: self.processing_time_ms,
            validation_rate: round2(self.metrics.validation_rate),
            unique_structures: self.metrics.unique_structures,
            vocabulary_diversity: round2(self.metrics.vocabulary_diversity),
            advisory: self.advisory.clone(),
        }
    }
}

/// `meta` block of the success envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMeta {
    pub requested_count: usize,
    pub generated_count: usize,
    pub average_score: f64,
    pub processing_time_ms: u64,
    pub validation_rate: f64,
    pub unique_structures: usize,
    pub vocabulary_diversity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
