//! The selection funnel: generate, guard, validate, score, diversify

pub mod contrast;
pub mod diversify;
pub mod generator;
pub mod metrics;
pub mod orchestrator;
pub mod score;
pub mod validate;

pub use contrast::{ContrastRejection, ContrastValidator};
pub use diversify::{diversify, pattern_key};
pub use generator::{CandidateGenerator, GeneratedBatch};
pub use metrics::PipelineMetrics;
pub use orchestrator::StimulusPipeline;
pub use score::{ScoreBreakdown, ScoredCandidate, SentenceScorer};
pub use validate::{FailReason, SentenceValidator, ValidationOutcome};
