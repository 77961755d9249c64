//! # Stimulus Engine
//!
//! Selects short drill sentences for child speech therapy. Candidates come
//! from a hosted language model and pass through a funnel:
//! generate → guard → validate → score → diversify.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stimulus_engine::config::EngineConfig;
//! use stimulus_engine::llm::{LlmClient, LlmSentenceGenerator};
//! use stimulus_engine::model::GenerationRequest;
//! use stimulus_engine::pipeline::StimulusPipeline;
//! use stimulus_engine::reference::ReferenceData;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::default();
//! let generator = LlmSentenceGenerator::new(LlmClient::from_config(&config.llm)?);
//! let pipeline = StimulusPipeline::new(
//!     Arc::new(generator),
//!     Arc::new(ReferenceData::embedded()?),
//!     config.pipeline,
//! );
//!
//! let request: GenerationRequest = serde_json::from_str(r#"{
//!     "language": "ko", "age": 5, "count": 5,
//!     "target": {"phoneme": "ㄹ", "position": "onset"},
//!     "sentenceLength": 3, "diagnosis": "SSD", "therapyApproach": "minimal_pairs"
//! }"#)?;
//!
//! let result = pipeline.run(&request).await?;
//! println!("{} of {} sentences", result.generated_count, result.requested_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Korean**: syllable-block decomposition with positional matching
//! - **English**: pronouncing-dictionary lookup with a letter-to-sound fallback
//! - **Phonological rules**: Korean drills can avoid or train rule environments
//! - **Core vocabulary**: every sentence carries a high-utility word
//! - **Contrast sets**: validated word pairs for minimal-pair drills
//! - **Graceful shortfall**: fewer sentences than requested is a result, not an error

pub mod config;
pub mod error;
pub mod llm;
pub mod model;
pub mod phoneme;
pub mod pipeline;
pub mod reference;
pub mod web;

// Public API - Main types users need
pub use error::{EngineError, EngineResult, ErrorCode};
pub use model::{GenerationRequest, PipelineResult, TherapyItem};
pub use pipeline::{CandidateGenerator, StimulusPipeline};
pub use reference::ReferenceData;
