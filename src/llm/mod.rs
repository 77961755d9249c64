//! LLM Module - hosted-model candidate generation

pub mod client;
pub mod generator;
pub mod parser;
pub mod prompt;

pub use client::LlmClient;
pub use generator::LlmSentenceGenerator;
pub use parser::{extract_json, normalize_sentence, parse_batch, parse_candidates};
pub use prompt::PromptBuilder;
