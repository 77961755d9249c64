//! `CandidateGenerator` backed by a hosted language model

use crate::error::EngineResult;
use crate::llm::client::LlmClient;
use crate::llm::parser::parse_batch;
use crate::llm::prompt::{PromptBuilder, SYSTEM_PROMPT};
use crate::model::request::GenerationRequest;
use crate::pipeline::generator::{CandidateGenerator, GeneratedBatch};
use async_trait::async_trait;
use std::time::Instant;
use tracing::info;

pub struct LlmSentenceGenerator {
    client: LlmClient,
    prompts: PromptBuilder,
}

impl LlmSentenceGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            prompts: PromptBuilder::new(),
        }
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }
}

#[async_trait]
impl CandidateGenerator for LlmSentenceGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
        batch_size: usize,
    ) -> EngineResult<Vec<String>> {
        Ok(self.generate_batch(request, batch_size).await?.sentences)
    }

    async fn generate_batch(
        &self,
        request: &GenerationRequest,
        batch_size: usize,
    ) -> EngineResult<GeneratedBatch> {
        let prompt = self.prompts.build(request, batch_size);
        let start = Instant::now();
        let raw = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
        let batch = parse_batch(&raw);

        info!(
            model = self.client.model(),
            batch_size,
            response_len = raw.len(),
            candidates = batch.sentences.len(),
            contrast_sets = batch.contrast_sets.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "LLM batch generated"
        );
        Ok(batch)
    }

    async fn health_check(&self) -> bool {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        self.client.model()
    }
}
