//! Candidate source seam

use crate::error::EngineResult;
use crate::model::item::ContrastSet;
use crate::model::request::GenerationRequest;
use async_trait::async_trait;

/// One generator call's output. Contrast sets are only produced for the
/// contrast approaches; their sentences also appear in `sentences`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedBatch {
    pub sentences: Vec<String>,
    pub contrast_sets: Vec<ContrastSet>,
}

impl From<Vec<String>> for GeneratedBatch {
    fn from(sentences: Vec<String>) -> Self {
        Self {
            sentences,
            contrast_sets: Vec::new(),
        }
    }
}

/// Produces raw candidate sentences for a request.
///
/// Best effort: returning fewer (or more) than `batch_size` sentences is
/// fine. Malformed model output should be salvaged, not reported as an
/// error. Errors mean the call itself failed.
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
        batch_size: usize,
    ) -> EngineResult<Vec<String>>;

    /// Sentences plus any contrast sets. Plain sentence sources need not override this.
    async fn generate_batch(
        &self,
        request: &GenerationRequest,
        batch_size: usize,
    ) -> EngineResult<GeneratedBatch> {
        Ok(self.generate(request, batch_size).await?.into())
    }

    /// Whether the backing service is reachable
    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}
