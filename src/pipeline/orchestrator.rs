//! Collecting -> Scoring -> Diversifying -> Done
//!
//! One `StimulusPipeline` serves many concurrent runs. Each run owns its pool
//! and metrics; the reference data and generator are shared read-only.

use crate::config::PipelineConfig;
use crate::error::{EngineError, EngineResult};
use crate::model::item::{round2, ContrastSet, MatchedWord, PipelineResult, TherapyItem};
use crate::model::request::GenerationRequest;
use crate::pipeline::contrast::ContrastValidator;
use crate::pipeline::diversify::diversify;
use crate::pipeline::generator::CandidateGenerator;
use crate::pipeline::metrics::PipelineMetrics;
use crate::pipeline::score::{ScoredCandidate, SentenceScorer};
use crate::pipeline::validate::{SentenceValidator, ValidationOutcome};
use crate::reference::ReferenceData;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// What the collect loop accumulated across attempts
#[derive(Debug, Default)]
struct Collected {
    pool: Vec<ValidationOutcome>,
    contrast_sets: Vec<ContrastSet>,
}

pub struct StimulusPipeline {
    generator: Arc<dyn CandidateGenerator>,
    reference: Arc<ReferenceData>,
    config: PipelineConfig,
}

impl StimulusPipeline {
    pub fn new(
        generator: Arc<dyn CandidateGenerator>,
        reference: Arc<ReferenceData>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            generator,
            reference,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn generator(&self) -> &Arc<dyn CandidateGenerator> {
        &self.generator
    }

    /// Run under the configured wall-clock budget
    pub async fn run(&self, request: &GenerationRequest) -> EngineResult<PipelineResult> {
        self.run_with_cancel(request, CancellationToken::new()).await
    }

    /// Run until done, the budget elapses, or `cancel` fires. The latter two
    /// drop the in-flight generator call and yield `EngineError::Timeout`.
    pub async fn run_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: CancellationToken,
    ) -> EngineResult<PipelineResult> {
        request.validate()?;

        let start = Instant::now();
        let budget = self.config.run_timeout();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let elapsed = start.elapsed().as_millis() as u64;
                warn!(elapsed_ms = elapsed, "Run cancelled by caller");
                Err(EngineError::timeout("Run cancelled by caller", Some(elapsed)))
            }
            outcome = tokio::time::timeout(budget, self.execute(request, start)) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    let elapsed = start.elapsed().as_millis() as u64;
                    warn!(
                        elapsed_ms = elapsed,
                        budget_secs = budget.as_secs(),
                        "Run exceeded its time budget"
                    );
                    Err(EngineError::timeout(
                        format!("Run exceeded {}s budget", budget.as_secs()),
                        Some(elapsed),
                    ))
                }
            },
        }
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        start: Instant,
    ) -> EngineResult<PipelineResult> {
        info!(
            language = %request.language,
            count = request.count,
            sentence_length = request.sentence_length,
            approach = request.therapy_approach.code(),
            phoneme = request.phoneme_target().map(|t| t.phoneme.as_str()).unwrap_or("none"),
            "Pipeline started"
        );

        let mut metrics = PipelineMetrics::default();
        let collected = self.collect(request, &mut metrics).await?;

        let score_start = Instant::now();
        let scorer = SentenceScorer::for_request(&self.reference, request);
        let scored = scorer.score(collected.pool, request);
        debug!(
            scored = scored.len(),
            elapsed_ms = score_start.elapsed().as_millis() as u64,
            "Scored pool"
        );

        let selected = diversify(scored, request.count, self.config.max_similar);
        metrics.record_selection(&selected, request.language);
        metrics.log();

        let result = self.assemble(request, selected, collected.contrast_sets, metrics, start);
        info!(
            requested = result.requested_count,
            generated = result.generated_count,
            average_score = result.average_score,
            elapsed_ms = result.processing_time_ms,
            "Pipeline finished"
        );
        Ok(result)
    }

    /// Bounded generate -> guard -> validate loop. Contrast sets ride along
    /// with their sentences and are kept up to `request.count`.
    async fn collect(
        &self,
        request: &GenerationRequest,
        metrics: &mut PipelineMetrics,
    ) -> EngineResult<Collected> {
        let matcher = self.reference.matcher(request.language);
        let validator = SentenceValidator::new(matcher);
        let contrast_validator = ContrastValidator::new(matcher, &self.reference.guard);
        let mut collected = Collected::default();
        let pool = &mut collected.pool;

        for attempt in 1..=self.config.max_attempts {
            let missing = request.count.saturating_sub(pool.len());
            if missing == 0 {
                break;
            }
            let batch_size = missing * self.config.batch_multiplier;

            let gen_start = Instant::now();
            let batch = self
                .generator
                .generate_batch(request, batch_size)
                .await
                .map_err(|e| {
                    error!(attempt, error = %e, "Generator call failed");
                    generator_failure(e)
                })?;
            let generated = batch.sentences.len();

            if !batch.contrast_sets.is_empty() {
                let offered = batch.contrast_sets.len();
                let valid = contrast_validator.validate(batch.contrast_sets, request);
                metrics.contrast_sets_validated += valid.len();
                debug!(attempt, offered, valid = valid.len(), "Contrast sets checked");
                collected.contrast_sets.extend(valid);
                collected.contrast_sets.truncate(request.count);
            }

            let safe = self.reference.guard.filter_unsafe(batch.sentences);
            let safe_count = safe.len();
            let outcomes = validator.validate(safe, request);
            metrics.record_batch(generated, safe_count, &outcomes);

            let passed: Vec<ValidationOutcome> =
                outcomes.into_iter().filter(|o| o.passed).collect();
            let passed_count = passed.len();
            pool.extend(passed);

            if passed_count < safe_count {
                warn!(
                    attempt,
                    batch_size,
                    generated,
                    unsafe_dropped = generated - safe_count,
                    passed = passed_count,
                    pooled = pool.len(),
                    "Batch partially rejected"
                );
            } else {
                info!(
                    attempt,
                    batch_size,
                    generated,
                    passed = passed_count,
                    pooled = pool.len(),
                    elapsed_ms = gen_start.elapsed().as_millis() as u64,
                    "Batch collected"
                );
            }

            if pool.len() >= request.count {
                break;
            }
        }

        Ok(collected)
    }

    fn assemble(
        &self,
        request: &GenerationRequest,
        selected: Vec<ScoredCandidate>,
        contrast_sets: Vec<ContrastSet>,
        metrics: PipelineMetrics,
        start: Instant,
    ) -> PipelineResult {
        let average_score = if selected.is_empty() {
            0.0
        } else {
            round2(selected.iter().map(|c| c.score).sum::<f64>() / selected.len() as f64)
        };

        let items: Vec<TherapyItem> = selected
            .into_iter()
            .map(|candidate| to_therapy_item(candidate, request))
            .collect();
        let generated_count = items.len();

        let advisory = match generated_count {
            n if n >= request.count => None,
            0 => Some(
                "No sentences satisfied the constraints. Try a different target or sentence length."
                    .to_string(),
            ),
            n => Some(format!(
                "Only {} of {} requested sentences satisfied the constraints.",
                n, request.count
            )),
        };

        PipelineResult {
            items,
            requested_count: request.count,
            generated_count,
            average_score,
            processing_time_ms: start.elapsed().as_millis() as u64,
            advisory,
            contrast_sets,
            metrics,
        }
    }
}

/// Generator errors abort the run; unreachable stays SERVICE_UNAVAILABLE
fn generator_failure(err: EngineError) -> EngineError {
    match err {
        EngineError::ServiceUnavailable { .. }
        | EngineError::Timeout { .. }
        | EngineError::GenerationFailed { .. } => err,
        other => {
            EngineError::generation_failed(other.to_string()).with_context("candidate generator")
        }
    }
}

/// Matched words keep the sentence's own spelling and char offsets
fn to_therapy_item(candidate: ScoredCandidate, request: &GenerationRequest) -> TherapyItem {
    let matched_words = match request.phoneme_target() {
        Some(target) => candidate
            .matched_spans
            .into_iter()
            .map(|span| MatchedWord {
                word: span.text,
                start_index: span.start,
                end_index: span.end,
                positions: vec![target.position],
            })
            .collect(),
        None => Vec::new(),
    };

    TherapyItem {
        id: Uuid::new_v4().to_string(),
        text: candidate.sentence,
        target: request.target.clone(),
        matched_words,
        word_count: candidate.word_count,
        score: round2(candidate.score),
        diagnosis: request.diagnosis,
        approach: request.therapy_approach,
        theme: request.theme.clone(),
        function: request.communicative_function,
    }
}
