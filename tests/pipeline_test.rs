//! End-to-end runs of the selection pipeline against a scripted generator
//!
//! Run with: `cargo test --test pipeline_test`

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stimulus_engine::config::PipelineConfig;
use stimulus_engine::llm::parse_batch;
use stimulus_engine::model::{
    ApiResponse, CommunicativeFunction, DiagnosisType, GenerationRequest, Language,
    PhonemePosition, PhonologicalRulesMode, TargetSpec, TherapyApproach,
};
use stimulus_engine::pipeline::{CandidateGenerator, GeneratedBatch, StimulusPipeline};
use stimulus_engine::{EngineError, EngineResult, ErrorCode, ReferenceData};
use tokio_util::sync::CancellationToken;

/// Replays queued batches, then returns empty batches
#[derive(Default)]
struct ScriptedGenerator {
    batches: Mutex<VecDeque<EngineResult<Vec<String>>>>,
    batch_sizes: Mutex<Vec<usize>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    fn new(batches: Vec<Vec<&str>>) -> Self {
        Self {
            batches: Mutex::new(
                batches
                    .into_iter()
                    .map(|b| Ok(b.into_iter().map(str::to_string).collect()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    fn failing(err: EngineError) -> Self {
        Self {
            batches: Mutex::new(VecDeque::from(vec![Err(err)])),
            ..Self::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
        batch_size: usize,
    ) -> EngineResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(batch_size);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.batches.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Answers every call with the same raw model output, parsed the way the LLM generator does
struct ModelOutputGenerator {
    output: String,
}

#[async_trait]
impl CandidateGenerator for ModelOutputGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
        batch_size: usize,
    ) -> EngineResult<Vec<String>> {
        Ok(self.generate_batch(request, batch_size).await?.sentences)
    }

    async fn generate_batch(
        &self,
        _request: &GenerationRequest,
        _batch_size: usize,
    ) -> EngineResult<GeneratedBatch> {
        Ok(parse_batch(&self.output))
    }

    fn name(&self) -> &str {
        "model-output"
    }
}

fn korean_request(count: usize, sentence_length: usize) -> GenerationRequest {
    GenerationRequest {
        language: Language::Ko,
        age: 5,
        count,
        target: Some(TargetSpec::new("ㄹ", PhonemePosition::Onset, 1)),
        sentence_length,
        diagnosis: DiagnosisType::Ssd,
        therapy_approach: TherapyApproach::MinimalPairs,
        theme: None,
        communicative_function: None,
        core_words: None,
        phonological_rules_mode: None,
    }
}

fn pipeline_with(
    generator: Arc<dyn CandidateGenerator>,
    config: PipelineConfig,
) -> StimulusPipeline {
    StimulusPipeline::new(generator, Arc::new(ReferenceData::embedded().unwrap()), config)
}

#[tokio::test]
async fn test_no_valid_candidates_is_not_an_error() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        vec!["사과 먹자 엄마", "한 단어"],
        vec!["사과 먹자 엄마"],
        vec!["바나나 먹자 아빠"],
    ]));
    let pipeline = pipeline_with(generator.clone(), PipelineConfig::default());

    let result = pipeline.run(&korean_request(3, 3)).await.unwrap();

    assert_eq!(result.generated_count, 0);
    assert_eq!(result.requested_count, 3);
    assert_eq!(result.average_score, 0.0);
    assert!(result.items.is_empty());
    assert!(result.advisory.is_some());
    assert_eq!(generator.calls(), 3);
    assert_eq!(generator.batch_sizes(), vec![9, 9, 9]);

    let envelope = serde_json::to_value(ApiResponse::success(result)).unwrap();
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["data"]["meta"]["generatedCount"], 0);
}

#[tokio::test]
async fn test_stops_early_once_enough_collected() {
    let generator = Arc::new(ScriptedGenerator::new(vec![vec![
        "라면 정말 좋아",
        "로봇이 노래 해요",
        "리본 예뻐 엄마",
    ]]));
    let pipeline = pipeline_with(generator.clone(), PipelineConfig::default());

    let result = pipeline.run(&korean_request(2, 3)).await.unwrap();

    assert_eq!(generator.calls(), 1);
    assert_eq!(result.generated_count, 2);
    assert!(result.advisory.is_none());
    // Two matched words earn the larger bonus and rank first
    assert_eq!(result.items[0].text, "로봇이 노래 해요");
}

#[tokio::test]
async fn test_batch_size_tracks_shortfall() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        vec!["라면 정말 좋아", "사과 먹자 엄마"],
        vec!["로봇이 노래 해요"],
    ]));
    let pipeline = pipeline_with(generator.clone(), PipelineConfig::default());

    let result = pipeline.run(&korean_request(3, 3)).await.unwrap();

    // (3 - 0) * 3, (3 - 1) * 3, (3 - 2) * 3
    assert_eq!(generator.batch_sizes(), vec![9, 6, 3]);
    assert_eq!(result.generated_count, 2);
    assert_eq!(result.metrics.total_generated, 3);
    assert_eq!(result.metrics.fail_reasons.get("phoneme"), Some(&1));
    assert_eq!(
        result.advisory.as_deref(),
        Some("Only 2 of 3 requested sentences satisfied the constraints.")
    );
}

#[tokio::test]
async fn test_unsafe_candidates_never_reach_output() {
    let generator = Arc::new(ScriptedGenerator::new(vec![vec![
        "라면 먹고 술",
        "로봇이 노래 해요",
    ]]));
    let pipeline = pipeline_with(generator, PipelineConfig::default());

    let result = pipeline.run(&korean_request(2, 3)).await.unwrap();

    assert_eq!(result.metrics.unsafe_filtered, 1);
    assert!(result.items.iter().all(|item| !item.text.contains('술')));
}

#[tokio::test]
async fn test_items_carry_offsets_and_request_metadata() {
    let generator = Arc::new(ScriptedGenerator::new(vec![vec!["라면이랑 라볶이 먹자"]]));
    let pipeline = pipeline_with(generator, PipelineConfig::default());
    let mut request = korean_request(1, 3);
    request.theme = Some("food".to_string());
    request.communicative_function = Some(CommunicativeFunction::Request);

    let result = pipeline.run(&request).await.unwrap();
    let item = &result.items[0];

    assert_eq!(item.word_count, 3);
    assert_eq!(item.target, request.target);
    assert_eq!(item.theme.as_deref(), Some("food"));
    assert_eq!(item.function, Some(CommunicativeFunction::Request));
    assert_eq!(item.matched_words.len(), 2);
    assert_eq!(item.matched_words[0].word, "라면이랑");
    assert_eq!((item.matched_words[0].start_index, item.matched_words[0].end_index), (0, 4));
    assert_eq!((item.matched_words[1].start_index, item.matched_words[1].end_index), (5, 8));
    assert_eq!(item.matched_words[1].positions, vec![PhonemePosition::Onset]);
    assert!(item.score > 0.0 && item.score <= 100.0);
}

#[tokio::test]
async fn test_item_ids_unique() {
    let generator = Arc::new(ScriptedGenerator::new(vec![vec![
        "라면 정말 좋아",
        "로봇이 노래 해요",
        "리본 예뻐 엄마",
        "나라 가요 우리",
    ]]));
    let pipeline = pipeline_with(generator, PipelineConfig::default());

    let result = pipeline.run(&korean_request(4, 3)).await.unwrap();
    let ids: HashSet<&str> = result.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn test_similarity_cap_applies_across_run() {
    let generator = Arc::new(ScriptedGenerator::new(vec![vec![
        "라면 먹자 지금",
        "라면 먹어 우리",
        "라면 좋아 정말",
        "로봇 와요 여기",
        "리본 예뻐 정말",
    ]]));
    let pipeline = pipeline_with(generator, PipelineConfig::default());

    let result = pipeline.run(&korean_request(4, 3)).await.unwrap();
    assert_eq!(result.generated_count, 4);

    let ramen = result.items.iter().filter(|i| i.text.starts_with("라면")).count();
    assert_eq!(ramen, 2);
}

#[tokio::test]
async fn test_english_run() {
    let generator = Arc::new(ScriptedGenerator::new(vec![vec![
        "The red car is fast",
        "The sun is hot today",
        "Red rabbits run very far",
    ]]));
    let pipeline = pipeline_with(generator, PipelineConfig::default());
    let mut request = korean_request(2, 5);
    request.language = Language::En;
    request.target = Some(TargetSpec::new("R", PhonemePosition::Any, 2));

    let result = pipeline.run(&request).await.unwrap();
    assert_eq!(result.generated_count, 2);

    let texts: Vec<&str> = result.items.iter().map(|i| i.text.as_str()).collect();
    assert!(texts.contains(&"The red car is fast"));
    assert!(!texts.contains(&"The sun is hot today"));

    let car = result.items.iter().find(|i| i.text == "The red car is fast").unwrap();
    let words: Vec<&str> = car.matched_words.iter().map(|m| m.word.as_str()).collect();
    assert_eq!(words, vec!["red", "car"]);
}

#[tokio::test]
async fn test_english_matched_words_keep_surface_form() {
    let generator = Arc::new(ScriptedGenerator::new(vec![vec!["It's a big hat"]]));
    let pipeline = pipeline_with(generator, PipelineConfig::default());
    let mut request = korean_request(1, 4);
    request.language = Language::En;
    request.target = Some(TargetSpec::new("S", PhonemePosition::Any, 1));

    let result = pipeline.run(&request).await.unwrap();
    let matched = &result.items[0].matched_words;
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].word, "It's");
    assert_eq!((matched[0].start_index, matched[0].end_index), (0, 4));
}

#[tokio::test]
async fn test_core_vocabulary_ignores_target() {
    let generator = Arc::new(ScriptedGenerator::new(vec![vec!["우유 주세요", "우유 줘"]]));
    let pipeline = pipeline_with(generator, PipelineConfig::default());
    let mut request = korean_request(1, 2);
    request.diagnosis = DiagnosisType::Asd;
    request.therapy_approach = TherapyApproach::CoreVocabulary;
    request.communicative_function = Some(CommunicativeFunction::Request);

    let result = pipeline.run(&request).await.unwrap();
    assert_eq!(result.generated_count, 1);
    assert_eq!(result.items[0].text, "우유 줘");
    assert!(result.items[0].matched_words.is_empty());
    assert_eq!(result.metrics.fail_reasons.get("core_vocabulary"), Some(&1));
}

#[tokio::test]
async fn test_custom_core_words_replace_defaults() {
    let generator = Arc::new(ScriptedGenerator::new(vec![vec!["우유 주세요", "우유 줘"]]));
    let pipeline = pipeline_with(generator, PipelineConfig::default());
    let mut request = korean_request(2, 2);
    request.diagnosis = DiagnosisType::Asd;
    request.therapy_approach = TherapyApproach::CoreVocabulary;
    request.core_words = Some(vec!["주세요".to_string()]);

    let result = pipeline.run(&request).await.unwrap();
    let texts: Vec<&str> = result.items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["우유 주세요"]);
}

#[tokio::test]
async fn test_avoid_mode_drops_rule_environments() {
    let generator = Arc::new(ScriptedGenerator::new(vec![vec!["라면 국물 해요", "로봇 노래 해요"]]));
    let pipeline = pipeline_with(generator, PipelineConfig::default());
    let mut request = korean_request(1, 3);
    request.phonological_rules_mode = Some(PhonologicalRulesMode::Avoid);

    let result = pipeline.run(&request).await.unwrap();
    assert_eq!(result.items[0].text, "로봇 노래 해요");
    assert_eq!(result.metrics.fail_reasons.get("phonological_rule"), Some(&1));
}

#[tokio::test]
async fn test_contrast_sets_validated_and_capped() {
    let output = r#"{"sets": [
        {"target_word": "라면", "contrast_word": "나면",
         "target_sentence": {"tokens": ["라면", "같이", "먹자"]},
         "contrast_sentence": {"tokens": ["봄이", "나면", "좋아요"]}},
        {"target_word": "사과", "contrast_word": "나면",
         "target_sentence": {"tokens": ["사과", "같이", "먹자"]},
         "contrast_sentence": {"tokens": ["봄이", "나면", "좋아요"]}},
        {"targetWord": "로봇", "contrastWord": "노래",
         "targetSentence": {"tokens": ["로봇", "같이", "놀자"]},
         "contrastSentence": {"tokens": ["노래", "같이", "하자"]}},
        {"target_word": "리본", "contrast_word": "이분",
         "target_sentence": {"tokens": ["리본", "예뻐", "정말"]},
         "contrast_sentence": {"tokens": ["이분", "예뻐", "정말"]}}
    ]}"#;
    let generator = Arc::new(ModelOutputGenerator {
        output: output.to_string(),
    });
    let pipeline = pipeline_with(generator, PipelineConfig::default());

    let result = pipeline.run(&korean_request(2, 3)).await.unwrap();

    assert_eq!(result.generated_count, 2);
    assert_eq!(result.metrics.contrast_sets_validated, 3);
    let words: Vec<&str> = result.contrast_sets.iter().map(|s| s.target_word.as_str()).collect();
    assert_eq!(words, vec!["라면", "로봇"]);

    let envelope = serde_json::to_value(ApiResponse::success(result)).unwrap();
    let sets = &envelope["data"]["contrastSets"];
    assert_eq!(sets.as_array().map(Vec::len), Some(2));
    assert_eq!(sets[0]["targetSentence"]["text"], "라면 같이 먹자");
}

#[tokio::test]
async fn test_plain_runs_omit_contrast_sets() {
    let generator = Arc::new(ScriptedGenerator::new(vec![vec!["라면 정말 좋아"]]));
    let pipeline = pipeline_with(generator, PipelineConfig::default());

    let result = pipeline.run(&korean_request(1, 3)).await.unwrap();
    assert!(result.contrast_sets.is_empty());

    let envelope = serde_json::to_value(ApiResponse::success(result)).unwrap();
    assert!(envelope["data"].get("contrastSets").is_none());
}

#[tokio::test]
async fn test_invalid_request_skips_generation() {
    let generator = Arc::new(ScriptedGenerator::new(vec![]));
    let pipeline = pipeline_with(generator.clone(), PipelineConfig::default());

    let err = pipeline.run(&korean_request(0, 3)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_generator_failure_aborts_run() {
    let failure = EngineError::generation_failed("HTTP 500");
    let generator = Arc::new(ScriptedGenerator::failing(failure));
    let pipeline = pipeline_with(generator.clone(), PipelineConfig::default());

    let err = pipeline.run(&korean_request(2, 3)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::GenerationFailed);
    assert_eq!(generator.calls(), 1);

    let envelope = serde_json::to_value(ApiResponse::failure(&err)).unwrap();
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["error"]["code"], "GENERATION_FAILED");
}

#[tokio::test]
async fn test_unreachable_generator_is_service_unavailable() {
    let failure = EngineError::service_unavailable("refused");
    let generator = Arc::new(ScriptedGenerator::failing(failure));
    let pipeline = pipeline_with(generator, PipelineConfig::default());

    let err = pipeline.run(&korean_request(2, 3)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn test_run_budget_elapses() {
    let generator = Arc::new(ScriptedGenerator::slow(Duration::from_secs(10)));
    let config = PipelineConfig {
        run_timeout_secs: 1,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline_with(generator, config);

    let err = pipeline.run(&korean_request(2, 3)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Timeout);
}

#[tokio::test]
async fn test_caller_cancellation() {
    let generator = Arc::new(ScriptedGenerator::slow(Duration::from_secs(10)));
    let pipeline = pipeline_with(generator, PipelineConfig::default());

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = pipeline
        .run_with_cancel(&korean_request(2, 3), token)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Timeout { .. }));
}

#[tokio::test]
async fn test_custom_attempt_budget() {
    let generator = Arc::new(ScriptedGenerator::new(vec![]));
    let config = PipelineConfig {
        max_attempts: 5,
        batch_multiplier: 2,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline_with(generator.clone(), config);

    pipeline.run(&korean_request(1, 3)).await.unwrap();
    assert_eq!(generator.batch_sizes(), vec![2; 5]);
}
