use stimulus_engine::config::EngineConfig;
use stimulus_engine::llm::{LlmClient, LlmSentenceGenerator};
use stimulus_engine::pipeline::StimulusPipeline;
use stimulus_engine::reference::ReferenceData;
use stimulus_engine::web::start_server;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Defaults, optional STIMULUS_CONFIG file, then STIMULUS_* overrides
    let config = EngineConfig::from_env()?;

    let reference = Arc::new(ReferenceData::load(&config.data)?);
    let client = LlmClient::from_config(&config.llm)?;
    if !client.is_configured() {
        tracing::warn!("LLM API key missing; generate requests will report SERVICE_UNAVAILABLE");
    }
    info!(backend = ?config.llm.backend, model = %config.llm.model, "LLM client ready");

    let generator = Arc::new(LlmSentenceGenerator::new(client));
    let pipeline = Arc::new(StimulusPipeline::new(generator, reference, config.pipeline.clone()));

    start_server(pipeline, &config.server).await?;

    Ok(())
}
