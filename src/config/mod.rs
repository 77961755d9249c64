/// Configuration management
pub mod pipeline;
pub mod production;

pub use pipeline::*;
pub use production::*;

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level engine configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    pub data: DataConfig,
}

impl EngineConfig {
    /// Parse a TOML document; missing sections take their defaults
    pub fn from_toml_str(contents: &str) -> EngineResult<Self> {
        let config: EngineConfig = toml::from_str(contents)
            .map_err(|e| EngineError::internal(format!("Failed to parse config: {}", e)))?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::internal(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Defaults (or `STIMULUS_CONFIG` file) overlaid with `STIMULUS_*` variables
    pub fn from_env() -> EngineResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable lookup
    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("STIMULUS_CONFIG") {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(host) = lookup("STIMULUS_HOST") {
            config.server.host = host;
        }
        if let Some(port) = lookup("STIMULUS_PORT").or_else(|| lookup("PORT")) {
            config.server.port = parse_var("STIMULUS_PORT", &port)?;
        }
        if let Some(backend) = lookup("STIMULUS_LLM_BACKEND") {
            config.llm.backend = LlmBackend::parse(&backend).ok_or_else(|| {
                EngineError::internal(format!("Unknown STIMULUS_LLM_BACKEND '{}'", backend))
            })?;
        }
        if let Some(url) = lookup("STIMULUS_LLM_URL") {
            config.llm.base_url = url;
        }
        if let Some(model) = lookup("STIMULUS_LLM_MODEL") {
            config.llm.model = model;
        }
        if let Some(key) = lookup("STIMULUS_LLM_API_KEY") {
            if !key.trim().is_empty() {
                config.llm.api_key = Some(key);
            }
        }
        if let Some(attempts) = lookup("STIMULUS_MAX_ATTEMPTS") {
            config.pipeline.max_attempts = parse_var("STIMULUS_MAX_ATTEMPTS", &attempts)?;
        }
        if let Some(secs) = lookup("STIMULUS_RUN_TIMEOUT_SECS") {
            config.pipeline.run_timeout_secs = parse_var("STIMULUS_RUN_TIMEOUT_SECS", &secs)?;
        }

        config.pipeline.validate()?;
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> EngineResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| EngineError::internal(format!("Invalid value for {}: '{}'", name, value)))
}
