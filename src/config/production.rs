/// Deployment configuration: server binding, hosted-model client, reference data paths
///
/// Every section has a `Default` so a bare `EngineConfig::default()` runs against a
/// local Ollama server with the embedded reference data.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,

    /// Port
    pub port: u16,

    /// Allowed CORS origins (empty = permissive)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which hosted-model API the generator talks to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmBackend {
    /// Ollama `/api/generate`
    Ollama,
    /// Any `/chat/completions` endpoint speaking the OpenAI wire format
    OpenaiCompatible,
}

impl LlmBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "openai_compatible" | "openai-compatible" => Some(Self::OpenaiCompatible),
            _ => None,
        }
    }
}

/// Hosted language model client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub backend: LlmBackend,

    /// Base URL (no trailing slash needed)
    pub base_url: String,

    pub model: String,

    /// Bearer key; required by the OpenAI-compatible backend
    pub api_key: Option<String>,

    /// Sampling temperature. Generation wants variety, unlike plan generation.
    pub temperature: f32,

    /// Max tokens to generate per call
    pub max_tokens: u32,

    /// Per-call HTTP timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            temperature: 0.8,
            max_tokens: 4096,
            request_timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Optional on-disk overrides for the embedded reference data
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// JSON object `{ "word": score }` (Korean familiarity scores, 0-100)
    pub frequency_path: Option<PathBuf>,

    /// JSON object `{ "forbidden": ["term", ...] }`
    pub forbidden_words_path: Option<PathBuf>,

    /// CMUdict-format pronunciation dictionary
    pub pronunciation_dict_path: Option<PathBuf>,
}
