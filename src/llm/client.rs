//! Hosted-model client: Ollama or any OpenAI-compatible chat endpoint

use crate::config::{LlmBackend, LlmConfig};
use crate::error::{EngineError, EngineResult};
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// LLM API client
pub struct LlmClient {
    backend: LlmBackend,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    client: Client,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    format: &'static str, // JSON format for structured output
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    response: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize, Debug)]
struct ChatReply {
    content: Option<String>,
}

impl LlmClient {
    pub fn from_config(config: &LlmConfig) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| EngineError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            backend: config.backend,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    pub fn backend(&self) -> LlmBackend {
        self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The OpenAI-compatible backend needs an API key
    pub fn is_configured(&self) -> bool {
        match self.backend {
            LlmBackend::Ollama => true,
            LlmBackend::OpenaiCompatible => self.api_key.is_some(),
        }
    }

    /// Generate a completion in JSON mode
    pub async fn complete(&self, system: &str, prompt: &str) -> EngineResult<String> {
        if !self.is_configured() {
            return Err(EngineError::service_unavailable(
                "LLM API key is not configured",
            ));
        }

        debug!(
            backend = ?self.backend,
            model = %self.model,
            prompt_len = prompt.len(),
            "Calling LLM"
        );
        let result = match self.backend {
            LlmBackend::Ollama => self.complete_ollama(system, prompt).await,
            LlmBackend::OpenaiCompatible => self.complete_chat(system, prompt).await,
        };
        result.map_err(classify_failure)
    }

    async fn complete_ollama(&self, system: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            format: "json",
            options: OllamaOptions {
                num_predict: self.max_tokens,
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?
            .error_for_status()
            .context("Ollama returned an error status")?;

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(ollama_response.response)
    }

    async fn complete_chat(&self, system: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .context("Failed to send request to chat completions endpoint")?
            .error_for_status()
            .context("Chat completions endpoint returned an error status")?;

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completions response")?;

        // An empty reply is a valid (if useless) answer
        Ok(chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    /// Check if the LLM server is reachable
    pub async fn health_check(&self) -> bool {
        if !self.is_configured() {
            return false;
        }
        let request = match self.backend {
            LlmBackend::Ollama => self.client.get(format!("{}/api/tags", self.base_url)),
            LlmBackend::OpenaiCompatible => {
                let mut req = self.client.get(format!("{}/models", self.base_url));
                if let Some(key) = &self.api_key {
                    req = req.bearer_auth(key);
                }
                req
            }
        };
        match request.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                info!(error = %e, "LLM health check failed");
                false
            }
        }
    }
}

/// Unreachable upstream -> SERVICE_UNAVAILABLE, everything else -> GENERATION_FAILED
fn classify_failure(err: anyhow::Error) -> EngineError {
    let unreachable = err.chain().any(|cause| {
        cause.downcast_ref::<reqwest::Error>().map_or(false, |e| {
            e.is_connect() || e.status() == Some(StatusCode::SERVICE_UNAVAILABLE)
        })
    });
    if unreachable {
        EngineError::service_unavailable(format!("{:#}", err))
    } else {
        EngineError::from(err)
    }
}
