/// Unified error type for the stimulus engine
/// Provides structured error handling with categories that map onto the wire error codes
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire-level error codes carried in the failure envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    GenerationFailed,
    ServiceUnavailable,
    Timeout,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::GenerationFailed => "GENERATION_FAILED",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::Timeout => "TIMEOUT",
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// Request failed shape/range constraints; rejected before the pipeline runs
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        field: Option<String>,
    },

    /// Generator call or internal processing failed mid-run
    #[error("Generation failed: {message}")]
    GenerationFailed {
        message: String,
        context: Option<String>,
    },

    /// Generator collaborator is unreachable or unconfigured
    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// Caller cancellation or wall-clock budget exhausted
    #[error("Timeout: {message}")]
    Timeout {
        message: String,
        elapsed_ms: Option<u64>,
    },

    /// Internal errors: should never happen, indicates bug or broken reference data
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        context: Option<String>,
    },
}

impl EngineError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            field: None,
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            message: message.into(),
            context: None,
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>, elapsed_ms: Option<u64>) -> Self {
        Self::Timeout {
            message: message.into(),
            elapsed_ms,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::GenerationFailed { context: ctx, .. } => *ctx = Some(context.into()),
            Self::Internal { context: ctx, .. } => *ctx = Some(context.into()),
            _ => {}
        }
        self
    }

    /// Wire code for this error. Internal failures surface as GENERATION_FAILED.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::GenerationFailed { .. } | Self::Internal { .. } => ErrorCode::GenerationFailed,
            Self::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            Self::Timeout { .. } => ErrorCode::Timeout,
        }
    }

    /// Short message safe to show end users
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest { message, .. } => message.clone(),
            Self::GenerationFailed { .. } | Self::Internal { .. } => {
                "Sentence generation failed. Please try again.".to_string()
            }
            Self::ServiceUnavailable { .. } => {
                "The sentence generator is currently unavailable.".to_string()
            }
            Self::Timeout { .. } => "Sentence generation timed out.".to_string(),
        }
    }

    /// Diagnostic detail retained for logs and the optional `details` field
    pub fn details(&self) -> Option<String> {
        match self {
            Self::InvalidRequest { field, .. } => field.clone(),
            Self::GenerationFailed { message, context } | Self::Internal { message, context } => {
                Some(match context {
                    Some(ctx) => format!("{} ({})", message, ctx),
                    None => message.clone(),
                })
            }
            Self::ServiceUnavailable { message } => Some(message.clone()),
            Self::Timeout { elapsed_ms, .. } => elapsed_ms.map(|ms| format!("elapsed {}ms", ms)),
        }
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        Self::GenerationFailed {
            message: format!("{:#}", err),
            context: None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            context: None,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            context: Some("json".to_string()),
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
