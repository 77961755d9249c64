//! API envelope: `{success: true, data}` or `{success: false, error}`

use crate::error::{EngineError, EngineResult, ErrorCode};
use crate::model::item::{ContrastSet, GenerateMeta, PipelineResult, TherapyItem};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateData {
    pub items: Vec<TherapyItem>,
    pub meta: GenerateMeta,
    #[serde(rename = "contrastSets", default, skip_serializing_if = "Option::is_none")]
    pub contrast_sets: Option<Vec<ContrastSet>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Success { success: bool, data: GenerateData },
    Failure { success: bool, error: ErrorBody },
}

impl ApiResponse {
    pub fn success(result: PipelineResult) -> Self {
        let meta = result.meta();
        let contrast_sets = Some(result.contrast_sets).filter(|sets| !sets.is_empty());
        ApiResponse::Success {
            success: true,
            data: GenerateData {
                items: result.items,
                meta,
                contrast_sets,
            },
        }
    }

    pub fn failure(err: &EngineError) -> Self {
        ApiResponse::Failure {
            success: false,
            error: ErrorBody {
                code: err.code(),
                message: err.public_message(),
                details: err.details(),
            },
        }
    }

    pub fn from_result(result: EngineResult<PipelineResult>) -> Self {
        match result {
            Ok(result) => Self::success(result),
            Err(err) => Self::failure(&err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success { .. })
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ApiResponse::Failure { error, .. } => Some(error.code),
            ApiResponse::Success { .. } => None,
        }
    }
}
