/// Pipeline tuning: retry bound, batch growth, diversity cap, run deadline

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of generate→guard→validate rounds
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Default over-generation factor per missing sentence
pub const DEFAULT_BATCH_MULTIPLIER: usize = 3;

/// Default cap on selected sentences sharing one pattern key
pub const DEFAULT_MAX_SIMILAR: usize = 2;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on Collecting iterations
    pub max_attempts: usize,

    /// batch_size = (requested - collected) * batch_multiplier
    pub batch_multiplier: usize,

    /// Diversifier cap per pattern key
    pub max_similar: usize,

    /// Wall-clock budget for a whole run (seconds)
    pub run_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            batch_multiplier: DEFAULT_BATCH_MULTIPLIER,
            max_similar: DEFAULT_MAX_SIMILAR,
            run_timeout_secs: 45,
        }
    }
}

impl PipelineConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.max_attempts == 0 {
            return Err(EngineError::internal("pipeline.max_attempts must be at least 1"));
        }
        if self.batch_multiplier == 0 {
            return Err(EngineError::internal("pipeline.batch_multiplier must be at least 1"));
        }
        if self.max_similar == 0 {
            return Err(EngineError::internal("pipeline.max_similar must be at least 1"));
        }
        if self.run_timeout_secs == 0 {
            return Err(EngineError::internal("pipeline.run_timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.max_similar, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = PipelineConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
