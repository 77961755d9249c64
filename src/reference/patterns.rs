//! Communicative-function cue patterns

use crate::error::{EngineError, EngineResult};
use crate::model::request::CommunicativeFunction;
use fxhash::FxHashMap;
use regex::Regex;

const KOREAN_PATTERNS: &[(CommunicativeFunction, &str)] = &[
    (
        CommunicativeFunction::Request,
        r"줘|주세요|줄래|싶어|싶어요|하고\s*싶|먹고\s*싶|갖고\s*싶",
    ),
    (
        CommunicativeFunction::Reject,
        r"싫어|싫어요|안\s*해|안\s*할래|하기\s*싫|안\s*먹|안\s*갈",
    ),
    (
        CommunicativeFunction::Help,
        r"도와|도와줘|도와주세요|어떻게|어떡해|모르겠|못\s*하겠",
    ),
    (
        CommunicativeFunction::Choice,
        r"할래\?|먹을래\?|갈래\?|이거\s*저거|뭐\s*할|어떤\s*거",
    ),
    (
        CommunicativeFunction::Attention,
        r"봐봐|이거\s*봐|저거\s*봐|여기\s*봐|보세요|있어요",
    ),
    (
        CommunicativeFunction::Question,
        r"뭐야|뭐예요|어디|언제|누가|왜|어떻게|\?$",
    ),
];

/// Compiled patterns for one language
#[derive(Debug, Clone, Default)]
pub struct FunctionPatternTable {
    patterns: FxHashMap<CommunicativeFunction, Regex>,
}

impl FunctionPatternTable {
    pub fn compile(sources: &[(CommunicativeFunction, &str)]) -> EngineResult<Self> {
        let mut patterns = FxHashMap::default();
        for (function, source) in sources {
            let regex = Regex::new(source).map_err(|e| {
                EngineError::internal(format!("Invalid pattern for {:?}: {}", function, e))
            })?;
            patterns.insert(*function, regex);
        }
        Ok(Self { patterns })
    }

    pub fn korean() -> EngineResult<Self> {
        Self::compile(KOREAN_PATTERNS)
    }

    pub fn covers(&self, function: CommunicativeFunction) -> bool {
        self.patterns.contains_key(&function)
    }

    pub fn matches(&self, function: CommunicativeFunction, sentence: &str) -> bool {
        self.patterns
            .get(&function)
            .map_or(false, |regex| regex.is_match(sentence))
    }
}
