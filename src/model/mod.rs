//! Request, item and envelope types shared by the pipeline and the HTTP surface

pub mod item;
pub mod request;
pub mod response;

pub use item::{
    ContrastSet, GenerateMeta, MatchedWord, PipelineResult, TherapyItem, TokenizedSentence,
};
pub use request::{
    CommunicativeFunction, DiagnosisType, GenerationRequest, Language, PhonemePosition,
    PhonologicalRulesMode, TargetSpec, TherapyApproach,
};
pub use response::{ApiResponse, ErrorBody, GenerateData};
