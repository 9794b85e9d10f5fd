//! ClassPulse analysis core: ingests per-student quiz responses, asks a
//! schema-constrained generative model to classify misconceptions, validates
//! the model's output against the original input, and derives classroom
//! aggregates downstream reporting treats as ground truth.

pub mod analysis;
pub mod generation;
pub mod storage;

pub use analysis::{
    build_analysis_input, compile_analysis_prompt, derive, validate, AnalysisError, AnalysisInput,
    AnalysisPipeline, DerivedAnalysis, ErrorType, ModelOutput, RawAnswer, RawQuestion,
    RawResponse, RiskLevel, ValidationDiagnostic, ValidationErrorClass, ValidationFailure,
    DEFAULT_TEMPERATURE_LADDER,
};
pub use generation::{GeminiClient, GeminiModel, GenerationClient, GenerationError};
pub use storage::{AnalysisRecord, AnalysisStore, MemoryStore, QuizStatus, StorageError};
