pub mod derive;
pub mod input;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod schema;
pub mod validator;

pub use derive::derive;
pub use input::{build_analysis_input, RawAnswer, RawQuestion, RawResponse};
pub use models::{AnalysisInput, DerivedAnalysis, ErrorType, ModelOutput, RiskLevel};
pub use pipeline::{AnalysisPipeline, DEFAULT_TEMPERATURE_LADDER};
pub use prompts::compile_analysis_prompt;
pub use validator::{validate, ValidationDiagnostic, ValidationErrorClass, ValidationFailure};

use thiserror::Error;

use crate::generation::GenerationError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AnalysisError {
    // Preconditions: caller-correctable, never retried.
    #[error("quiz has no questions to analyze")]
    EmptyQuestionSet,
    #[error("quiz has no responses to analyze")]
    EmptyResponseSet,
    #[error("an analysis is already running for quiz {0}")]
    AlreadyRunning(String),
    // Infrastructure: aborts the retry ladder immediately.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    // Validation: retried across the temperature ladder; carries only the
    // final attempt's class and diagnostics.
    #[error("model output rejected after {attempts} attempt(s): {failure}")]
    Exhausted {
        attempts: usize,
        failure: ValidationFailure,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
