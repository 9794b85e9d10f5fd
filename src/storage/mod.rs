pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::models::{AnalysisInput, DerivedAnalysis, ModelOutput};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    NotStarted,
    Running,
    Completed,
    Error,
}

impl QuizStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizStatus::NotStarted => "not_started",
            QuizStatus::Running => "running",
            QuizStatus::Completed => "completed",
            QuizStatus::Error => "error",
        }
    }
}

/// Persisted envelope for one completed analysis run. The input is kept
/// verbatim so the derived analysis can be audited or re-derived later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub quiz_id: String,
    pub run_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub analysis_input: AnalysisInput,
    pub model_output: ModelOutput,
    pub derived_analysis: DerivedAnalysis,
}

impl AnalysisRecord {
    pub fn new(
        quiz_id: &str,
        analysis_input: AnalysisInput,
        model_output: ModelOutput,
        derived_analysis: DerivedAnalysis,
    ) -> Self {
        AnalysisRecord {
            quiz_id: quiz_id.to_string(),
            run_id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            analysis_input,
            model_output,
            derived_analysis,
        }
    }
}

/// Key-value persistence collaborator, keyed by quiz. The status field
/// doubles as the cross-process mutual-exclusion token for analysis runs.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Idempotent upsert: re-running a quiz overwrites, never appends.
    async fn upsert(&self, quiz_id: &str, record: AnalysisRecord) -> Result<()>;
    async fn set_status(&self, quiz_id: &str, status: QuizStatus) -> Result<()>;
    async fn get_status(&self, quiz_id: &str) -> Result<QuizStatus>;
}

#[async_trait]
impl<T: AnalysisStore + ?Sized> AnalysisStore for std::sync::Arc<T> {
    async fn upsert(&self, quiz_id: &str, record: AnalysisRecord) -> Result<()> {
        (**self).upsert(quiz_id, record).await
    }

    async fn set_status(&self, quiz_id: &str, status: QuizStatus) -> Result<()> {
        (**self).set_status(quiz_id, status).await
    }

    async fn get_status(&self, quiz_id: &str) -> Result<QuizStatus> {
        (**self).get_status(quiz_id).await
    }
}
