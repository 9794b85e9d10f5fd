use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;

use super::{AnalysisRecord, AnalysisStore, QuizStatus, Result};

/// In-memory store. Backs tests and single-process hosts; production
/// deployments plug their own document store into [`AnalysisStore`].
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, AnalysisRecord>>,
    statuses: Mutex<HashMap<String, QuizStatus>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, quiz_id: &str) -> Option<AnalysisRecord> {
        self.records.lock().get(quiz_id).cloned()
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn upsert(&self, quiz_id: &str, record: AnalysisRecord) -> Result<()> {
        debug!("Upserting analysis record for quiz {}", quiz_id);
        self.records.lock().insert(quiz_id.to_string(), record);
        Ok(())
    }

    async fn set_status(&self, quiz_id: &str, status: QuizStatus) -> Result<()> {
        debug!("Quiz {} status -> {}", quiz_id, status.as_str());
        self.statuses.lock().insert(quiz_id.to_string(), status);
        Ok(())
    }

    async fn get_status(&self, quiz_id: &str) -> Result<QuizStatus> {
        Ok(self
            .statuses
            .lock()
            .get(quiz_id)
            .copied()
            .unwrap_or(QuizStatus::NotStarted))
    }
}
