use log::{error, info, warn};
use serde_json::Value;

use crate::generation::GenerationClient;
use crate::storage::{AnalysisRecord, AnalysisStore, QuizStatus};

use super::derive::derive;
use super::input::{build_analysis_input, RawQuestion, RawResponse};
use super::models::{AnalysisInput, ModelOutput};
use super::prompts::compile_analysis_prompt;
use super::schema::model_output_schema;
use super::validator::{validate, ValidationErrorClass, ValidationFailure};
use super::{AnalysisError, Result};

/// Ascending by design: early rungs favor determinism, later rungs trade it
/// for output diversity after repeated structural failures.
pub const DEFAULT_TEMPERATURE_LADDER: &[f64] = &[0.2, 0.4, 0.7];

/// End-to-end analysis flow for one quiz: normalize input, compile the
/// prompt, walk the temperature ladder until the generator's output
/// validates, derive classroom aggregates, persist.
pub struct AnalysisPipeline<G, S> {
    generator: G,
    store: S,
    ladder: Vec<f64>,
}

impl<G: GenerationClient, S: AnalysisStore> AnalysisPipeline<G, S> {
    pub fn new(generator: G, store: S) -> Self {
        AnalysisPipeline {
            generator,
            store,
            ladder: DEFAULT_TEMPERATURE_LADDER.to_vec(),
        }
    }

    pub fn with_temperature_ladder(mut self, ladder: Vec<f64>) -> Self {
        self.ladder = ladder;
        self
    }

    pub async fn analyze_quiz(
        &self,
        quiz_id: &str,
        quiz_title: &str,
        raw_questions: &[RawQuestion],
        raw_responses: &[RawResponse],
    ) -> Result<AnalysisRecord> {
        // 1. The persisted status field is the mutual-exclusion token. A run
        //    that observes `running` must not proceed past this point, and
        //    must not stomp the other run's status either.
        let status = self.store.get_status(quiz_id).await?;
        if status == QuizStatus::Running {
            warn!("Analysis already running for quiz {}", quiz_id);
            return Err(AnalysisError::AlreadyRunning(quiz_id.to_string()));
        }
        self.store.set_status(quiz_id, QuizStatus::Running).await?;
        info!("🔍 Starting analysis for quiz {}", quiz_id);

        let result = match self
            .run(quiz_id, quiz_title, raw_questions, raw_responses)
            .await
        {
            Ok(record) => match self.persist(quiz_id, record).await {
                Ok(record) => {
                    info!("✅ Analysis completed for quiz {}", quiz_id);
                    return Ok(record);
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        // Every failure path leaves the quiz flagged as errored.
        if let Err(status_err) = self.store.set_status(quiz_id, QuizStatus::Error).await {
            error!("Failed to flag quiz {} as errored: {}", quiz_id, status_err);
        }
        result
    }

    async fn run(
        &self,
        quiz_id: &str,
        quiz_title: &str,
        raw_questions: &[RawQuestion],
        raw_responses: &[RawResponse],
    ) -> Result<AnalysisRecord> {
        // 2. Normalize the raw provider records into the canonical input.
        let input = build_analysis_input(quiz_id, quiz_title, raw_questions, raw_responses)?;

        // 3. Prompt and schema are compiled once; every rung reuses them.
        let prompt = compile_analysis_prompt(&input);
        let schema = model_output_schema();

        // 4. Walk the ladder until the output validates.
        let (output, attempts) = self.run_ladder(&prompt, &schema, &input).await?;
        info!(
            "🧠 Model output for quiz {} validated on attempt {}",
            quiz_id, attempts
        );

        // 5. Derive classroom aggregates from the validated output.
        let derived = derive(&input, &output);
        Ok(AnalysisRecord::new(quiz_id, input, output, derived))
    }

    // The ladder is data consumed by index: attempt N is a pure function of
    // (ladder, input, N). Rungs run sequentially; retries exist to improve
    // validity odds, not throughput.
    async fn run_ladder(
        &self,
        prompt: &str,
        schema: &Value,
        input: &AnalysisInput,
    ) -> Result<(ModelOutput, usize)> {
        let mut last_failure: Option<ValidationFailure> = None;

        for (attempt, &temperature) in self.ladder.iter().enumerate() {
            info!(
                "Generation attempt {}/{} at temperature {}",
                attempt + 1,
                self.ladder.len(),
                temperature
            );

            // An infrastructure failure is definite; retrying it at another
            // temperature would only burn quota. The `?` aborts the ladder.
            let raw = self.generator.generate(prompt, schema, temperature).await?;

            match validate(&raw, input) {
                Ok(output) => return Ok((output, attempt + 1)),
                Err(failure) => {
                    warn!(
                        "❌ Attempt {} rejected: {}",
                        attempt + 1,
                        failure
                    );
                    // Only the last attempt's diagnostics survive exhaustion.
                    last_failure = Some(failure);
                }
            }
        }

        Err(AnalysisError::Exhausted {
            attempts: self.ladder.len(),
            failure: last_failure.unwrap_or(ValidationFailure {
                // Empty ladder: nothing was ever attempted.
                class: ValidationErrorClass::MalformedOutput,
                diagnostics: Vec::new(),
                omitted: 0,
            }),
        })
    }

    // Completed is flipped in the same logical step as the upsert so readers
    // never observe a completed quiz without its analysis document.
    async fn persist(&self, quiz_id: &str, record: AnalysisRecord) -> Result<AnalysisRecord> {
        self.store.upsert(quiz_id, record.clone()).await?;
        self.store.set_status(quiz_id, QuizStatus::Completed).await?;
        Ok(record)
    }
}
