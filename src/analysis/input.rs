use std::collections::HashMap;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::models::{AnalysisInput, QuestionSpec, StudentInput};
use super::{AnalysisError, Result};

// Raw provider records, already fetched by the host. Provider question IDs
// churn between fetches, so they are only used to join answers to questions.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    pub id: String,
    pub concept: String,
    pub text: String,
    pub question_type: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    pub points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnswer {
    pub question_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResponse {
    pub email: String,
    pub answers: Vec<RawAnswer>,
}

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new("[^a-z0-9]").unwrap());

/// Stable student identifier derived from the respondent email. Never
/// regenerated for the same respondent.
pub fn student_id_for(email: &str) -> String {
    let lowered = email.trim().to_lowercase();
    format!("student-{}", NON_ALNUM.replace_all(&lowered, "-"))
}

// Best-effort display name from the email local part. Display only, never
// used for identity.
fn display_name_for(email: &str) -> String {
    let local = email.trim().split('@').next().unwrap_or(email);
    local
        .replace(['.', '_', '-', '+'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes raw question and response records into the canonical
/// [`AnalysisInput`] used both to compile the prompt and to check the
/// generator's output.
pub fn build_analysis_input(
    quiz_id: &str,
    quiz_title: &str,
    raw_questions: &[RawQuestion],
    raw_responses: &[RawResponse],
) -> Result<AnalysisInput> {
    if raw_questions.is_empty() {
        return Err(AnalysisError::EmptyQuestionSet);
    }
    if raw_responses.is_empty() {
        return Err(AnalysisError::EmptyResponseSet);
    }

    // Re-index provider IDs as dense Q1..Qn in their given order. The map is
    // internal only; nothing downstream sees raw IDs.
    let mut question_id_map: HashMap<&str, (String, f64)> = HashMap::new();
    let mut questions = Vec::with_capacity(raw_questions.len());
    for (idx, raw) in raw_questions.iter().enumerate() {
        let canonical = format!("Q{}", idx + 1);
        question_id_map.insert(raw.id.as_str(), (canonical.clone(), raw.points));
        questions.push(QuestionSpec {
            item_id: raw.id.clone(),
            question_id: canonical,
            concept: raw.concept.clone(),
            question_text: raw.text.clone(),
            question_type: raw.question_type.clone(),
            options: raw.options.clone(),
            correct_answers: raw.correct_answers.clone(),
            max_score: raw.points,
        });
    }

    let mut students = Vec::with_capacity(raw_responses.len());
    for response in raw_responses {
        let mut student = StudentInput {
            student_id: student_id_for(&response.email),
            student_name: display_name_for(&response.email),
            score: 0.0,
            max_score: 0.0,
            attempted_question_ids: Vec::new(),
            incorrect_question_ids: Vec::new(),
        };

        for answer in &response.answers {
            let (canonical, max_score) = match question_id_map.get(answer.question_id.as_str()) {
                Some(mapped) => mapped,
                None => {
                    // Question no longer present on the provider side.
                    debug!(
                        "Skipping answer for unknown question {} from {}",
                        answer.question_id, student.student_id
                    );
                    continue;
                }
            };

            student.attempted_question_ids.push(canonical.clone());
            student.score += answer.score;
            student.max_score += *max_score;

            if answer.score > *max_score {
                // Upstream data inconsistency. Recorded as attempted, not clamped.
                warn!(
                    "Reported score {} exceeds question max {} for {} on {}",
                    answer.score, max_score, student.student_id, canonical
                );
            }
            if answer.score < *max_score {
                student.incorrect_question_ids.push(canonical.clone());
            }
        }

        students.push(student);
    }

    debug!(
        "Built analysis input for quiz {}: {} questions, {} students",
        quiz_id,
        questions.len(),
        students.len()
    );

    Ok(AnalysisInput {
        quiz_id: quiz_id.to_string(),
        quiz_title: quiz_title.to_string(),
        questions,
        students,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, concept: &str, points: f64) -> RawQuestion {
        RawQuestion {
            id: id.to_string(),
            concept: concept.to_string(),
            text: format!("What about {}?", concept),
            question_type: "multiple_choice".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            correct_answers: vec!["a".to_string()],
            points,
        }
    }

    fn response(email: &str, answers: Vec<(&str, f64)>) -> RawResponse {
        RawResponse {
            email: email.to_string(),
            answers: answers
                .into_iter()
                .map(|(question_id, score)| RawAnswer {
                    question_id: question_id.to_string(),
                    score,
                })
                .collect(),
        }
    }

    #[test]
    fn reindexes_questions_densely_in_given_order() {
        let input = build_analysis_input(
            "quiz-1",
            "Algebra check",
            &[
                question("prov-9f3", "Linear equations", 1.0),
                question("prov-02a", "Factoring", 2.0),
            ],
            &[response("a@school.edu", vec![])],
        )
        .unwrap();

        assert_eq!(input.questions[0].question_id, "Q1");
        assert_eq!(input.questions[1].question_id, "Q2");
        assert_eq!(input.questions[0].item_id, "prov-9f3");
        assert_eq!(input.questions[1].max_score, 2.0);
    }

    #[test]
    fn derives_stable_student_id_from_email() {
        assert_eq!(
            student_id_for("Jane.Doe+quiz@School.edu"),
            "student-jane-doe-quiz-school-edu"
        );
        // Same respondent, same ID, every run.
        assert_eq!(student_id_for("jane.doe+quiz@school.edu"), student_id_for("Jane.Doe+quiz@School.edu"));
    }

    #[test]
    fn derives_display_name_from_local_part() {
        let input = build_analysis_input(
            "quiz-1",
            "Algebra check",
            &[question("q1", "Linear equations", 1.0)],
            &[response("jane.doe@school.edu", vec![("q1", 1.0)])],
        )
        .unwrap();

        assert_eq!(input.students[0].student_name, "jane doe");
    }

    #[test]
    fn marks_partial_credit_as_incorrect() {
        let input = build_analysis_input(
            "quiz-1",
            "Algebra check",
            &[question("q1", "Linear equations", 2.0), question("q2", "Factoring", 2.0)],
            &[response("a@school.edu", vec![("q1", 1.0), ("q2", 2.0)])],
        )
        .unwrap();

        let student = &input.students[0];
        assert_eq!(student.attempted_question_ids, vec!["Q1", "Q2"]);
        assert_eq!(student.incorrect_question_ids, vec!["Q1"]);
        assert_eq!(student.score, 3.0);
        assert_eq!(student.max_score, 4.0);
    }

    #[test]
    fn silently_skips_answers_for_unknown_questions() {
        let input = build_analysis_input(
            "quiz-1",
            "Algebra check",
            &[question("q1", "Linear equations", 1.0)],
            &[response("a@school.edu", vec![("q-deleted", 1.0), ("q1", 0.0)])],
        )
        .unwrap();

        let student = &input.students[0];
        assert_eq!(student.attempted_question_ids, vec!["Q1"]);
        assert_eq!(student.score, 0.0);
        assert_eq!(student.max_score, 1.0);
    }

    #[test]
    fn over_max_reported_score_is_not_clamped() {
        let input = build_analysis_input(
            "quiz-1",
            "Algebra check",
            &[question("q1", "Linear equations", 1.0)],
            &[response("a@school.edu", vec![("q1", 3.0)])],
        )
        .unwrap();

        let student = &input.students[0];
        assert_eq!(student.score, 3.0);
        assert_eq!(student.max_score, 1.0);
        assert!(student.incorrect_question_ids.is_empty());
        assert_eq!(student.attempted_question_ids, vec!["Q1"]);
    }

    #[test]
    fn rejects_empty_question_set() {
        let err = build_analysis_input("quiz-1", "t", &[], &[response("a@b.c", vec![])]).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyQuestionSet));
    }

    #[test]
    fn rejects_empty_response_set() {
        let err =
            build_analysis_input("quiz-1", "t", &[question("q1", "c", 1.0)], &[]).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyResponseSet));
    }
}
