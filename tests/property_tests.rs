//! Property tests for the validator and derivation invariants.

use proptest::prelude::*;
use serde_json::json;

use classpulse_core::analysis::models::{
    AnalysisInput, KnowledgeGap, ModelOutput, QuestionSpec, StudentAssessment, StudentInput,
};
use classpulse_core::{derive, validate, ErrorType, RiskLevel, ValidationErrorClass};

fn question(n: usize) -> QuestionSpec {
    QuestionSpec {
        item_id: format!("prov-{}", n),
        question_id: format!("Q{}", n),
        concept: format!("Concept {}", n % 3),
        question_text: "q".to_string(),
        question_type: "short_answer".to_string(),
        options: vec![],
        correct_answers: vec![],
        max_score: 1.0,
    }
}

fn input_with(students: Vec<StudentInput>) -> AnalysisInput {
    AnalysisInput {
        quiz_id: "quiz-prop".to_string(),
        quiz_title: "Property quiz".to_string(),
        questions: (1..=4).map(question).collect(),
        students,
    }
}

fn student(idx: usize, incorrect: Vec<&str>) -> StudentInput {
    StudentInput {
        student_id: format!("student-{}", idx),
        student_name: format!("student {}", idx),
        score: 4.0 - incorrect.len() as f64,
        max_score: 4.0,
        attempted_question_ids: (1..=4).map(|n| format!("Q{}", n)).collect(),
        incorrect_question_ids: incorrect.into_iter().map(String::from).collect(),
    }
}

fn assessment_json(student_id: &str, risk: &str, gap_question_ids: &[String]) -> serde_json::Value {
    let gaps: Vec<serde_json::Value> = gap_question_ids
        .iter()
        .map(|qid| {
            json!({
                "concept": "Concept 0",
                "errorType": "conceptual",
                "severity": "medium",
                "affectedQuestionIds": [qid],
            })
        })
        .collect();
    json!({
        "studentId": student_id,
        "riskLevel": risk,
        "knowledgeGaps": gaps,
        "interventions": [],
    })
}

proptest! {
    // Any output whose ID set is not exactly the input's must be rejected as
    // a coverage mismatch, whichever side the discrepancy is on.
    #[test]
    fn coverage_mismatch_is_always_rejected(
        student_count in 2usize..8,
        drop_index in 0usize..8,
        add_extra in proptest::bool::ANY,
    ) {
        let drop_index = drop_index % student_count;
        let input = input_with(
            (0..student_count).map(|i| student(i, vec!["Q1"])).collect(),
        );

        let mut assessments: Vec<serde_json::Value> = input
            .students
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != drop_index)
            .map(|(_, s)| assessment_json(&s.student_id, "medium", &["Q1".to_string()]))
            .collect();
        if add_extra {
            assessments.push(assessment_json("student-uninvited", "low", &[]));
        }
        let raw = json!({ "students": assessments }).to_string();

        let failure = validate(&raw, &input).unwrap_err();
        prop_assert_eq!(failure.class, ValidationErrorClass::StudentCoverageMismatch);
    }

    // A permutation of the complete ID set is still full coverage.
    #[test]
    fn permuted_full_coverage_is_accepted(
        student_count in 2usize..8,
        rotation in 0usize..8,
    ) {
        let input = input_with(
            (0..student_count).map(|i| student(i, vec!["Q1"])).collect(),
        );

        let mut assessments: Vec<serde_json::Value> = input
            .students
            .iter()
            .map(|s| assessment_json(&s.student_id, "medium", &["Q1".to_string()]))
            .collect();
        assessments.rotate_left(rotation % student_count);
        let raw = json!({ "students": assessments }).to_string();

        prop_assert!(validate(&raw, &input).is_ok());
    }

    // Citing a question outside the student's incorrect set is always a
    // reference violation, whether they answered it correctly or never saw it.
    #[test]
    fn out_of_scope_question_reference_is_rejected(bogus in 2usize..40) {
        let input = input_with(vec![student(0, vec!["Q1"])]);
        let cited = format!("Q{}", bogus);
        let raw = json!({
            "students": [assessment_json("student-0", "high", &[cited])]
        })
        .to_string();

        let failure = validate(&raw, &input).unwrap_err();
        prop_assert_eq!(failure.class, ValidationErrorClass::InvalidQuestionReference);
    }

    // Integer percentages over any risk split must close to exactly 100.
    #[test]
    fn risk_percentages_always_sum_to_100(levels in proptest::collection::vec(0usize..4, 1..40)) {
        let students: Vec<StudentAssessment> = levels
            .iter()
            .enumerate()
            .map(|(i, &level)| StudentAssessment {
                student_id: format!("student-{}", i),
                risk_level: RiskLevel::ALL[level],
                knowledge_gaps: vec![],
                interventions: vec![],
            })
            .collect();
        let output = ModelOutput { students };
        let input = input_with(
            (0..levels.len()).map(|i| student(i, vec![])).collect(),
        );

        let derived = derive(&input, &output);
        let total: u32 = derived.risk_distribution.iter().map(|b| b.percentage).sum();
        prop_assert_eq!(total, 100);
    }

    // Same closure property for the per-gap error-type mix.
    #[test]
    fn error_type_percentages_always_sum_to_100(
        gap_types in proptest::collection::vec(0usize..3, 1..60),
    ) {
        let gaps: Vec<KnowledgeGap> = gap_types
            .iter()
            .map(|&t| KnowledgeGap {
                concept: "Concept 0".to_string(),
                error_type: ErrorType::ALL[t],
                severity: "medium".to_string(),
                affected_question_ids: vec!["Q1".to_string()],
            })
            .collect();
        let output = ModelOutput {
            students: vec![StudentAssessment {
                student_id: "student-0".to_string(),
                risk_level: RiskLevel::High,
                knowledge_gaps: gaps,
                interventions: vec![],
            }],
        };
        let input = input_with(vec![student(0, vec!["Q1"])]);

        let derived = derive(&input, &output);
        let total: u32 = derived.error_type_breakdown.iter().map(|b| b.percentage).sum();
        prop_assert_eq!(total, 100);
    }

    // Derivation has no hidden state: the same pair derives byte-identical
    // results every time.
    #[test]
    fn derive_is_idempotent(
        levels in proptest::collection::vec(0usize..4, 1..20),
        gap_counts in proptest::collection::vec(0usize..4, 1..20),
    ) {
        let n = levels.len().min(gap_counts.len());
        let students: Vec<StudentAssessment> = (0..n)
            .map(|i| StudentAssessment {
                student_id: format!("student-{}", i),
                risk_level: RiskLevel::ALL[levels[i]],
                knowledge_gaps: (0..gap_counts[i])
                    .map(|g| KnowledgeGap {
                        concept: format!("Concept {}", g % 3),
                        error_type: ErrorType::ALL[g % 3],
                        severity: "low".to_string(),
                        affected_question_ids: vec!["Q1".to_string()],
                    })
                    .collect(),
                interventions: vec![],
            })
            .collect();
        let output = ModelOutput { students };
        let input = input_with((0..n).map(|i| student(i, vec!["Q1"])).collect());

        let first = derive(&input, &output);
        let second = derive(&input, &output);
        prop_assert_eq!(first, second);
    }
}
