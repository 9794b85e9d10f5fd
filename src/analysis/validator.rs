use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::models::{
    AnalysisInput, ErrorType, Intervention, KnowledgeGap, ModelOutput, RiskLevel,
    StudentAssessment,
};

/// Upper bound on enumerated diagnostics per failed attempt. Overflow is
/// recorded as a count so error payloads stay bounded regardless of class
/// size.
pub const MAX_DIAGNOSTICS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorClass {
    MalformedOutput,
    StudentCoverageMismatch,
    InvalidEnum,
    InvalidQuestionReference,
    FabricatedGap,
}

impl ValidationErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorClass::MalformedOutput => "malformed_output",
            ValidationErrorClass::StudentCoverageMismatch => "student_coverage_mismatch",
            ValidationErrorClass::InvalidEnum => "invalid_enum",
            ValidationErrorClass::InvalidQuestionReference => "invalid_question_reference",
            ValidationErrorClass::FabricatedGap => "fabricated_gap",
        }
    }
}

impl fmt::Display for ValidationErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDiagnostic {
    pub student_id: Option<String>,
    pub field: String,
    pub expected: String,
    pub actual: String,
    pub error_class: ValidationErrorClass,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub class: ValidationErrorClass,
    pub diagnostics: Vec<ValidationDiagnostic>,
    /// Diagnostics beyond [`MAX_DIAGNOSTICS`] are dropped, not enumerated.
    pub omitted: usize,
}

impl ValidationFailure {
    fn new(class: ValidationErrorClass, mut diagnostics: Vec<ValidationDiagnostic>) -> Self {
        let omitted = diagnostics.len().saturating_sub(MAX_DIAGNOSTICS);
        diagnostics.truncate(MAX_DIAGNOSTICS);
        ValidationFailure {
            class,
            diagnostics,
            omitted,
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.omitted > 0 {
            write!(
                f,
                "{} ({} issue(s), {} more omitted)",
                self.class,
                self.diagnostics.len(),
                self.omitted
            )
        } else {
            write!(f, "{} ({} issue(s))", self.class, self.diagnostics.len())
        }
    }
}

// Untrusted parse targets. Enums stay strings here so that a bad value is an
// InvalidEnum finding, not a parse failure.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedOutput {
    students: Vec<ParsedStudent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedStudent {
    student_id: String,
    risk_level: String,
    #[serde(default)]
    knowledge_gaps: Vec<ParsedGap>,
    #[serde(default)]
    interventions: Vec<ParsedIntervention>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedGap {
    #[serde(default)]
    concept: String,
    error_type: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    affected_question_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedIntervention {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    focus_area: String,
    #[serde(default)]
    description: String,
}

// Models wrap JSON in markdown fences often enough that stripping them is
// cheaper than a retry.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let inner = match trimmed.strip_prefix("```") {
        Some(inner) => inner.strip_prefix("json").unwrap_or(inner),
        None => return trimmed,
    };
    match inner.strip_suffix("```") {
        Some(body) => body.trim(),
        None => trimmed,
    }
}

/// Checks the raw generator output against the canonical input. Stages
/// short-circuit on the first failing class; each failure carries bounded,
/// structured diagnostics. Pure and deterministic for a given
/// `(raw_text, input)` pair.
pub fn validate(
    raw_text: &str,
    input: &AnalysisInput,
) -> std::result::Result<ModelOutput, ValidationFailure> {
    // 1. Parse.
    let parsed: ParsedOutput = match serde_json::from_str(strip_code_fences(raw_text)) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Err(ValidationFailure::new(
                ValidationErrorClass::MalformedOutput,
                vec![ValidationDiagnostic {
                    student_id: None,
                    field: "$".to_string(),
                    expected: "JSON object matching the analysis response schema".to_string(),
                    actual: e.to_string(),
                    error_class: ValidationErrorClass::MalformedOutput,
                }],
            ));
        }
    };

    // 2. Student coverage: the output's ID set must equal the input's exactly.
    let expected_ids: HashSet<&str> = input
        .students
        .iter()
        .map(|s| s.student_id.as_str())
        .collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut diagnostics = Vec::new();
    for student in &parsed.students {
        if !expected_ids.contains(student.student_id.as_str()) {
            diagnostics.push(ValidationDiagnostic {
                student_id: Some(student.student_id.clone()),
                field: "students".to_string(),
                expected: "a studentId from the analysis input".to_string(),
                actual: format!("unknown studentId {}", student.student_id),
                error_class: ValidationErrorClass::StudentCoverageMismatch,
            });
        } else if !seen.insert(student.student_id.as_str()) {
            diagnostics.push(ValidationDiagnostic {
                student_id: Some(student.student_id.clone()),
                field: "students".to_string(),
                expected: "exactly one assessment per student".to_string(),
                actual: format!("duplicate assessment for {}", student.student_id),
                error_class: ValidationErrorClass::StudentCoverageMismatch,
            });
        }
    }
    for student in &input.students {
        if !seen.contains(student.student_id.as_str()) {
            diagnostics.push(ValidationDiagnostic {
                student_id: Some(student.student_id.clone()),
                field: "students".to_string(),
                expected: format!("an assessment for {}", student.student_id),
                actual: "missing".to_string(),
                error_class: ValidationErrorClass::StudentCoverageMismatch,
            });
        }
    }
    if !diagnostics.is_empty() {
        return Err(ValidationFailure::new(
            ValidationErrorClass::StudentCoverageMismatch,
            diagnostics,
        ));
    }

    // 3. Enum validity over the closed risk-level and error-type sets.
    for student in &parsed.students {
        if RiskLevel::from_str(&student.risk_level).is_none() {
            diagnostics.push(ValidationDiagnostic {
                student_id: Some(student.student_id.clone()),
                field: "riskLevel".to_string(),
                expected: "one of critical|high|medium|low".to_string(),
                actual: student.risk_level.clone(),
                error_class: ValidationErrorClass::InvalidEnum,
            });
        }
        for gap in &student.knowledge_gaps {
            if ErrorType::from_str(&gap.error_type).is_none() {
                diagnostics.push(ValidationDiagnostic {
                    student_id: Some(student.student_id.clone()),
                    field: "knowledgeGaps.errorType".to_string(),
                    expected: "one of conceptual|procedural|careless".to_string(),
                    actual: gap.error_type.clone(),
                    error_class: ValidationErrorClass::InvalidEnum,
                });
            }
        }
    }
    if !diagnostics.is_empty() {
        return Err(ValidationFailure::new(
            ValidationErrorClass::InvalidEnum,
            diagnostics,
        ));
    }

    // 4. Referential integrity: a gap may only cite questions the student
    //    actually got wrong.
    let incorrect_by_student: HashMap<&str, HashSet<&str>> = input
        .students
        .iter()
        .map(|s| {
            (
                s.student_id.as_str(),
                s.incorrect_question_ids
                    .iter()
                    .map(String::as_str)
                    .collect(),
            )
        })
        .collect();
    for student in &parsed.students {
        let incorrect = match incorrect_by_student.get(student.student_id.as_str()) {
            Some(set) => set,
            None => continue, // coverage stage guarantees presence
        };
        for gap in &student.knowledge_gaps {
            for question_id in &gap.affected_question_ids {
                if !incorrect.contains(question_id.as_str()) {
                    diagnostics.push(ValidationDiagnostic {
                        student_id: Some(student.student_id.clone()),
                        field: "knowledgeGaps.affectedQuestionIds".to_string(),
                        expected: format!(
                            "a question from the student's incorrect set [{}]",
                            incorrect_list(incorrect)
                        ),
                        actual: question_id.clone(),
                        error_class: ValidationErrorClass::InvalidQuestionReference,
                    });
                }
            }
        }
    }
    if !diagnostics.is_empty() {
        return Err(ValidationFailure::new(
            ValidationErrorClass::InvalidQuestionReference,
            diagnostics,
        ));
    }

    // 5. Non-degenerate content: no gaps for students with nothing wrong.
    let clean_students: HashSet<&str> = input
        .students
        .iter()
        .filter(|s| s.incorrect_question_ids.is_empty())
        .map(|s| s.student_id.as_str())
        .collect();
    for student in &parsed.students {
        if clean_students.contains(student.student_id.as_str())
            && !student.knowledge_gaps.is_empty()
        {
            diagnostics.push(ValidationDiagnostic {
                student_id: Some(student.student_id.clone()),
                field: "knowledgeGaps".to_string(),
                expected: "[] for a student with no incorrect answers".to_string(),
                actual: format!("{} fabricated gap(s)", student.knowledge_gaps.len()),
                error_class: ValidationErrorClass::FabricatedGap,
            });
        }
    }
    if !diagnostics.is_empty() {
        return Err(ValidationFailure::new(
            ValidationErrorClass::FabricatedGap,
            diagnostics,
        ));
    }

    // All stages passed; materialize the typed output.
    let students = parsed
        .students
        .into_iter()
        .map(|student| StudentAssessment {
            // Both enums were checked in the enum stage.
            risk_level: RiskLevel::from_str(&student.risk_level).unwrap_or(RiskLevel::Medium),
            knowledge_gaps: student
                .knowledge_gaps
                .into_iter()
                .map(|gap| KnowledgeGap {
                    concept: gap.concept,
                    error_type: ErrorType::from_str(&gap.error_type)
                        .unwrap_or(ErrorType::Conceptual),
                    severity: gap.severity,
                    affected_question_ids: gap.affected_question_ids,
                })
                .collect(),
            interventions: student
                .interventions
                .into_iter()
                .map(|intervention| Intervention {
                    kind: intervention.kind,
                    focus_area: intervention.focus_area,
                    description: intervention.description,
                })
                .collect(),
            student_id: student.student_id,
        })
        .collect();

    Ok(ModelOutput { students })
}

fn incorrect_list(incorrect: &HashSet<&str>) -> String {
    let mut ids: Vec<&str> = incorrect.iter().copied().collect();
    ids.sort_unstable();
    ids.join(", ")
}
