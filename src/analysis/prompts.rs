use super::models::AnalysisInput;

/// Compiles the full generation request text for one analysis run. Pure and
/// deterministic: the same input always yields the same prompt.
pub fn compile_analysis_prompt(input: &AnalysisInput) -> String {
    let student_ids = input
        .students
        .iter()
        .map(|s| s.student_id.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let question_ids = input
        .questions
        .iter()
        .map(|q| q.question_id.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let serialized =
        serde_json::to_string_pretty(input).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are an experienced teaching assistant analyzing quiz results to surface student misconceptions.

## YOUR TASK

For every student below, classify how urgently they need intervention and diagnose the knowledge gaps behind their incorrect answers.

## CLASSIFICATION VALUES

- riskLevel: "critical", "high", "medium" or "low" - intervention urgency for the student.
- errorType: "conceptual" (misunderstands the idea), "procedural" (knows the idea but misapplies the method) or "careless" (slips despite understanding).
- severity: "high", "medium" or "low" - how much a knowledge gap holds the student back.

## HARD RULES

1. Produce exactly one assessment per studentId, for exactly these students: {student_ids}. Do not invent students. Do not leave any out.
2. Reference questions ONLY by their canonical IDs: {question_ids}.
3. A knowledge gap's affectedQuestionIds may cite only questions listed in that student's incorrectQuestionIds.
4. A student whose incorrectQuestionIds list is empty gets an empty knowledgeGaps array. Never fabricate gaps for a clean sheet.
5. Suggest one to three concrete interventions for each student with knowledge gaps.

## QUIZ DATA

{serialized}

Output ONLY the JSON object. No additional text."#
    )
}
