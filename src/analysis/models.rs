use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Canonical analysis input, built once per run by the input builder and
// treated as ground truth for validation afterwards.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSpec {
    /// Provider-native item identifier, kept for audit only.
    pub item_id: String,
    /// Dense canonical identifier ("Q1".."Qn"), stable within one run.
    pub question_id: String,
    pub concept: String,
    pub question_text: String,
    pub question_type: String,
    pub options: Vec<String>,
    pub correct_answers: Vec<String>,
    pub max_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub student_id: String,
    pub student_name: String,
    pub score: f64,
    pub max_score: f64,
    pub attempted_question_ids: Vec<String>,
    pub incorrect_question_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInput {
    pub quiz_id: String,
    pub quiz_title: String,
    pub questions: Vec<QuestionSpec>,
    pub students: Vec<StudentInput>,
}

// Generator-facing output model. The JsonSchema derives feed the response
// schema sent alongside the prompt; doc comments surface as field
// descriptions for the model.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Critical,
        RiskLevel::High,
        RiskLevel::Medium,
        RiskLevel::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "critical",
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(RiskLevel::Critical),
            "high" => Some(RiskLevel::High),
            "medium" => Some(RiskLevel::Medium),
            "low" => Some(RiskLevel::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Conceptual,
    Procedural,
    Careless,
}

impl ErrorType {
    // Declaration order doubles as the tie-break order for dominant-type
    // selection in the derivation engine.
    pub const ALL: [ErrorType; 3] = [
        ErrorType::Conceptual,
        ErrorType::Procedural,
        ErrorType::Careless,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Conceptual => "conceptual",
            ErrorType::Procedural => "procedural",
            ErrorType::Careless => "careless",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "conceptual" => Some(ErrorType::Conceptual),
            "procedural" => Some(ErrorType::Procedural),
            "careless" => Some(ErrorType::Careless),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGap {
    /// The concept the student is struggling with.
    pub concept: String,
    /// Why the student got the cited questions wrong.
    pub error_type: ErrorType,
    /// "high", "medium" or "low".
    pub severity: String,
    /// Canonical IDs of the incorrect questions exhibiting this gap.
    pub affected_question_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    /// Kind of intervention, e.g. "practice", "reteach", "one_on_one".
    #[serde(rename = "type")]
    pub kind: String,
    pub focus_area: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssessment {
    /// Must be one of the studentIds from the analysis input.
    pub student_id: String,
    /// How urgently this student needs intervention.
    pub risk_level: RiskLevel,
    pub knowledge_gaps: Vec<KnowledgeGap>,
    pub interventions: Vec<Intervention>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelOutput {
    /// Exactly one assessment per student in the analysis input.
    pub students: Vec<StudentAssessment>,
}

// Derived aggregates, computed locally and never generator-produced.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMetrics {
    pub average_score: f64,
    pub median_score: f64,
    /// Mean attempted-questions ratio across students, as a percentage.
    pub average_completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskBucket {
    pub risk_level: RiskLevel,
    pub count: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptHotspot {
    pub concept: String,
    pub affected_student_count: u32,
    pub dominant_error_type: ErrorType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorTypeBucket {
    pub error_type: ErrorType,
    pub count: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedAnalysis {
    pub score_metrics: ScoreMetrics,
    pub risk_distribution: Vec<RiskBucket>,
    pub concept_heatmap: Vec<ConceptHotspot>,
    pub error_type_breakdown: Vec<ErrorTypeBucket>,
}
