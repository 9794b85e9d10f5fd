use std::collections::{BTreeMap, HashSet};

use super::models::{
    AnalysisInput, ConceptHotspot, DerivedAnalysis, ErrorType, ErrorTypeBucket, ModelOutput,
    RiskBucket, RiskLevel, ScoreMetrics,
};

/// Computes classroom aggregates from a validated model output joined with
/// the canonical input. Pure and total: validated input has no failure path
/// left, and the same pair always derives the identical analysis.
pub fn derive(input: &AnalysisInput, output: &ModelOutput) -> DerivedAnalysis {
    DerivedAnalysis {
        score_metrics: score_metrics(input),
        risk_distribution: risk_distribution(output),
        concept_heatmap: concept_heatmap(output),
        error_type_breakdown: error_type_breakdown(output),
    }
}

fn score_metrics(input: &AnalysisInput) -> ScoreMetrics {
    if input.students.is_empty() || input.questions.is_empty() {
        return ScoreMetrics {
            average_score: 0.0,
            median_score: 0.0,
            average_completion_rate: 0.0,
        };
    }

    let count = input.students.len() as f64;
    let average_score = input.students.iter().map(|s| s.score).sum::<f64>() / count;

    let mut sorted: Vec<f64> = input.students.iter().map(|s| s.score).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    let median_score = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let question_count = input.questions.len() as f64;
    let average_completion_rate = input
        .students
        .iter()
        .map(|s| 100.0 * s.attempted_question_ids.len() as f64 / question_count)
        .sum::<f64>()
        / count;

    ScoreMetrics {
        average_score,
        median_score,
        average_completion_rate,
    }
}

// Integer percentages drift away from 100 under rounding. The residual goes
// to the largest-count bucket (first such bucket in enum declaration order on
// ties), keeping the sum at exactly 100 without floating-point adjustment.
fn rounded_percentages(counts: &[usize]) -> Vec<u32> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0; counts.len()];
    }

    let mut percentages: Vec<i64> = counts
        .iter()
        .map(|&count| (100.0 * count as f64 / total as f64).round() as i64)
        .collect();

    let residual = 100 - percentages.iter().sum::<i64>();
    if residual != 0 {
        let mut largest = 0;
        for (idx, &count) in counts.iter().enumerate() {
            if count > counts[largest] {
                largest = idx;
            }
        }
        percentages[largest] += residual;
    }

    percentages.into_iter().map(|p| p.max(0) as u32).collect()
}

fn risk_distribution(output: &ModelOutput) -> Vec<RiskBucket> {
    let mut buckets: Vec<(RiskLevel, usize)> = Vec::new();
    for level in RiskLevel::ALL {
        let count = output
            .students
            .iter()
            .filter(|s| s.risk_level == level)
            .count();
        if count > 0 {
            buckets.push((level, count));
        }
    }

    let counts: Vec<usize> = buckets.iter().map(|(_, count)| *count).collect();
    let percentages = rounded_percentages(&counts);

    buckets
        .into_iter()
        .zip(percentages)
        .map(|((risk_level, count), percentage)| RiskBucket {
            risk_level,
            count: count as u32,
            percentage,
        })
        .collect()
}

fn concept_heatmap(output: &ModelOutput) -> Vec<ConceptHotspot> {
    // concept -> (distinct students, per-error-type gap counts)
    let mut by_concept: BTreeMap<&str, (HashSet<&str>, [usize; 3])> = BTreeMap::new();
    for student in &output.students {
        for gap in &student.knowledge_gaps {
            let entry = by_concept.entry(gap.concept.as_str()).or_default();
            entry.0.insert(student.student_id.as_str());
            entry.1[gap.error_type as usize] += 1;
        }
    }

    let mut hotspots: Vec<ConceptHotspot> = by_concept
        .into_iter()
        .map(|(concept, (students, type_counts))| {
            let mut dominant = 0;
            for (idx, &count) in type_counts.iter().enumerate() {
                if count > type_counts[dominant] {
                    dominant = idx;
                }
            }
            ConceptHotspot {
                concept: concept.to_string(),
                affected_student_count: students.len() as u32,
                dominant_error_type: ErrorType::ALL[dominant],
            }
        })
        .collect();

    hotspots.sort_by(|a, b| {
        b.affected_student_count
            .cmp(&a.affected_student_count)
            .then_with(|| a.concept.cmp(&b.concept))
    });
    hotspots
}

fn error_type_breakdown(output: &ModelOutput) -> Vec<ErrorTypeBucket> {
    let mut buckets: Vec<(ErrorType, usize)> = Vec::new();
    for error_type in ErrorType::ALL {
        // Counted over gap instances, not students.
        let count = output
            .students
            .iter()
            .flat_map(|s| &s.knowledge_gaps)
            .filter(|gap| gap.error_type == error_type)
            .count();
        if count > 0 {
            buckets.push((error_type, count));
        }
    }

    let counts: Vec<usize> = buckets.iter().map(|(_, count)| *count).collect();
    let percentages = rounded_percentages(&counts);

    buckets
        .into_iter()
        .zip(percentages)
        .map(|((error_type, count), percentage)| ErrorTypeBucket {
            error_type,
            count: count as u32,
            percentage,
        })
        .collect()
}
