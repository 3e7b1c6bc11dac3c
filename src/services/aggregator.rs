//! Score aggregation across the nine quality dimensions.
//!
//! Runs one `DimensionAssessor` per dimension (in parallel or sequentially,
//! per configuration), normalizes the 1-5 dimension scores onto the 0-10
//! composite scale, and synthesizes the overall verdict.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::domain::models::{
    CognitiveResponse, CompositeAssessment, Dimension, DimensionAssessment, NormalizedScore,
    RatingLabel, SuccessCriterion, Tier,
};
use crate::domain::ports::oracle::ScoringOracle;
use crate::services::assessor::{AssessmentContext, DimensionAssessor};

/// Nine-way scoring engine producing one composite assessment per trial.
pub struct ScoreAggregator {
    assessors: Vec<DimensionAssessor>,
    parallel: bool,
}

impl ScoreAggregator {
    /// Build one assessor per dimension against the given oracle. When
    /// `parallel` is set the nine scoring calls run concurrently.
    pub fn new(oracle: Arc<dyn ScoringOracle>, parallel: bool) -> Self {
        let assessors = Dimension::ALL
            .iter()
            .map(|&dimension| DimensionAssessor::new(dimension, Arc::clone(&oracle)))
            .collect();
        Self { assessors, parallel }
    }

    /// Score one trial response along all nine dimensions and aggregate.
    ///
    /// Never fails: individual dimension failures surface as degraded
    /// assessments and drag the composite down instead of aborting it.
    pub async fn evaluate(
        &self,
        response: &CognitiveResponse,
        success_criteria: &[SuccessCriterion],
        tier: Tier,
        domain: &str,
    ) -> CompositeAssessment {
        let ctx = AssessmentContext {
            response,
            success_criteria,
            tier,
            domain,
        };

        let dimensions = if self.parallel {
            join_all(self.assessors.iter().map(|a| a.assess(&ctx))).await
        } else {
            let mut out = Vec::with_capacity(self.assessors.len());
            for assessor in &self.assessors {
                out.push(assessor.assess(&ctx).await);
            }
            out
        };

        Self::aggregate(dimensions)
    }

    /// Fold nine dimension assessments into the composite verdict.
    pub fn aggregate(dimensions: Vec<DimensionAssessment>) -> CompositeAssessment {
        let normalized_scores: Vec<NormalizedScore> = dimensions
            .iter()
            .map(|a| NormalizedScore {
                dimension: a.dimension,
                score: a.normalized(),
            })
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let overall_score = if normalized_scores.is_empty() {
            0.0
        } else {
            normalized_scores.iter().map(|n| n.score).sum::<f64>()
                / normalized_scores.len() as f64
        };

        let confidence = harmonic_mean(dimensions.iter().map(|a| a.confidence));

        let strengths: Vec<Dimension> = normalized_scores
            .iter()
            .filter(|n| n.is_strength())
            .map(|n| n.dimension)
            .collect();
        let weaknesses: Vec<Dimension> = normalized_scores
            .iter()
            .filter(|n| n.is_weakness())
            .map(|n| n.dimension)
            .collect();

        let label = RatingLabel::from_overall(overall_score);
        let degraded = dimensions.iter().filter(|a| a.is_degraded()).count();
        let reasoning = synthesize_reasoning(
            overall_score,
            label,
            &strengths,
            &weaknesses,
            confidence,
            degraded,
        );

        debug!(
            overall = overall_score,
            confidence,
            label = label.as_str(),
            degraded,
            "composite assessment aggregated"
        );

        CompositeAssessment {
            dimensions,
            normalized_scores,
            overall_score,
            confidence,
            strengths,
            weaknesses,
            label,
            reasoning,
        }
    }
}

/// Harmonic mean over confidences, skipping zero entries.
///
/// The harmonic mean punishes uneven confidence harder than the arithmetic
/// mean; zero entries (degraded dimensions) are excluded so one failure does
/// not zero out the composite confidence entirely.
fn harmonic_mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut reciprocal_sum = 0.0;
    let mut count = 0usize;
    for v in values {
        if v > 0.0 {
            reciprocal_sum += 1.0 / v;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        {
            count as f64 / reciprocal_sum
        }
    }
}

fn synthesize_reasoning(
    overall: f64,
    label: RatingLabel,
    strengths: &[Dimension],
    weaknesses: &[Dimension],
    confidence: f64,
    degraded: usize,
) -> String {
    let mut parts = vec![format!(
        "Overall {overall:.2}/10 ({}) at {confidence:.2} confidence.",
        label.as_str()
    )];
    if !strengths.is_empty() {
        parts.push(format!("Strengths: {}.", dimension_list(strengths)));
    }
    if !weaknesses.is_empty() {
        parts.push(format!("Weaknesses: {}.", dimension_list(weaknesses)));
    }
    if degraded > 0 {
        parts.push(format!(
            "{degraded} dimension(s) could not be scored and count as 0."
        ));
    }
    parts.join(" ")
}

fn dimension_list(dimensions: &[Dimension]) -> String {
    dimensions
        .iter()
        .map(|d| d.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}
