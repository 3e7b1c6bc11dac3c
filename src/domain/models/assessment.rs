//! Assessment domain models.
//!
//! Nine quality dimensions are scored per trial. Each dimension holds six
//! component scores on a 1-5 scale; the composite boundary is the only place
//! where scores are normalized to 0-10.

use serde::{Deserialize, Serialize};

/// The nine quality dimensions scored for every trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    CognitiveLoad,
    ToolExecution,
    ContentQuality,
    MemoryIntegration,
    ComplexityHandling,
    HallucinationControl,
    KnowledgeTransfer,
    ProcessingEfficiency,
    ConstructValidity,
}

impl Dimension {
    /// All dimensions in canonical order.
    pub const ALL: [Dimension; 9] = [
        Self::CognitiveLoad,
        Self::ToolExecution,
        Self::ContentQuality,
        Self::MemoryIntegration,
        Self::ComplexityHandling,
        Self::HallucinationControl,
        Self::KnowledgeTransfer,
        Self::ProcessingEfficiency,
        Self::ConstructValidity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CognitiveLoad => "cognitive_load",
            Self::ToolExecution => "tool_execution",
            Self::ContentQuality => "content_quality",
            Self::MemoryIntegration => "memory_integration",
            Self::ComplexityHandling => "complexity_handling",
            Self::HallucinationControl => "hallucination_control",
            Self::KnowledgeTransfer => "knowledge_transfer",
            Self::ProcessingEfficiency => "processing_efficiency",
            Self::ConstructValidity => "construct_validity",
        }
    }

    /// Human-readable name for synthesis text and tables.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CognitiveLoad => "Cognitive Load Management",
            Self::ToolExecution => "Tool Execution",
            Self::ContentQuality => "Content Quality",
            Self::MemoryIntegration => "Memory Integration",
            Self::ComplexityHandling => "Complexity Handling",
            Self::HallucinationControl => "Hallucination Control",
            Self::KnowledgeTransfer => "Knowledge Transfer",
            Self::ProcessingEfficiency => "Processing Efficiency",
            Self::ConstructValidity => "Construct Validity",
        }
    }
}

/// Result of scoring one dimension.
///
/// Component and dimension scores live on a 1-5 scale. A score of 0 is the
/// degraded marker used when the scoring oracle failed for this dimension;
/// degraded assessments always carry zero confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionAssessment {
    pub dimension: Dimension,
    /// Exactly six component scores, each 1-5 (0 only when degraded)
    pub component_scores: [u8; 6],
    /// Rounded mean of the six components, 1-5 (0 only when degraded)
    pub score: u8,
    /// Reliability estimate in [0, 1]
    pub confidence: f64,
    /// Free-text observations from the oracle, or the failure note
    pub observations: String,
}

impl DimensionAssessment {
    /// Degraded assessment substituted when scoring fails. Zero score, zero
    /// confidence, note explaining what went wrong.
    pub fn degraded(dimension: Dimension, note: impl Into<String>) -> Self {
        Self {
            dimension,
            component_scores: [0; 6],
            score: 0,
            confidence: 0.0,
            observations: note.into(),
        }
    }

    /// Whether this assessment is the degraded fallback.
    pub fn is_degraded(&self) -> bool {
        self.score == 0
    }

    /// Normalize the 1-5 dimension score onto the 0-10 composite scale.
    ///
    /// 1 maps to 0.0, 3 to 5.0, 5 to 10.0. Degraded assessments map to 0.0.
    pub fn normalized(&self) -> f64 {
        if self.is_degraded() {
            return 0.0;
        }
        (f64::from(self.score) - 1.0) / 4.0 * 10.0
    }
}

/// Qualitative label derived from the overall 0-10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingLabel {
    Exceptional,
    Excellent,
    Good,
    Satisfactory,
    Adequate,
    BelowExpectations,
    NeedsImprovement,
}

impl RatingLabel {
    /// Map an overall score (0-10) onto its label band.
    pub fn from_overall(overall: f64) -> Self {
        if overall >= 9.5 {
            Self::Exceptional
        } else if overall >= 8.5 {
            Self::Excellent
        } else if overall >= 7.5 {
            Self::Good
        } else if overall >= 6.5 {
            Self::Satisfactory
        } else if overall >= 5.5 {
            Self::Adequate
        } else if overall >= 4.0 {
            Self::BelowExpectations
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exceptional => "Exceptional",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Satisfactory => "Satisfactory",
            Self::Adequate => "Adequate",
            Self::BelowExpectations => "Below Expectations",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Normalized score for one dimension at the composite boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedScore {
    pub dimension: Dimension,
    /// 0-10 scale
    pub score: f64,
}

impl NormalizedScore {
    /// Scores at or above 7.5 count as strengths in the composite summary.
    pub fn is_strength(&self) -> bool {
        self.score >= 7.5
    }

    /// Scores below 5.0 count as weaknesses in the composite summary.
    pub fn is_weakness(&self) -> bool {
        self.score < 5.0
    }
}

/// Composite result of all nine dimension assessments for one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeAssessment {
    /// The nine assessments in canonical dimension order
    pub dimensions: Vec<DimensionAssessment>,
    /// Normalized (0-10) score per dimension
    pub normalized_scores: Vec<NormalizedScore>,
    /// Unweighted mean of the nine normalized scores, 0-10
    pub overall_score: f64,
    /// Harmonic mean of non-zero per-dimension confidences, [0, 1]
    pub confidence: f64,
    /// Dimensions scoring >= 7.5 normalized
    pub strengths: Vec<Dimension>,
    /// Dimensions scoring < 5.0 normalized
    pub weaknesses: Vec<Dimension>,
    /// Qualitative label from the overall score
    pub label: RatingLabel,
    /// Short synthesized reasoning text
    pub reasoning: String,
}

impl CompositeAssessment {
    /// Look up one dimension's assessment.
    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionAssessment> {
        self.dimensions.iter().find(|a| a.dimension == dimension)
    }
}
