//! Dimension assessor: wraps one scoring-oracle call per quality dimension.
//!
//! `assess` never fails. Malformed oracle output is repaired where possible
//! and degraded to a zero-score, zero-confidence assessment otherwise, so a
//! single dimension's failure never aborts the surrounding trial.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::models::{
    CognitiveResponse, Dimension, DimensionAssessment, SuccessCriterion, Tier,
};
use crate::domain::ports::oracle::{OracleReply, OracleRequest, ScoringOracle};

/// Everything an assessor needs to score one trial response.
#[derive(Debug, Clone, Copy)]
pub struct AssessmentContext<'a> {
    pub response: &'a CognitiveResponse,
    pub success_criteria: &'a [SuccessCriterion],
    pub tier: Tier,
    pub domain: &'a str,
}

/// Oracle output after shape validation, before repair.
#[derive(Debug, Deserialize)]
struct ParsedAssessment {
    #[serde(default, alias = "components")]
    component_scores: Option<Vec<f64>>,
    #[serde(alias = "dimension_score")]
    score: f64,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    observations: String,
}

/// Scores one quality dimension via the external oracle.
///
/// The rubric prompt is built once at construction; the assessor holds no
/// other state and is safe to share across workers.
pub struct DimensionAssessor {
    dimension: Dimension,
    oracle: Arc<dyn ScoringOracle>,
    system_prompt: String,
}

impl DimensionAssessor {
    pub fn new(dimension: Dimension, oracle: Arc<dyn ScoringOracle>) -> Self {
        Self {
            dimension,
            oracle,
            system_prompt: build_system_prompt(dimension),
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Score one response along this assessor's dimension. Never fails:
    /// oracle and parse errors degrade to a zero-confidence assessment.
    pub async fn assess(&self, ctx: &AssessmentContext<'_>) -> DimensionAssessment {
        let request = OracleRequest {
            system_prompt: self.system_prompt.clone(),
            user_message: build_user_message(ctx),
            output_shape: OUTPUT_SHAPE.to_string(),
        };

        let reply = match self.oracle.invoke(request).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(dimension = self.dimension.as_str(), error = %err, "scoring call failed");
                return DimensionAssessment::degraded(
                    self.dimension,
                    format!("scoring call failed: {err}"),
                );
            }
        };

        match parse_reply(&reply) {
            Ok(parsed) => self.repair(parsed),
            Err(reason) => {
                warn!(dimension = self.dimension.as_str(), %reason, "unparseable oracle output");
                DimensionAssessment::degraded(
                    self.dimension,
                    format!("unparseable oracle output: {reason}"),
                )
            }
        }
    }

    /// Clamp, backfill, and sanity-check a parsed oracle result.
    fn repair(&self, parsed: ParsedAssessment) -> DimensionAssessment {
        let oracle_score = parsed.score.clamp(1.0, 5.0);

        // If the oracle omitted per-component detail, synthesize six
        // identical placeholders from the overall score instead of failing.
        let raw_components = match parsed.component_scores {
            Some(components) if components.len() == 6 => components,
            _ => vec![oracle_score; 6],
        };
        let mut component_scores = [0u8; 6];
        for (slot, raw) in component_scores.iter_mut().zip(&raw_components) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                *slot = raw.clamp(1.0, 5.0).round() as u8;
            }
        }

        // Consistency check against oracle drift: recompute the dimension
        // score from the components and prefer it when the self-reported
        // value strays by more than 0.5.
        let component_sum: u32 = component_scores.iter().map(|&c| u32::from(c)).sum();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let recomputed = (f64::from(component_sum) / 6.0).round().clamp(1.0, 5.0) as u8;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = if (f64::from(recomputed) - oracle_score).abs() > 0.5 {
            debug!(
                dimension = self.dimension.as_str(),
                oracle_score, recomputed, "preferring recomputed dimension score"
            );
            recomputed
        } else {
            oracle_score.round().clamp(1.0, 5.0) as u8
        };

        let confidence = parsed
            .confidence
            .map_or_else(|| confidence_from_spread(&component_scores), |c| c)
            .clamp(0.0, 1.0);

        DimensionAssessment {
            dimension: self.dimension,
            component_scores,
            score,
            confidence,
            observations: parsed.observations,
        }
    }
}

const OUTPUT_SHAPE: &str = "Respond with a single JSON object: \
{\"component_scores\": [six integers 1-5], \"score\": <overall 1-5>, \
\"confidence\": <0.0-1.0>, \"observations\": \"<short free text>\"}";

fn build_system_prompt(dimension: Dimension) -> String {
    let focus = match dimension {
        Dimension::CognitiveLoad => {
            "how well the response manages task load: prioritization, decomposition, \
             and avoidance of tangents"
        }
        Dimension::ToolExecution => {
            "whether auxiliary tools were invoked appropriately, effectively, and \
             with their outputs integrated into the answer"
        }
        Dimension::ContentQuality => {
            "accuracy, completeness, and organization of the response content"
        }
        Dimension::MemoryIntegration => {
            "use of provided context and consistency with earlier stated facts"
        }
        Dimension::ComplexityHandling => {
            "whether the response matches the intrinsic difficulty of the task \
             without oversimplifying or overcomplicating"
        }
        Dimension::HallucinationControl => {
            "absence of fabricated figures, sources, or capabilities"
        }
        Dimension::KnowledgeTransfer => {
            "how clearly the reasoning and conclusions are communicated to the reader"
        }
        Dimension::ProcessingEfficiency => {
            "conciseness and directness relative to the work the task requires"
        }
        Dimension::ConstructValidity => {
            "whether the response actually addresses the task as specified, \
             criterion by criterion"
        }
    };
    format!(
        "You are an evaluation judge scoring one quality dimension of an AI agent's \
         response: {}. Assess {focus}. Score six components from 1 (poor) to 5 \
         (excellent) and report an overall dimension score with a confidence estimate.",
        dimension.display_name()
    )
}

fn build_user_message(ctx: &AssessmentContext<'_>) -> String {
    let criteria = ctx
        .success_criteria
        .iter()
        .map(|c| format!("- ({:.2}) {}", c.weight, c.description))
        .collect::<Vec<_>>()
        .join("\n");
    let metadata = &ctx.response.metadata;

    format!(
        "Domain: {domain}\nTier: {tier} (complexity factor {factor:.1})\n\
         Approximate factual claims: {claims}\n\
         Tools invoked: {tools} | Reasoning cycles: {cycles} | Memory ops: {mem} | \
         Processing: {ms} ms | Words: {words}\n\n\
         Success criteria:\n{criteria}\n\nResponse to score:\n{content}",
        domain = ctx.domain,
        tier = ctx.tier.as_str(),
        factor = ctx.tier.complexity_factor(),
        claims = approximate_claim_count(&ctx.response.content),
        tools = metadata.tool_invocation_count(),
        cycles = metadata.reasoning_cycles,
        mem = metadata.memory_operations,
        ms = metadata.processing_time_ms,
        words = metadata.word_count,
        content = ctx.response.content,
    )
}

/// Coarse factual-claim estimate: sentences with at least three words.
fn approximate_claim_count(content: &str) -> usize {
    content
        .split(['.', '!', '?'])
        .filter(|sentence| sentence.split_whitespace().count() >= 3)
        .count()
}

/// Fallback confidence when the oracle omits one: tight component spread
/// reads as high confidence, wide spread as low.
fn confidence_from_spread(components: &[u8; 6]) -> f64 {
    let mean = f64::from(components.iter().map(|&c| u32::from(c)).sum::<u32>()) / 6.0;
    let variance = components
        .iter()
        .map(|&c| (f64::from(c) - mean).powi(2))
        .sum::<f64>()
        / 6.0;
    (1.0 - variance / 4.0).clamp(0.1, 1.0)
}

/// Parse an oracle reply into the expected shape.
///
/// Text replies are scanned for an embedded JSON object; everything else is
/// an explicit parse error, never a panic.
fn parse_reply(reply: &OracleReply) -> Result<ParsedAssessment, String> {
    let value = match reply {
        OracleReply::Structured(value) => value.clone(),
        OracleReply::Text(text) => {
            let start = text.find('{').ok_or("no JSON object in text reply")?;
            let end = text.rfind('}').ok_or("unterminated JSON object in text reply")?;
            if end < start {
                return Err("malformed JSON object in text reply".to_string());
            }
            serde_json::from_str(&text[start..=end]).map_err(|e| e.to_string())?
        }
    };
    serde_json::from_value(value).map_err(|e| e.to_string())
}
