//! Scenario domain model.
//!
//! A scenario is one concrete trial specification: a (domain, tier,
//! repetition, model, tool configuration) tuple plus the task text an
//! agent under test will receive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse difficulty bucket used for queue priority and scoring benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Simple,
    Moderate,
    Complex,
}

impl Default for Tier {
    fn default() -> Self {
        Self::Moderate
    }
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "moderate" => Some(Self::Moderate),
            "complex" => Some(Self::Complex),
            _ => None,
        }
    }

    /// Queue priority for this tier. Lower values dequeue first, so simple
    /// trials drain ahead of moderate and complex ones.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Simple => 1,
            Self::Moderate => 2,
            Self::Complex => 3,
        }
    }

    /// Scaling factor fed into assessment prompts as a difficulty hint.
    pub fn complexity_factor(&self) -> f64 {
        match self {
            Self::Simple => 1.0,
            Self::Moderate => 1.5,
            Self::Complex => 2.0,
        }
    }

    /// Expected complexity-score range for scenarios in this tier,
    /// used by the built-in heuristic validator.
    pub fn complexity_bounds(&self) -> (f64, f64) {
        match self {
            Self::Simple => (1.0, 4.0),
            Self::Moderate => (3.0, 7.0),
            Self::Complex => (5.0, 10.0),
        }
    }
}

/// Auxiliary capabilities enabled for the agent under test in a trial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Stable identifier, e.g. "full-stack" or "baseline"
    pub id: String,
    /// Web search available
    #[serde(default)]
    pub web_search: bool,
    /// Code execution sandbox available
    #[serde(default)]
    pub code_execution: bool,
    /// Persistent memory tools available
    #[serde(default)]
    pub memory_tools: bool,
    /// File read/write access available
    #[serde(default)]
    pub file_access: bool,
}

impl ToolConfig {
    /// Prefix used in scenario identifiers (first 8 characters of the id).
    pub fn id_prefix(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map_or(self.id.len(), |(i, _)| i);
        &self.id[..end]
    }
}

/// One weighted success criterion for a scenario's task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriterion {
    pub description: String,
    /// Relative weight in [0, 1]; criteria for one scenario sum to ~1.
    pub weight: f64,
}

/// Sub-metrics produced by complexity validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    /// Density of structural elements (criteria, requirements) in the task
    pub structural_complexity: f64,
    /// Density of numeric/quantitative content
    pub quantitative_density: f64,
    /// Richness of the surrounding business context
    pub context_richness: f64,
}

/// One concrete trial specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Deterministic identifier: `domain-tier-repetitionPadded-model-configPrefix`
    pub id: String,
    /// Experiment this scenario belongs to
    pub experiment_id: String,
    /// Task category (e.g. "analytical", "planning")
    pub domain: String,
    /// Difficulty bucket
    pub tier: Tier,
    /// Zero-based repetition index within (domain, tier)
    pub repetition: u32,
    /// Target model identifier
    pub model_id: String,
    /// Resolved tool configuration
    pub tool_config: ToolConfig,
    /// Short task title
    pub title: String,
    /// Full task description handed to the agent
    pub description: String,
    /// Business context surrounding the task
    pub business_context: String,
    /// Weighted success criteria
    pub success_criteria: Vec<SuccessCriterion>,
    /// Calculations a strong response is expected to perform
    pub expected_calculations: Vec<String>,
    /// Insights a strong response is expected to surface
    pub expected_insights: Vec<String>,
    /// Hard requirements on the response
    pub requirements: Vec<String>,
    /// Optional data elements the agent may use
    pub optional_data: Vec<String>,
    /// Complexity score assigned by validation
    pub complexity_score: f64,
    /// Sub-metrics from validation
    pub complexity_metrics: ComplexityMetrics,
    /// Flipped exactly once, after a trial row is durably persisted
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scenario {
    /// Build the deterministic scenario identifier for a matrix cell.
    ///
    /// The repetition index is zero-padded to two digits so identifiers sort
    /// lexicographically in generation order.
    pub fn build_id(
        domain: &str,
        tier: Tier,
        repetition: u32,
        model_id: &str,
        tool_config: &ToolConfig,
    ) -> String {
        format!(
            "{}-{}-{:02}-{}-{}",
            domain,
            tier.as_str(),
            repetition,
            model_id,
            tool_config.id_prefix()
        )
    }
}

/// Experiment configuration: the axes of the scenario matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Human-readable experiment name
    #[serde(default)]
    pub name: String,
    /// Task domains to cover
    pub domains: Vec<String>,
    /// Difficulty tiers to cover
    pub tiers: Vec<Tier>,
    /// Repetitions per (domain, tier, model, tool config) cell
    pub repetitions: u32,
    /// Target model identifiers
    pub models: Vec<String>,
    /// Tool configurations to cover
    pub tool_configs: Vec<ToolConfig>,
}

impl ExperimentConfig {
    /// Size of the full Cartesian expansion.
    pub fn total_trials(&self) -> usize {
        self.domains.len()
            * self.tiers.len()
            * self.repetitions as usize
            * self.models.len()
            * self.tool_configs.len()
    }

    /// Basic sanity checks before generation.
    pub fn validate(&self) -> Result<(), String> {
        if self.domains.is_empty() {
            return Err("experiment requires at least one domain".to_string());
        }
        if self.tiers.is_empty() {
            return Err("experiment requires at least one tier".to_string());
        }
        if self.repetitions == 0 {
            return Err("repetitions must be at least 1".to_string());
        }
        if self.models.is_empty() {
            return Err("experiment requires at least one model".to_string());
        }
        if self.tool_configs.is_empty() {
            return Err("experiment requires at least one tool configuration".to_string());
        }
        Ok(())
    }
}
