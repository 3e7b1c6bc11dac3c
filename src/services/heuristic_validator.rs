//! Built-in heuristic complexity validator.
//!
//! Deterministic, dependency-free implementation of the `ComplexityValidator`
//! port so the harness is runnable without an external validation service.
//! Scores are derived from structural density (criteria, requirements,
//! calculations), quantitative density, and context richness, then scaled by
//! the tier's complexity factor and checked against the tier's bounds.

use async_trait::async_trait;

use crate::domain::models::{ComplexityMetrics, Scenario};
use crate::domain::ports::validator::{ComplexityValidator, ComplexityVerdict, ValidatorError};

/// Minimum words a task description needs to be assessable.
const MIN_DESCRIPTION_WORDS: usize = 20;

/// Heuristic validator over scenario content.
#[derive(Debug, Default, Clone)]
pub struct HeuristicComplexityValidator;

impl HeuristicComplexityValidator {
    pub fn new() -> Self {
        Self
    }

    fn score(scenario: &Scenario) -> (f64, ComplexityMetrics) {
        let description_words = scenario.description.split_whitespace().count();
        let context_words = scenario.business_context.split_whitespace().count();
        let total_words = (description_words + context_words).max(1);

        let structural = scenario.success_criteria.len()
            + scenario.requirements.len()
            + scenario.expected_calculations.len();
        let numeric_tokens = scenario
            .description
            .split_whitespace()
            .chain(scenario.business_context.split_whitespace())
            .filter(|token| is_numeric_token(token))
            .count();

        #[allow(clippy::cast_precision_loss)]
        let metrics = ComplexityMetrics {
            structural_complexity: (structural as f64 / 12.0 * 10.0).min(10.0),
            quantitative_density: (numeric_tokens as f64 / total_words as f64 * 100.0).min(10.0),
            context_richness: (context_words as f64 / 40.0 * 10.0).min(10.0),
        };

        let base = (1.5
            + metrics.structural_complexity / 8.0
            + metrics.quantitative_density / 20.0
            + metrics.context_richness / 20.0)
            .clamp(1.0, 3.5);
        let score = scenario.tier.complexity_factor() * base;

        (score, metrics)
    }
}

fn is_numeric_token(token: &str) -> bool {
    let stripped = token
        .trim_start_matches('$')
        .trim_end_matches(['%', ',', '.', ';', ')'])
        .replace(',', "");
    !stripped.is_empty() && stripped.parse::<f64>().is_ok()
}

#[async_trait]
impl ComplexityValidator for HeuristicComplexityValidator {
    async fn validate(&self, scenario: &Scenario) -> Result<ComplexityVerdict, ValidatorError> {
        let mut rejection_reasons = Vec::new();

        let description_words = scenario.description.split_whitespace().count();
        if description_words < MIN_DESCRIPTION_WORDS {
            rejection_reasons.push(format!(
                "task description too short: {description_words} words (minimum {MIN_DESCRIPTION_WORDS})"
            ));
        }

        if scenario.success_criteria.is_empty() {
            rejection_reasons.push("scenario has no success criteria".to_string());
        } else {
            let weight_sum: f64 = scenario.success_criteria.iter().map(|c| c.weight).sum();
            if !(0.5..=1.5).contains(&weight_sum) {
                rejection_reasons.push(format!(
                    "success criterion weights sum to {weight_sum:.2}, expected ~1.0"
                ));
            }
        }

        let (complexity_score, sub_metrics) = Self::score(scenario);
        let (min, max) = scenario.tier.complexity_bounds();
        if rejection_reasons.is_empty() && !(min..=max).contains(&complexity_score) {
            rejection_reasons.push(format!(
                "complexity score {complexity_score:.2} outside [{min:.1}, {max:.1}] for tier {}",
                scenario.tier.as_str()
            ));
        }

        Ok(ComplexityVerdict {
            is_valid: rejection_reasons.is_empty(),
            complexity_score,
            sub_metrics,
            rejection_reasons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ExperimentConfig, Tier, ToolConfig};
    use crate::services::scenario_generator::ScenarioGenerator;

    fn generated_scenarios() -> Vec<Scenario> {
        let config = ExperimentConfig {
            name: String::new(),
            domains: vec![
                "analytical".into(),
                "planning".into(),
                "communication".into(),
                "problem-solving".into(),
            ],
            tiers: vec![Tier::Simple, Tier::Moderate, Tier::Complex],
            repetitions: 1,
            models: vec!["sonnet".into()],
            tool_configs: vec![ToolConfig {
                id: "baseline".to_string(),
                ..Default::default()
            }],
        };
        ScenarioGenerator::generate("exp", &config).unwrap()
    }

    #[tokio::test]
    async fn test_builtin_templates_all_pass() {
        let validator = HeuristicComplexityValidator::new();
        for scenario in generated_scenarios() {
            let verdict = validator.validate(&scenario).await.unwrap();
            assert!(
                verdict.is_valid,
                "scenario {} rejected: {:?}",
                scenario.id, verdict.rejection_reasons
            );
            assert!(verdict.complexity_score > 0.0);
        }
    }

    #[tokio::test]
    async fn test_empty_criteria_rejected() {
        let validator = HeuristicComplexityValidator::new();
        let mut scenario = generated_scenarios().remove(0);
        scenario.success_criteria.clear();

        let verdict = validator.validate(&scenario).await.unwrap();
        assert!(!verdict.is_valid);
        assert!(verdict
            .rejection_reasons
            .iter()
            .any(|r| r.contains("no success criteria")));
    }

    #[tokio::test]
    async fn test_short_description_rejected() {
        let validator = HeuristicComplexityValidator::new();
        let mut scenario = generated_scenarios().remove(0);
        scenario.description = "do the thing".to_string();

        let verdict = validator.validate(&scenario).await.unwrap();
        assert!(!verdict.is_valid);
    }

    #[tokio::test]
    async fn test_complexity_scales_with_tier() {
        let validator = HeuristicComplexityValidator::new();
        let scenarios = generated_scenarios();
        let simple = scenarios
            .iter()
            .find(|s| s.domain == "analytical" && s.tier == Tier::Simple)
            .unwrap();
        let complex = scenarios
            .iter()
            .find(|s| s.domain == "analytical" && s.tier == Tier::Complex)
            .unwrap();

        let simple_verdict = validator.validate(simple).await.unwrap();
        let complex_verdict = validator.validate(complex).await.unwrap();
        assert!(complex_verdict.complexity_score > simple_verdict.complexity_score);
    }
}
