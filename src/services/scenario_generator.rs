//! Scenario generation: Cartesian expansion of an experiment configuration.
//!
//! One scenario per (domain, tier, repetition, model, tool configuration)
//! tuple, with deterministic identifiers and a small deterministic numeric
//! variation so repeated trials are not byte-identical prompts.

use chrono::Utc;

use crate::domain::models::{
    ComplexityMetrics, ExperimentConfig, Scenario, SuccessCriterion, Tier,
};

/// Task template for one (domain, tier) cell.
struct TaskTemplate {
    title: String,
    description: String,
    business_context: String,
    success_criteria: Vec<SuccessCriterion>,
    expected_calculations: Vec<String>,
    expected_insights: Vec<String>,
    requirements: Vec<String>,
    optional_data: Vec<String>,
}

/// Stateless scenario generator.
pub struct ScenarioGenerator;

impl ScenarioGenerator {
    /// Expand the full scenario matrix for an experiment.
    ///
    /// Identifiers are unique across the matrix by construction; numeric
    /// tokens in the task text are scaled per repetition so an evaluating
    /// LLM cannot memorize a fixed prompt.
    pub fn generate(
        experiment_id: &str,
        config: &ExperimentConfig,
    ) -> Result<Vec<Scenario>, String> {
        config.validate()?;

        let now = Utc::now();
        let mut scenarios = Vec::with_capacity(config.total_trials());

        for domain in &config.domains {
            for &tier in &config.tiers {
                for repetition in 0..config.repetitions {
                    for model in &config.models {
                        for tool_config in &config.tool_configs {
                            let template = template_for(domain, tier);
                            let factor = variation_factor(repetition);
                            scenarios.push(Scenario {
                                id: Scenario::build_id(
                                    domain,
                                    tier,
                                    repetition,
                                    model,
                                    tool_config,
                                ),
                                experiment_id: experiment_id.to_string(),
                                domain: domain.clone(),
                                tier,
                                repetition,
                                model_id: model.clone(),
                                tool_config: tool_config.clone(),
                                title: template.title,
                                description: scale_numeric_tokens(
                                    &template.description,
                                    factor,
                                ),
                                business_context: scale_numeric_tokens(
                                    &template.business_context,
                                    factor,
                                ),
                                success_criteria: template.success_criteria,
                                expected_calculations: template.expected_calculations,
                                expected_insights: template.expected_insights,
                                requirements: template.requirements,
                                optional_data: template.optional_data,
                                complexity_score: 0.0,
                                complexity_metrics: ComplexityMetrics::default(),
                                completed: false,
                                created_at: now,
                                updated_at: now,
                            });
                        }
                    }
                }
            }
        }

        Ok(scenarios)
    }
}

/// Deterministic scale factor for a repetition: `1 + (rep mod 10) * 0.1`.
fn variation_factor(repetition: u32) -> f64 {
    1.0 + f64::from(repetition % 10) * 0.1
}

/// Scale explicit numeric and currency tokens in a text by `factor`.
///
/// Cosmetic variation only: the task structure and success criteria are
/// untouched. A token qualifies when, after stripping a leading `$` and a
/// trailing `%`/punctuation character, the remainder parses as a number.
fn scale_numeric_tokens(text: &str, factor: f64) -> String {
    text.split(' ')
        .map(|token| scale_token(token, factor))
        .collect::<Vec<_>>()
        .join(" ")
}

fn scale_token(token: &str, factor: f64) -> String {
    let (prefix, rest) = match token.strip_prefix('$') {
        Some(rest) => ("$", rest),
        None => ("", token),
    };
    let (core, suffix) = match rest.char_indices().last() {
        Some((i, c)) if c == '%' || c == ',' || c == '.' || c == ';' || c == ')' => {
            (&rest[..i], &rest[i..])
        }
        _ => (rest, ""),
    };

    let cleaned = core.replace(',', "");
    let Ok(value) = cleaned.parse::<f64>() else {
        return token.to_string();
    };

    let scaled = value * factor;
    let formatted = if (scaled - scaled.round()).abs() < 1e-9 {
        format!("{}", scaled.round() as i64)
    } else {
        format!("{scaled:.1}")
    };
    format!("{prefix}{formatted}{suffix}")
}

/// Built-in template catalog for the four stock domains. Unknown domains get
/// a generic analytical-style template so generation never fails.
fn template_for(domain: &str, tier: Tier) -> TaskTemplate {
    let depth = match tier {
        Tier::Simple => "a first-pass summary",
        Tier::Moderate => "a detailed breakdown with supporting figures",
        Tier::Complex => "a comprehensive analysis with scenario comparisons",
    };

    match domain {
        "planning" => TaskTemplate {
            title: format!("Quarterly capacity plan ({})", tier.as_str()),
            description: format!(
                "Draft a staffing and capacity plan for the next quarter, producing {depth}. \
                 The team currently handles 1200 tickets per month with 14 engineers, and \
                 volume is forecast to grow 15 % next quarter. Average resolution time is \
                 45 minutes per ticket. Recommend headcount and highlight bottlenecks."
            ),
            business_context: "Support operations for a B2B software vendor with a $40000 \
                               monthly staffing budget and a contractual 24-hour response SLA."
                .to_string(),
            success_criteria: vec![
                criterion("Headcount recommendation is justified numerically", 0.35),
                criterion("Forecast growth is incorporated into the plan", 0.25),
                criterion("Bottlenecks and risks are identified", 0.2),
                criterion("Plan stays within budget constraints", 0.2),
            ],
            expected_calculations: vec![
                "Projected monthly ticket volume after growth".to_string(),
                "Engineer-hours required at current resolution time".to_string(),
            ],
            expected_insights: vec![
                "Whether current staffing absorbs the forecast growth".to_string(),
            ],
            requirements: vec![
                "State all assumptions explicitly".to_string(),
                "Provide a single concrete headcount number".to_string(),
            ],
            optional_data: vec!["Historical seasonality of ticket volume".to_string()],
        },
        "communication" => TaskTemplate {
            title: format!("Incident postmortem briefing ({})", tier.as_str()),
            description: format!(
                "Write an executive briefing about a service outage, producing {depth}. \
                 The outage lasted 95 minutes, affected 18000 customers, and an estimated \
                 $25000 of transactions failed. Explain impact, root cause themes, and \
                 three remediation commitments in language suitable for non-engineers."
            ),
            business_context: "A payments platform reporting to enterprise customers after \
                               its second outage this year; trust is strained."
                .to_string(),
            success_criteria: vec![
                criterion("Impact is quantified accurately", 0.3),
                criterion("Tone is appropriate for an executive audience", 0.3),
                criterion("Remediation commitments are concrete", 0.25),
                criterion("No unexplained jargon", 0.15),
            ],
            expected_calculations: vec!["Failed-transaction value per minute".to_string()],
            expected_insights: vec![
                "Why repeat outages compound reputational damage".to_string(),
            ],
            requirements: vec![
                "Keep the briefing under one page".to_string(),
                "Include exactly three remediation commitments".to_string(),
            ],
            optional_data: vec!["Customer churn figures from the previous outage".to_string()],
        },
        "problem-solving" => TaskTemplate {
            title: format!("Warehouse routing optimization ({})", tier.as_str()),
            description: format!(
                "Devise an approach to cut order-picking travel time, producing {depth}. \
                 Pickers walk an average of 12 km per shift across 3 zones, fulfilling \
                 850 orders per day. Management wants travel reduced by 20 % without new \
                 hardware. Propose and justify a zoning or batching strategy."
            ),
            business_context: "A mid-size e-commerce fulfilment center with a $15000 \
                               process-improvement budget and fixed shift patterns."
                .to_string(),
            success_criteria: vec![
                criterion("Proposal plausibly achieves the reduction target", 0.35),
                criterion("Trade-offs of the chosen strategy are analyzed", 0.25),
                criterion("No reliance on excluded hardware purchases", 0.2),
                criterion("Implementation steps are actionable", 0.2),
            ],
            expected_calculations: vec![
                "Travel distance saved per shift under the proposal".to_string(),
                "Orders per picker-hour before and after".to_string(),
            ],
            expected_insights: vec![
                "Which zone contributes most of the excess travel".to_string(),
            ],
            requirements: vec!["Quantify the expected improvement".to_string()],
            optional_data: vec!["Zone-level pick density heatmap".to_string()],
        },
        // "analytical" and anything unrecognized
        _ => TaskTemplate {
            title: format!("Revenue trend analysis ({})", tier.as_str()),
            description: format!(
                "Analyze the revenue figures below and produce {depth}. Q1 revenue was \
                 $125000, Q2 reached $148000, and Q3 closed at $132000. Marketing spend \
                 was $18000 per quarter and the customer base grew 8 % over the period. \
                 Identify the drivers behind the Q3 decline and project Q4."
            ),
            business_context: "A subscription analytics company preparing its board review; \
                               the board expects quantified drivers, not narrative."
                .to_string(),
            success_criteria: vec![
                criterion("Quarter-over-quarter changes computed correctly", 0.3),
                criterion("Q3 decline drivers identified and ranked", 0.3),
                criterion("Q4 projection with stated method", 0.25),
                criterion("Conclusions tie back to the data", 0.15),
            ],
            expected_calculations: vec![
                "Q2 and Q3 growth rates".to_string(),
                "Revenue per marketing dollar by quarter".to_string(),
            ],
            expected_insights: vec![
                "Whether customer growth offsets the revenue dip".to_string(),
            ],
            requirements: vec![
                "Show intermediate calculations".to_string(),
                "Give one quantified Q4 projection".to_string(),
            ],
            optional_data: vec!["Churn rate by quarter".to_string()],
        },
    }
}

fn criterion(description: &str, weight: f64) -> SuccessCriterion {
    SuccessCriterion {
        description: description.to_string(),
        weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ToolConfig;
    use std::collections::HashSet;

    fn config() -> ExperimentConfig {
        ExperimentConfig {
            name: "matrix".to_string(),
            domains: vec!["analytical".into(), "planning".into()],
            tiers: vec![Tier::Simple, Tier::Complex],
            repetitions: 2,
            models: vec!["sonnet".into()],
            tool_configs: vec![ToolConfig {
                id: "baseline".to_string(),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_matrix_cardinality_and_unique_ids() {
        let scenarios = ScenarioGenerator::generate("exp-1", &config()).unwrap();
        assert_eq!(scenarios.len(), 8);

        let ids: HashSet<&str> = scenarios.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 8, "scenario identifiers must be unique");
    }

    #[test]
    fn test_repetition_zero_is_unscaled() {
        let scenarios = ScenarioGenerator::generate("exp-1", &config()).unwrap();
        let rep0 = scenarios
            .iter()
            .find(|s| s.domain == "analytical" && s.repetition == 0 && s.tier == Tier::Simple)
            .unwrap();
        assert!(rep0.description.contains("$125000"));
    }

    #[test]
    fn test_repetition_scales_numeric_tokens() {
        let scenarios = ScenarioGenerator::generate("exp-1", &config()).unwrap();
        let rep1 = scenarios
            .iter()
            .find(|s| s.domain == "analytical" && s.repetition == 1 && s.tier == Tier::Simple)
            .unwrap();
        // 125000 * 1.1 = 137500
        assert!(rep1.description.contains("$137500"));
        // Success criteria are structural and must not vary
        let rep0 = scenarios
            .iter()
            .find(|s| s.domain == "analytical" && s.repetition == 0 && s.tier == Tier::Simple)
            .unwrap();
        assert_eq!(rep0.success_criteria, rep1.success_criteria);
    }

    #[test]
    fn test_variation_factor_wraps_at_ten() {
        assert!((variation_factor(0) - 1.0).abs() < f64::EPSILON);
        assert!((variation_factor(3) - 1.3).abs() < f64::EPSILON);
        assert!((variation_factor(10) - 1.0).abs() < f64::EPSILON);
        assert!((variation_factor(12) - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scale_token_currency_and_percent() {
        assert_eq!(scale_token("$100", 1.5), "$150");
        assert_eq!(scale_token("20", 1.1), "22");
        assert_eq!(scale_token("hello", 1.5), "hello");
        assert_eq!(scale_token("95", 1.2), "114");
        // Trailing punctuation preserved
        assert_eq!(scale_token("$25000.", 1.0), "$25000.");
    }

    #[test]
    fn test_non_numeric_text_untouched() {
        let text = "Recommend headcount and highlight bottlenecks.";
        assert_eq!(scale_numeric_tokens(text, 1.7), text);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = config();
        bad.models.clear();
        assert!(ScenarioGenerator::generate("exp-1", &bad).is_err());
    }
}
