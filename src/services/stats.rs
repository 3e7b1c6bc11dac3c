//! Descriptive statistics over completed trial scores.
//!
//! Powers the results summary: per-group (tier, domain, model) distributions
//! of overall scores, with the usual spread measures.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::models::TrialRecord;

/// Descriptive summary of one score sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n-1 denominator); 0 for singleton samples
    pub std_dev: f64,
    /// Standard error of the mean
    pub sem: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    /// Coefficient of variation (std dev / mean); 0 when the mean is 0
    pub cv: f64,
}

impl ScoreSummary {
    /// Summarize a sample. Returns `None` for an empty sample.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        #[allow(clippy::cast_precision_loss)]
        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = if sorted.len() < 2 {
            0.0
        } else {
            sorted.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0)
        };
        let std_dev = variance.sqrt();

        Some(Self {
            count: sorted.len(),
            mean,
            median: percentile(&sorted, 0.5),
            std_dev,
            sem: std_dev / n.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            q1: percentile(&sorted, 0.25),
            q3: percentile(&sorted, 0.75),
            cv: if mean.abs() < f64::EPSILON {
                0.0
            } else {
                std_dev / mean
            },
        })
    }
}

/// Linear-interpolated percentile over a sorted sample.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let rank = p * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let weight = rank - rank.floor();
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Grouped summaries for one experiment's completed trials.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub overall: Option<ScoreSummary>,
    /// Keyed by tier name, in tier order by construction
    pub by_tier: BTreeMap<String, ScoreSummary>,
    pub by_domain: BTreeMap<String, ScoreSummary>,
    pub by_model: BTreeMap<String, ScoreSummary>,
}

impl ExperimentSummary {
    pub fn from_trials(trials: &[TrialRecord]) -> Self {
        let scores: Vec<f64> = trials.iter().map(|t| t.assessment.overall_score).collect();

        let mut by_tier: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut by_domain: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut by_model: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for trial in trials {
            let score = trial.assessment.overall_score;
            by_tier
                .entry(trial.tier.as_str().to_string())
                .or_default()
                .push(score);
            by_domain.entry(trial.domain.clone()).or_default().push(score);
            by_model
                .entry(trial.model_id.clone())
                .or_default()
                .push(score);
        }

        let summarize = |groups: BTreeMap<String, Vec<f64>>| {
            groups
                .into_iter()
                .filter_map(|(key, scores)| {
                    ScoreSummary::from_scores(&scores).map(|s| (key, s))
                })
                .collect()
        };

        Self {
            overall: ScoreSummary::from_scores(&scores),
            by_tier: summarize(by_tier),
            by_domain: summarize(by_domain),
            by_model: summarize(by_model),
        }
    }
}
