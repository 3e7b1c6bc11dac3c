//! Table rendering for CLI output.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};

use crate::domain::models::{ExperimentStatus, TrialRecord};
use crate::services::stats::{ExperimentSummary, ScoreSummary};

pub fn format_trials_table(trials: &[TrialRecord]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Scenario", "Domain", "Tier", "Model", "Overall", "Confidence", "Label", "Attempts",
        ]);
    for trial in trials {
        table.add_row(vec![
            Cell::new(&trial.scenario_id),
            Cell::new(&trial.domain),
            Cell::new(trial.tier.as_str()),
            Cell::new(&trial.model_id),
            Cell::new(format!("{:.2}", trial.assessment.overall_score)),
            Cell::new(format!("{:.2}", trial.assessment.confidence)),
            Cell::new(trial.assessment.label.as_str()),
            Cell::new(trial.attempts_made),
        ]);
    }
    table.to_string()
}

pub fn format_summary_table(summary: &ExperimentSummary) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Group", "N", "Mean", "Median", "Std", "SEM", "Min", "Max", "CV",
        ]);
    if let Some(overall) = &summary.overall {
        add_summary_row(&mut table, "all", overall);
    }
    for (tier, s) in &summary.by_tier {
        add_summary_row(&mut table, &format!("tier:{tier}"), s);
    }
    for (domain, s) in &summary.by_domain {
        add_summary_row(&mut table, &format!("domain:{domain}"), s);
    }
    for (model, s) in &summary.by_model {
        add_summary_row(&mut table, &format!("model:{model}"), s);
    }
    table.to_string()
}

fn add_summary_row(table: &mut Table, group: &str, s: &ScoreSummary) {
    table.add_row(vec![
        Cell::new(group),
        Cell::new(s.count),
        Cell::new(format!("{:.2}", s.mean)),
        Cell::new(format!("{:.2}", s.median)),
        Cell::new(format!("{:.2}", s.std_dev)),
        Cell::new(format!("{:.2}", s.sem)),
        Cell::new(format!("{:.2}", s.min)),
        Cell::new(format!("{:.2}", s.max)),
        Cell::new(format!("{:.2}", s.cv)),
    ]);
}

pub fn format_status_table(status: &ExperimentStatus) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec![
            "Experiment", "Total", "Completed", "Waiting", "Active", "Failed", "Progress",
        ])
        .add_row(vec![
            Cell::new(&status.experiment_id),
            Cell::new(status.total),
            Cell::new(status.completed),
            Cell::new(status.waiting),
            Cell::new(status.active),
            Cell::new(status.failed),
            Cell::new(format!("{:.1}%", status.progress)),
        ]);
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::QueueDepth;

    #[test]
    fn test_status_table_renders() {
        let status = ExperimentStatus::compute("exp-1".into(), 8, 2, QueueDepth::default());
        let rendered = format_status_table(&status);
        assert!(rendered.contains("exp-1"));
        assert!(rendered.contains("25.0%"));
    }

    #[test]
    fn test_empty_trials_table_has_header() {
        let rendered = format_trials_table(&[]);
        assert!(rendered.contains("Scenario"));
        assert!(rendered.contains("Overall"));
    }
}
