use anyhow::{bail, Result};
use clap::Args;

use crate::cli::output::table::{format_summary_table, format_trials_table};
use crate::domain::models::{Config, Tier};
use crate::domain::ports::trial_repository::{TrialFilters, TrialRepository};
use crate::infrastructure::database::{DatabaseConnection, SqliteTrialRepository};
use crate::services::stats::ExperimentSummary;

#[derive(Args)]
pub struct ResultsArgs {
    /// Experiment identifier (from `crucible run`)
    pub experiment_id: String,

    /// Filter by task domain
    #[arg(long)]
    pub domain: Option<String>,

    /// Filter by tier (simple, moderate, complex)
    #[arg(long)]
    pub tier: Option<String>,

    /// Filter by model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Keep only trials at or above this overall score
    #[arg(long)]
    pub min_score: Option<f64>,

    /// Maximum number of trials to show
    #[arg(long)]
    pub limit: Option<i64>,
}

pub async fn execute(args: &ResultsArgs, config: &Config, json: bool) -> Result<()> {
    let tier = match &args.tier {
        Some(raw) => match Tier::from_str(raw) {
            Some(tier) => Some(tier),
            None => bail!("unknown tier: {raw} (expected simple, moderate, or complex)"),
        },
        None => None,
    };

    let db = DatabaseConnection::from_config(&config.database).await?;
    db.migrate().await?;
    let trials = SqliteTrialRepository::new(db.pool().clone());

    let records = trials
        .list(TrialFilters {
            experiment_id: Some(args.experiment_id.clone()),
            domain: args.domain.clone(),
            tier,
            model_id: args.model.clone(),
            min_overall_score: args.min_score,
            limit: args.limit,
        })
        .await?;
    let summary = ExperimentSummary::from_trials(&records);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "trials": records,
                "summary": summary,
            }))?
        );
    } else if records.is_empty() {
        println!("No trials found for experiment {}", args.experiment_id);
    } else {
        println!("{}", format_trials_table(&records));
        println!("{}", format_summary_table(&summary));
        println!("{} trial(s)", records.len());
    }

    db.close().await;
    Ok(())
}
