use anyhow::Result;
use clap::Args;

use crate::cli::output::table::format_status_table;
use crate::domain::models::{Config, ExperimentStatus, QueueDepth};
use crate::domain::ports::scenario_repository::{ScenarioFilters, ScenarioRepository};
use crate::infrastructure::database::{DatabaseConnection, SqliteScenarioRepository};

#[derive(Args)]
pub struct StatusArgs {
    /// Experiment identifier (from `crucible run`)
    pub experiment_id: String,
}

pub async fn execute(args: &StatusArgs, config: &Config, json: bool) -> Result<()> {
    let db = DatabaseConnection::from_config(&config.database).await?;
    db.migrate().await?;
    let scenarios = SqliteScenarioRepository::new(db.pool().clone());

    let total = scenarios
        .count(ScenarioFilters {
            experiment_id: Some(args.experiment_id.clone()),
            ..Default::default()
        })
        .await?;
    let completed = scenarios
        .count(ScenarioFilters {
            experiment_id: Some(args.experiment_id.clone()),
            completed: Some(true),
            ..Default::default()
        })
        .await?;

    // Queue counters live in the running process; from here only the
    // durable store is visible.
    let status = ExperimentStatus::compute(
        args.experiment_id.clone(),
        u64::try_from(total).unwrap_or(0),
        u64::try_from(completed).unwrap_or(0),
        QueueDepth::default(),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else if status.total == 0 {
        println!("No scenarios found for experiment {}", args.experiment_id);
    } else {
        println!("{}", format_status_table(&status));
    }

    db.close().await;
    Ok(())
}
