use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::mpsc;
use tracing::info;

use crate::application::{ExperimentOrchestrator, TrialExecutor, TrialQueue};
use crate::cli::output::progress::create_progress_bar;
use crate::cli::output::table::{format_summary_table, format_trials_table};
use crate::domain::models::{Config, ExperimentConfig};
use crate::domain::ports::oracle::ScoringOracle;
use crate::domain::ports::trial_repository::TrialFilters;
use crate::infrastructure::api::{HttpCognitiveAgent, HttpScoringOracle};
use crate::infrastructure::database::{
    DatabaseConnection, SqliteCheckpointRepository, SqliteScenarioRepository, SqliteTrialRepository,
};
use crate::services::aggregator::ScoreAggregator;
use crate::services::batch_validation::{BatchValidationGate, ValidationProgress};
use crate::services::heuristic_validator::HeuristicComplexityValidator;

#[derive(Args)]
pub struct RunArgs {
    /// Experiment spec file (YAML)
    pub experiment: PathBuf,

    /// Queue trials and exit without waiting for completion
    #[arg(long)]
    pub no_wait: bool,
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub async fn execute(args: &RunArgs, config: &Config, json: bool) -> Result<()> {
    let spec = std::fs::read_to_string(&args.experiment)
        .with_context(|| format!("failed to read {}", args.experiment.display()))?;
    let experiment: ExperimentConfig =
        serde_yaml::from_str(&spec).context("invalid experiment spec")?;

    let db = DatabaseConnection::from_config(&config.database).await?;
    db.migrate().await?;
    let scenarios = Arc::new(SqliteScenarioRepository::new(db.pool().clone()));
    let trials = Arc::new(SqliteTrialRepository::new(db.pool().clone()));
    let checkpoints = Arc::new(SqliteCheckpointRepository::new(db.pool().clone()));

    let oracle: Arc<dyn ScoringOracle> = Arc::new(HttpScoringOracle::new(&config.oracle)?);
    let agent = Arc::new(HttpCognitiveAgent::new(&config.agent)?);
    let aggregator = Arc::new(ScoreAggregator::new(
        oracle,
        config.oracle.parallel_dimensions,
    ));
    let executor = Arc::new(TrialExecutor::new(
        agent,
        aggregator,
        scenarios.clone(),
        trials.clone(),
        checkpoints,
    ));
    let queue = TrialQueue::new(config.queue.clone(), executor);
    queue.start();

    let gate = BatchValidationGate::new(
        Arc::new(HeuristicComplexityValidator::new()),
        config.queue.validation_policy,
    );
    let orchestrator =
        ExperimentOrchestrator::new(gate, scenarios, trials.clone(), Arc::clone(&queue));

    // Pick up anything a previous process left unfinished.
    let resumed = orchestrator.resume_incomplete(None).await?;
    if resumed > 0 {
        info!(resumed, "resumed incomplete scenarios from a previous run");
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<ValidationProgress>();
    let validation_bar = (!json).then(|| {
        create_progress_bar(experiment.total_trials() as u64, "Validating scenarios")
    });
    let bar_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(bar) = &validation_bar {
                bar.set_position(event.checked as u64);
            }
        }
        if let Some(bar) = validation_bar {
            bar.finish_and_clear();
        }
    });

    let receipt = orchestrator.run_experiment(&experiment, Some(tx)).await?;
    let _ = bar_task.await;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "experiment_id": receipt.experiment_id,
                "total_trials": receipt.total_trials,
                "queued": receipt.queued,
                "rejected": receipt.rejected,
            })
        );
    } else {
        println!(
            "Experiment {} queued: {} trial(s), {} rejected",
            receipt.experiment_id, receipt.queued, receipt.rejected
        );
    }

    if args.no_wait {
        return Ok(());
    }

    let total = (receipt.queued + resumed) as u64;
    let trial_bar = (!json).then(|| create_progress_bar(total, "Running trials"));
    loop {
        let depth = queue.depth();
        if let Some(bar) = &trial_bar {
            bar.set_position((depth.completed + depth.failed) as u64);
        }
        if depth.waiting == 0 && depth.active == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    if let Some(bar) = trial_bar {
        bar.finish();
    }
    queue.shutdown().await;

    let (_, failed) = queue.recent_outcomes();
    for outcome in &failed {
        eprintln!(
            "failed: {} after {} attempt(s): {}",
            outcome.job_id,
            outcome.attempts_made,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }

    let results = orchestrator
        .experiment_results(TrialFilters {
            experiment_id: Some(receipt.experiment_id.clone()),
            ..Default::default()
        })
        .await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results.summary)?);
    } else {
        println!("{}", format_trials_table(&results.trials));
        println!("{}", format_summary_table(&results.summary));
    }

    db.close().await;
    Ok(())
}
