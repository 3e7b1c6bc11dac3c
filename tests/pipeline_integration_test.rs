//! End-to-end pipeline tests: orchestrator -> validation gate -> queue ->
//! executor -> SQLite, with scripted agent and oracle implementations.
//!
//! Unit tests in the source files cover each stage in isolation; these
//! exercise the composed stack against an in-memory database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crucible::application::{ExperimentOrchestrator, TrialExecutor, TrialQueue};
use crucible::domain::models::{
    CognitiveResponse, ComplexityMetrics, ExperimentConfig, QueueConfig, ResponseMetadata,
    RetryConfig, Scenario, Tier, ToolConfig, ValidationPolicy,
};
use crucible::domain::ports::agent::{AgentError, CognitiveAgent};
use crucible::domain::ports::oracle::{OracleError, OracleReply, OracleRequest, ScoringOracle};
use crucible::domain::ports::scenario_repository::{ScenarioFilters, ScenarioRepository};
use crucible::domain::ports::trial_repository::{TrialFilters, TrialRepository};
use crucible::domain::ports::validator::{ComplexityValidator, ComplexityVerdict, ValidatorError};
use crucible::infrastructure::database::{
    DatabaseConnection, SqliteCheckpointRepository, SqliteScenarioRepository, SqliteTrialRepository,
};
use crucible::services::{BatchValidationGate, HeuristicComplexityValidator, ScoreAggregator};

/// Agent that fails a fixed number of times per scenario before answering.
struct ScriptedAgent {
    failures_before_success: u32,
    attempts: Mutex<HashMap<String, u32>>,
    calls: AtomicUsize,
}

impl ScriptedAgent {
    fn new(failures_before_success: u32) -> Self {
        Self {
            failures_before_success,
            attempts: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CognitiveAgent for ScriptedAgent {
    async fn execute(
        &self,
        task_prompt: &str,
        _model_id: &str,
        _tool_config: &ToolConfig,
    ) -> Result<CognitiveResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut attempts = self.attempts.lock().unwrap();
        // The full prompt is unique per scenario (numeric tokens are scaled
        // per repetition), so it works as the per-scenario key.
        let seen = attempts.entry(task_prompt.to_string()).or_insert(0);
        *seen += 1;
        if *seen <= self.failures_before_success {
            return Err(AgentError::NetworkError("connection reset".to_string()));
        }
        Ok(CognitiveResponse::new(
            "The quarterly figures show a 12% revenue increase driven by the new product line. \
             Margins held steady at 34%. Recommend expanding the sales team in Q3.",
            ResponseMetadata::default(),
        ))
    }
}

/// Oracle returning the same structured verdict for every dimension.
struct StaticOracle {
    calls: AtomicUsize,
}

impl StaticOracle {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ScoringOracle for StaticOracle {
    async fn invoke(&self, _request: OracleRequest) -> Result<OracleReply, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(OracleReply::Structured(json!({
            "component_scores": [4, 4, 4, 4, 4, 4],
            "score": 4,
            "confidence": 0.9,
            "observations": "grounded in the provided figures"
        })))
    }
}

/// Validator that rejects every scenario in one domain.
struct DomainRejectingValidator {
    rejected_domain: String,
}

#[async_trait]
impl ComplexityValidator for DomainRejectingValidator {
    async fn validate(&self, scenario: &Scenario) -> Result<ComplexityVerdict, ValidatorError> {
        if scenario.domain == self.rejected_domain {
            return Ok(ComplexityVerdict {
                is_valid: false,
                complexity_score: 0.5,
                sub_metrics: ComplexityMetrics::default(),
                rejection_reasons: vec!["complexity below tier floor".to_string()],
            });
        }
        Ok(ComplexityVerdict {
            is_valid: true,
            complexity_score: 3.0,
            sub_metrics: ComplexityMetrics::default(),
            rejection_reasons: vec![],
        })
    }
}

struct Stack {
    orchestrator: ExperimentOrchestrator,
    queue: Arc<TrialQueue>,
    agent: Arc<ScriptedAgent>,
    oracle: Arc<StaticOracle>,
    scenarios: Arc<SqliteScenarioRepository>,
    trials: Arc<SqliteTrialRepository>,
}

fn fast_queue_config(concurrency: usize) -> QueueConfig {
    QueueConfig {
        concurrency,
        jobs_per_second: 1000.0,
        retry: RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 10,
            max_backoff_ms: 100,
        },
        ..Default::default()
    }
}

async fn build_stack(
    agent_failures: u32,
    validator: Arc<dyn ComplexityValidator>,
    policy: ValidationPolicy,
) -> Stack {
    let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    let scenarios = Arc::new(SqliteScenarioRepository::new(db.pool().clone()));
    let trials = Arc::new(SqliteTrialRepository::new(db.pool().clone()));
    let checkpoints = Arc::new(SqliteCheckpointRepository::new(db.pool().clone()));

    let agent = Arc::new(ScriptedAgent::new(agent_failures));
    let oracle = Arc::new(StaticOracle::new());
    let aggregator = Arc::new(ScoreAggregator::new(
        oracle.clone() as Arc<dyn ScoringOracle>,
        true,
    ));
    let executor = Arc::new(TrialExecutor::new(
        agent.clone(),
        aggregator,
        scenarios.clone(),
        trials.clone(),
        checkpoints,
    ));
    let queue = TrialQueue::new(fast_queue_config(4), executor);
    queue.start();

    let gate = BatchValidationGate::new(validator, policy);
    let orchestrator =
        ExperimentOrchestrator::new(gate, scenarios.clone(), trials.clone(), queue.clone());
    Stack {
        orchestrator,
        queue,
        agent,
        oracle,
        scenarios,
        trials,
    }
}

fn experiment_config() -> ExperimentConfig {
    ExperimentConfig {
        name: "Integration Pilot".to_string(),
        domains: vec!["analytical".into(), "planning".into()],
        tiers: vec![Tier::Simple],
        repetitions: 2,
        models: vec!["sonnet".into()],
        tool_configs: vec![ToolConfig {
            id: "baseline".to_string(),
            ..Default::default()
        }],
    }
}

#[tokio::test]
async fn test_full_pipeline_persists_all_trials() {
    let stack = build_stack(
        0,
        Arc::new(HeuristicComplexityValidator::new()),
        ValidationPolicy::AllOrNothing,
    )
    .await;

    let receipt = stack
        .orchestrator
        .run_experiment(&experiment_config(), None)
        .await
        .unwrap();
    assert_eq!(receipt.total_trials, 4);
    assert_eq!(receipt.queued, 4);
    stack.orchestrator.drain().await;

    let records = stack.trials.list(TrialFilters::default()).await.unwrap();
    assert_eq!(records.len(), 4);
    for record in &records {
        assert_eq!(record.attempts_made, 1);
        // Uniform score of 4 normalizes to 7.5 overall
        assert!((record.assessment.overall_score - 7.5).abs() < 1e-9);
        assert_eq!(record.assessment.dimensions.len(), 9);
    }

    let incomplete = stack
        .scenarios
        .count(ScenarioFilters {
            completed: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(incomplete, 0);

    let status = stack
        .orchestrator
        .experiment_status(&receipt.experiment_id)
        .await
        .unwrap();
    assert_eq!(status.total, 4);
    assert_eq!(status.completed, 4);
    assert!((status.progress - 100.0).abs() < f64::EPSILON);

    // Nine oracle calls per trial, one agent call each
    assert_eq!(stack.oracle.calls.load(Ordering::SeqCst), 36);
    assert_eq!(stack.agent.calls.load(Ordering::SeqCst), 4);

    let results = stack
        .orchestrator
        .experiment_results(TrialFilters {
            experiment_id: Some(receipt.experiment_id),
            ..Default::default()
        })
        .await
        .unwrap();
    let overall = results.summary.overall.as_ref().unwrap();
    assert_eq!(overall.count, 4);
    assert!((overall.mean - 7.5).abs() < 1e-9);

    stack.queue.shutdown().await;
}

#[tokio::test]
async fn test_flaky_agent_retried_to_completion() {
    // Every scenario fails once before succeeding.
    let stack = build_stack(
        1,
        Arc::new(HeuristicComplexityValidator::new()),
        ValidationPolicy::AllOrNothing,
    )
    .await;

    stack
        .orchestrator
        .run_experiment(&experiment_config(), None)
        .await
        .unwrap();
    stack.orchestrator.drain().await;

    let records = stack.trials.list(TrialFilters::default()).await.unwrap();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r.attempts_made == 2));

    let depth = stack.queue.depth();
    assert_eq!(depth.completed, 4);
    assert_eq!(depth.failed, 0);
    // Two agent calls per scenario, no third
    assert_eq!(stack.agent.calls.load(Ordering::SeqCst), 8);

    stack.queue.shutdown().await;
}

#[tokio::test]
async fn test_dead_agent_exhausts_attempts_without_trial_rows() {
    let stack = build_stack(
        u32::MAX,
        Arc::new(HeuristicComplexityValidator::new()),
        ValidationPolicy::AllOrNothing,
    )
    .await;

    let receipt = stack
        .orchestrator
        .run_experiment(&experiment_config(), None)
        .await
        .unwrap();
    stack.orchestrator.drain().await;

    assert_eq!(stack.trials.count(TrialFilters::default()).await.unwrap(), 0);
    let depth = stack.queue.depth();
    assert_eq!(depth.completed, 0);
    assert_eq!(depth.failed, 4);

    // Scenarios survive as the durable restart source
    let incomplete = stack
        .scenarios
        .count(ScenarioFilters {
            experiment_id: Some(receipt.experiment_id),
            completed: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(incomplete, 4);

    let (_, failed) = stack.queue.recent_outcomes();
    assert_eq!(failed.len(), 4);
    assert!(failed.iter().all(|o| o.attempts_made == 3));

    stack.queue.shutdown().await;
}

#[tokio::test]
async fn test_all_or_nothing_rejection_writes_nothing() {
    let stack = build_stack(
        0,
        Arc::new(DomainRejectingValidator {
            rejected_domain: "planning".to_string(),
        }),
        ValidationPolicy::AllOrNothing,
    )
    .await;

    let err = stack
        .orchestrator
        .run_experiment(&experiment_config(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("batch validation failed"));

    // Nothing persisted, nothing queued, nothing executed
    assert_eq!(
        stack
            .scenarios
            .count(ScenarioFilters::default())
            .await
            .unwrap(),
        0
    );
    assert_eq!(stack.trials.count(TrialFilters::default()).await.unwrap(), 0);
    let depth = stack.queue.depth();
    assert_eq!(depth.waiting, 0);
    assert_eq!(depth.active, 0);
    assert_eq!(stack.agent.calls.load(Ordering::SeqCst), 0);

    stack.queue.shutdown().await;
}

#[tokio::test]
async fn test_accept_valid_runs_surviving_scenarios() {
    let stack = build_stack(
        0,
        Arc::new(DomainRejectingValidator {
            rejected_domain: "planning".to_string(),
        }),
        ValidationPolicy::AcceptValid,
    )
    .await;

    let receipt = stack
        .orchestrator
        .run_experiment(&experiment_config(), None)
        .await
        .unwrap();
    assert_eq!(receipt.total_trials, 4);
    assert_eq!(receipt.queued, 2);
    assert_eq!(receipt.rejected, 2);
    stack.orchestrator.drain().await;

    let records = stack.trials.list(TrialFilters::default()).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.attempts_made == 1));
    // Only the surviving domain reached the store
    let persisted = stack
        .scenarios
        .count(ScenarioFilters {
            domain: Some("planning".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(persisted, 0);

    stack.queue.shutdown().await;
}

#[tokio::test]
async fn test_resume_after_restart_requeues_incomplete() {
    // First process: scenarios persisted, queue killed before work runs.
    let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    let scenarios = Arc::new(SqliteScenarioRepository::new(db.pool().clone()));
    let trials = Arc::new(SqliteTrialRepository::new(db.pool().clone()));
    let checkpoints = Arc::new(SqliteCheckpointRepository::new(db.pool().clone()));

    let agent = Arc::new(ScriptedAgent::new(0));
    let oracle = Arc::new(StaticOracle::new());
    let aggregator = Arc::new(ScoreAggregator::new(
        oracle.clone() as Arc<dyn ScoringOracle>,
        true,
    ));
    let executor = Arc::new(TrialExecutor::new(
        agent.clone(),
        aggregator,
        scenarios.clone(),
        trials.clone(),
        checkpoints,
    ));

    let gate = BatchValidationGate::new(
        Arc::new(HeuristicComplexityValidator::new()),
        ValidationPolicy::AllOrNothing,
    );
    // Paused queue stands in for a process that died before executing.
    let dead_queue = TrialQueue::new(fast_queue_config(1), executor.clone());
    let first = ExperimentOrchestrator::new(
        gate,
        scenarios.clone(),
        trials.clone(),
        dead_queue.clone(),
    );
    let receipt = first
        .run_experiment(&experiment_config(), None)
        .await
        .unwrap();
    drop(first);
    drop(dead_queue);

    // Second process: fresh queue over the same database.
    let gate = BatchValidationGate::new(
        Arc::new(HeuristicComplexityValidator::new()),
        ValidationPolicy::AllOrNothing,
    );
    let queue = TrialQueue::new(fast_queue_config(4), executor);
    queue.start();
    let second =
        ExperimentOrchestrator::new(gate, scenarios.clone(), trials.clone(), queue.clone());
    let requeued = second
        .resume_incomplete(Some(receipt.experiment_id.clone()))
        .await
        .unwrap();
    assert_eq!(requeued, 4);
    second.drain().await;

    assert_eq!(trials.count(TrialFilters::default()).await.unwrap(), 4);
    let status = second
        .experiment_status(&receipt.experiment_id)
        .await
        .unwrap();
    assert_eq!(status.completed, 4);

    queue.shutdown().await;
}
