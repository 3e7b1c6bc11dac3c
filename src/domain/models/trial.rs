//! Trial job and trial record models.
//!
//! A `TrialJob` wraps one scenario for queue execution; its job id equals the
//! scenario id so a duplicate enqueue is a no-op. A `TrialRecord` is the
//! durable row persisted after a successful trial.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assessment::CompositeAssessment;
use super::response::ResponseMetadata;
use super::scenario::{Scenario, Tier, ToolConfig};

/// Queue state of a trial job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Enqueued, not yet picked up (includes jobs waiting out a retry delay)
    Waiting,
    /// Being executed by a worker
    Active,
    /// Handler succeeded
    Completed,
    /// Attempts exhausted
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One job in the trial queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialJob {
    /// The scenario to execute (carries its resolved tool configuration)
    pub scenario: Scenario,
    /// Attempts made so far, including the current one once active
    pub attempts_made: u32,
}

impl TrialJob {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            attempts_made: 0,
        }
    }

    /// Job identifier. Equal to the scenario id, which is what makes
    /// duplicate enqueues and concurrent double-execution impossible.
    pub fn id(&self) -> &str {
        &self.scenario.id
    }

    /// Queue priority derived from the scenario's tier.
    pub fn priority(&self) -> u8 {
        self.scenario.tier.priority()
    }
}

/// Terminal outcome of a job, retained for observability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: String,
    pub state: JobState,
    pub attempts_made: u32,
    /// Last error message, present for failed jobs
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

/// Durable record of one completed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub id: Uuid,
    pub experiment_id: String,
    pub scenario_id: String,
    pub domain: String,
    pub tier: Tier,
    pub repetition: u32,
    pub model_id: String,
    pub tool_config: ToolConfig,
    pub response_text: String,
    pub word_count: usize,
    pub processing_metadata: ResponseMetadata,
    pub assessment: CompositeAssessment,
    pub attempts_made: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub completed: bool,
}

impl TrialRecord {
    /// Assemble a record from the trial pipeline's outputs.
    pub fn from_trial(
        scenario: &Scenario,
        response_text: String,
        metadata: ResponseMetadata,
        assessment: CompositeAssessment,
        attempts_made: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            experiment_id: scenario.experiment_id.clone(),
            scenario_id: scenario.id.clone(),
            domain: scenario.domain.clone(),
            tier: scenario.tier,
            repetition: scenario.repetition,
            model_id: scenario.model_id.clone(),
            tool_config: scenario.tool_config.clone(),
            word_count: response_text.split_whitespace().count(),
            response_text,
            processing_metadata: metadata,
            assessment,
            attempts_made,
            started_at,
            finished_at: Utc::now(),
            completed: true,
        }
    }
}

/// Stage of the trial pipeline, used as the checkpoint key.
///
/// A retried job resumes after the last durably completed stage instead of
/// re-running expensive network calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStage {
    /// Agent call finished; payload is the serialized response
    AgentResponse,
    /// Nine-way scoring finished; payload is the serialized composite
    Assessment,
}

impl TrialStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AgentResponse => "agent_response",
            Self::Assessment => "assessment",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "agent_response" => Some(Self::AgentResponse),
            "assessment" => Some(Self::Assessment),
            _ => None,
        }
    }
}
