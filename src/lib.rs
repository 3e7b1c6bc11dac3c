//! Crucible: an evaluation harness for cognitive agents.
//!
//! Expands an experiment configuration into a scenario matrix, validates the
//! batch, runs each scenario against an agent under test through a priority
//! queue with retry, scores every response along nine quality dimensions via
//! an external oracle, and persists composite assessments for analysis.
//!
//! Layout follows a ports-and-adapters split:
//! - [`domain`]: models and port traits, no I/O
//! - [`services`]: scenario generation, validation, and scoring
//! - [`application`]: the trial queue, executor, and orchestrator
//! - [`infrastructure`]: HTTP, SQLite, configuration, and logging adapters
//! - [`cli`]: the `crucible` binary surface

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use application::{ExperimentOrchestrator, ExperimentReceipt, TrialExecutor, TrialQueue};
pub use domain::models::{
    CompositeAssessment, Config, Dimension, ExperimentConfig, Scenario, Tier, TrialRecord,
};
