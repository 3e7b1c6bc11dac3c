//! Domain services: scenario generation, validation, and scoring.

pub mod aggregator;
pub mod assessor;
pub mod batch_validation;
pub mod heuristic_validator;
pub mod scenario_generator;
pub mod stats;

pub use aggregator::ScoreAggregator;
pub use assessor::{AssessmentContext, DimensionAssessor};
pub use batch_validation::{BatchOutcome, BatchValidationGate, RejectedScenario, ValidationProgress};
pub use heuristic_validator::HeuristicComplexityValidator;
pub use scenario_generator::ScenarioGenerator;
pub use stats::{ExperimentSummary, ScoreSummary};
