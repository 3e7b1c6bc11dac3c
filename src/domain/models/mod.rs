//! Domain models: pure data types with no infrastructure dependencies.

pub mod assessment;
pub mod config;
pub mod queue;
pub mod response;
pub mod scenario;
pub mod status;
pub mod trial;

pub use assessment::{
    CompositeAssessment, Dimension, DimensionAssessment, NormalizedScore, RatingLabel,
};
pub use config::{
    AgentConfig, Config, DatabaseConfig, LoggingConfig, OracleConfig, QueueConfig, RetryConfig,
    ValidationPolicy,
};
pub use queue::PriorityQueue;
pub use response::{CognitiveResponse, ResponseMetadata};
pub use scenario::{
    ComplexityMetrics, ExperimentConfig, Scenario, SuccessCriterion, Tier, ToolConfig,
};
pub use status::{ExperimentStatus, QueueDepth};
pub use trial::{JobOutcome, JobState, TrialJob, TrialRecord, TrialStage};
