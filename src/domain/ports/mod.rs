//! Port traits: the seams between the core and external collaborators.

pub mod agent;
pub mod checkpoint_repository;
pub mod errors;
pub mod oracle;
pub mod scenario_repository;
pub mod trial_repository;
pub mod validator;

pub use agent::{AgentError, CognitiveAgent};
pub use checkpoint_repository::CheckpointRepository;
pub use errors::StoreError;
pub use oracle::{OracleError, OracleReply, OracleRequest, ScoringOracle};
pub use scenario_repository::{ScenarioFilters, ScenarioRepository};
pub use trial_repository::{TrialFilters, TrialRepository};
pub use validator::{ComplexityValidator, ComplexityVerdict, ValidatorError};
