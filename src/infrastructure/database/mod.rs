//! SQLite persistence adapters.

pub mod checkpoint_repository;
pub mod connection;
pub mod scenario_repository;
pub mod trial_repository;
pub mod utils;

pub use checkpoint_repository::SqliteCheckpointRepository;
pub use connection::DatabaseConnection;
pub use scenario_repository::SqliteScenarioRepository;
pub use trial_repository::SqliteTrialRepository;
