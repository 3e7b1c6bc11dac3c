use async_trait::async_trait;

use crate::domain::models::{Scenario, Tier};
use crate::domain::ports::errors::StoreError;

/// Filters for querying scenarios
#[derive(Default, Debug, Clone)]
pub struct ScenarioFilters {
    pub experiment_id: Option<String>,
    pub domain: Option<String>,
    pub tier: Option<Tier>,
    pub completed: Option<bool>,
    pub limit: Option<i64>,
}

/// Repository port for scenario persistence
#[async_trait]
pub trait ScenarioRepository: Send + Sync {
    /// Insert a batch of scenarios
    async fn insert_batch(&self, scenarios: &[Scenario]) -> Result<(), StoreError>;

    /// Get a scenario by id
    async fn get(&self, id: &str) -> Result<Option<Scenario>, StoreError>;

    /// List scenarios matching filters
    async fn list(&self, filters: ScenarioFilters) -> Result<Vec<Scenario>, StoreError>;

    /// Count scenarios matching filters
    async fn count(&self, filters: ScenarioFilters) -> Result<i64, StoreError>;

    /// Flip the completed flag for one scenario
    async fn mark_completed(&self, id: &str) -> Result<(), StoreError>;
}
