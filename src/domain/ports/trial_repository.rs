use async_trait::async_trait;

use crate::domain::models::{Tier, TrialRecord};
use crate::domain::ports::errors::StoreError;

/// Filters for querying trial records
#[derive(Default, Debug, Clone)]
pub struct TrialFilters {
    pub experiment_id: Option<String>,
    pub domain: Option<String>,
    pub tier: Option<Tier>,
    pub model_id: Option<String>,
    /// Keep only trials with overall score >= this value
    pub min_overall_score: Option<f64>,
    pub limit: Option<i64>,
}

/// Repository port for trial record persistence
#[async_trait]
pub trait TrialRepository: Send + Sync {
    /// Insert one trial record
    async fn insert(&self, record: &TrialRecord) -> Result<(), StoreError>;

    /// List trial records matching filters
    async fn list(&self, filters: TrialFilters) -> Result<Vec<TrialRecord>, StoreError>;

    /// Count trial records matching filters
    async fn count(&self, filters: TrialFilters) -> Result<i64, StoreError>;
}
