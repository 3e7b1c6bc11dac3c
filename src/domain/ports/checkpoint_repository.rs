//! Port for trial stage checkpoints.
//!
//! Checkpoints let a retried job resume after the last durably completed
//! pipeline stage instead of repeating the agent call and the nine scoring
//! calls. Keyed by (scenario id, stage); payload is the stage output as JSON.

use async_trait::async_trait;

use crate::domain::models::TrialStage;
use crate::domain::ports::errors::StoreError;

/// Repository port for stage checkpoints
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Save (or overwrite) the payload for one stage of one scenario
    async fn save(
        &self,
        scenario_id: &str,
        stage: TrialStage,
        payload: &serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Load the payload for one stage, if present
    async fn load(
        &self,
        scenario_id: &str,
        stage: TrialStage,
    ) -> Result<Option<serde_json::Value>, StoreError>;

    /// Remove all checkpoints for a scenario (called after a trial persists)
    async fn clear(&self, scenario_id: &str) -> Result<(), StoreError>;
}
