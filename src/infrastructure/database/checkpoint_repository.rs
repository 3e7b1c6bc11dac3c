//! SQLite implementation of the checkpoint repository port.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::domain::models::TrialStage;
use crate::domain::ports::checkpoint_repository::CheckpointRepository;
use crate::domain::ports::errors::StoreError;

pub struct SqliteCheckpointRepository {
    pool: SqlitePool,
}

impl SqliteCheckpointRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckpointRepository for SqliteCheckpointRepository {
    async fn save(
        &self,
        scenario_id: &str,
        stage: TrialStage,
        payload: &serde_json::Value,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO trial_checkpoints (scenario_id, stage, payload, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(scenario_id, stage) DO UPDATE SET
                 payload = excluded.payload,
                 created_at = excluded.created_at",
        )
        .bind(scenario_id)
        .bind(stage.as_str())
        .bind(serde_json::to_string(payload)?)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load(
        &self,
        scenario_id: &str,
        stage: TrialStage,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let row = sqlx::query(
            "SELECT payload FROM trial_checkpoints WHERE scenario_id = ? AND stage = ?",
        )
        .bind(scenario_id)
        .bind(stage.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| {
            let payload: String = r.get("payload");
            Ok(serde_json::from_str(&payload)?)
        })
        .transpose()
    }

    async fn clear(&self, scenario_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM trial_checkpoints WHERE scenario_id = ?")
            .bind(scenario_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::connection::DatabaseConnection;
    use serde_json::json;

    async fn repo() -> SqliteCheckpointRepository {
        let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        SqliteCheckpointRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let repo = repo().await;
        let payload = json!({"content": "answer", "word_count": 1});

        repo.save("scn-1", TrialStage::AgentResponse, &payload)
            .await
            .unwrap();
        let loaded = repo.load("scn-1", TrialStage::AgentResponse).await.unwrap();
        assert_eq!(loaded, Some(payload));

        assert!(repo.load("scn-1", TrialStage::Assessment).await.unwrap().is_none());
        assert!(repo.load("other", TrialStage::AgentResponse).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let repo = repo().await;
        repo.save("scn-1", TrialStage::Assessment, &json!({"v": 1}))
            .await
            .unwrap();
        repo.save("scn-1", TrialStage::Assessment, &json!({"v": 2}))
            .await
            .unwrap();
        let loaded = repo.load("scn-1", TrialStage::Assessment).await.unwrap();
        assert_eq!(loaded, Some(json!({"v": 2})));
    }

    #[tokio::test]
    async fn test_clear_removes_all_stages() {
        let repo = repo().await;
        repo.save("scn-1", TrialStage::AgentResponse, &json!(1))
            .await
            .unwrap();
        repo.save("scn-1", TrialStage::Assessment, &json!(2))
            .await
            .unwrap();
        repo.save("scn-2", TrialStage::AgentResponse, &json!(3))
            .await
            .unwrap();

        repo.clear("scn-1").await.unwrap();
        assert!(repo.load("scn-1", TrialStage::AgentResponse).await.unwrap().is_none());
        assert!(repo.load("scn-1", TrialStage::Assessment).await.unwrap().is_none());
        assert!(repo.load("scn-2", TrialStage::AgentResponse).await.unwrap().is_some());
    }
}
