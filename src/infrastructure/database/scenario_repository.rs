//! SQLite implementation of the scenario repository port.
//!
//! Scenarios are stored with their structured fields flattened to columns
//! where they are filtered on, and as JSON text otherwise. Batch inserts run
//! in one transaction so a failed batch leaves no rows behind.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, SqlitePool};

use crate::domain::models::{ComplexityMetrics, Scenario, Tier};
use crate::domain::ports::errors::StoreError;
use crate::domain::ports::scenario_repository::{ScenarioFilters, ScenarioRepository};
use crate::infrastructure::database::utils::{from_json, parse_datetime, to_json};

pub struct SqliteScenarioRepository {
    pool: SqlitePool,
}

impl SqliteScenarioRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_scenario(row: &SqliteRow) -> Result<Scenario, StoreError> {
    let tier: String = row.get("tier");
    let tier = Tier::from_str(&tier)
        .ok_or_else(|| StoreError::InvalidValue(format!("unknown tier: {tier}")))?;
    let repetition: i64 = row.get("repetition");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let tool_config: String = row.get("tool_config");
    let success_criteria: String = row.get("success_criteria");
    let expected_calculations: String = row.get("expected_calculations");
    let expected_insights: String = row.get("expected_insights");
    let requirements: String = row.get("requirements");
    let optional_data: Option<String> = row.get("optional_data");
    let complexity_metrics: Option<String> = row.get("complexity_metrics");

    Ok(Scenario {
        id: row.get("id"),
        experiment_id: row.get("experiment_id"),
        domain: row.get("domain"),
        tier,
        repetition: u32::try_from(repetition)
            .map_err(|_| StoreError::InvalidValue(format!("negative repetition: {repetition}")))?,
        model_id: row.get("model_id"),
        tool_config: from_json(&tool_config)?,
        title: row.get("title"),
        description: row.get("description"),
        business_context: row.get("business_context"),
        success_criteria: from_json(&success_criteria)?,
        expected_calculations: from_json(&expected_calculations)?,
        expected_insights: from_json(&expected_insights)?,
        requirements: from_json(&requirements)?,
        optional_data: optional_data.as_deref().map(from_json).transpose()?.unwrap_or_default(),
        complexity_score: row.get("complexity_score"),
        complexity_metrics: complexity_metrics
            .as_deref()
            .map(from_json::<ComplexityMetrics>)
            .transpose()?
            .unwrap_or_default(),
        completed: row.get::<i64, _>("completed") != 0,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

fn apply_filters(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, filters: &ScenarioFilters) {
    if let Some(experiment_id) = &filters.experiment_id {
        builder.push(" AND experiment_id = ").push_bind(experiment_id.clone());
    }
    if let Some(domain) = &filters.domain {
        builder.push(" AND domain = ").push_bind(domain.clone());
    }
    if let Some(tier) = filters.tier {
        builder.push(" AND tier = ").push_bind(tier.as_str());
    }
    if let Some(completed) = filters.completed {
        builder.push(" AND completed = ").push_bind(i64::from(completed));
    }
}

#[async_trait]
impl ScenarioRepository for SqliteScenarioRepository {
    async fn insert_batch(&self, scenarios: &[Scenario]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for scenario in scenarios {
            sqlx::query(
                "INSERT INTO scenarios (
                    id, experiment_id, domain, tier, repetition, model_id,
                    tool_config_id, tool_config, title, description,
                    business_context, success_criteria, expected_calculations,
                    expected_insights, requirements, optional_data,
                    complexity_score, complexity_metrics, completed,
                    created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&scenario.id)
            .bind(&scenario.experiment_id)
            .bind(&scenario.domain)
            .bind(scenario.tier.as_str())
            .bind(i64::from(scenario.repetition))
            .bind(&scenario.model_id)
            .bind(&scenario.tool_config.id)
            .bind(to_json(&scenario.tool_config)?)
            .bind(&scenario.title)
            .bind(&scenario.description)
            .bind(&scenario.business_context)
            .bind(to_json(&scenario.success_criteria)?)
            .bind(to_json(&scenario.expected_calculations)?)
            .bind(to_json(&scenario.expected_insights)?)
            .bind(to_json(&scenario.requirements)?)
            .bind(to_json(&scenario.optional_data)?)
            .bind(scenario.complexity_score)
            .bind(to_json(&scenario.complexity_metrics)?)
            .bind(i64::from(scenario.completed))
            .bind(scenario.created_at.to_rfc3339())
            .bind(scenario.updated_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Scenario>, StoreError> {
        let row = sqlx::query("SELECT * FROM scenarios WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_scenario).transpose()
    }

    async fn list(&self, filters: ScenarioFilters) -> Result<Vec<Scenario>, StoreError> {
        let mut builder = QueryBuilder::new("SELECT * FROM scenarios WHERE 1=1");
        apply_filters(&mut builder, &filters);
        builder.push(" ORDER BY id");
        if let Some(limit) = filters.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_scenario).collect()
    }

    async fn count(&self, filters: ScenarioFilters) -> Result<i64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM scenarios WHERE 1=1");
        apply_filters(&mut builder, &filters);
        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.get(0))
    }

    async fn mark_completed(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE scenarios SET completed = 1, updated_at = ? WHERE id = ?")
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ScenarioNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ExperimentConfig, ToolConfig};
    use crate::infrastructure::database::connection::DatabaseConnection;
    use crate::services::scenario_generator::ScenarioGenerator;

    async fn repo() -> SqliteScenarioRepository {
        let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        SqliteScenarioRepository::new(db.pool().clone())
    }

    fn sample_scenarios() -> Vec<Scenario> {
        let config = ExperimentConfig {
            name: String::new(),
            domains: vec!["analytical".into(), "planning".into()],
            tiers: vec![Tier::Simple, Tier::Complex],
            repetitions: 1,
            models: vec!["sonnet".into()],
            tool_configs: vec![ToolConfig {
                id: "baseline".to_string(),
                ..Default::default()
            }],
        };
        ScenarioGenerator::generate("exp-1", &config).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let repo = repo().await;
        let scenarios = sample_scenarios();
        repo.insert_batch(&scenarios).await.unwrap();

        let loaded = repo.get(&scenarios[0].id).await.unwrap().unwrap();
        assert_eq!(loaded, scenarios[0]);
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = repo().await;
        repo.insert_batch(&sample_scenarios()).await.unwrap();

        let all = repo.list(ScenarioFilters::default()).await.unwrap();
        assert_eq!(all.len(), 4);

        let simple = repo
            .list(ScenarioFilters {
                tier: Some(Tier::Simple),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(simple.len(), 2);
        assert!(simple.iter().all(|s| s.tier == Tier::Simple));

        let planning = repo
            .list(ScenarioFilters {
                domain: Some("planning".to_string()),
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(planning.len(), 1);
        assert_eq!(planning[0].domain, "planning");
    }

    #[tokio::test]
    async fn test_mark_completed() {
        let repo = repo().await;
        let scenarios = sample_scenarios();
        repo.insert_batch(&scenarios).await.unwrap();

        repo.mark_completed(&scenarios[0].id).await.unwrap();
        let loaded = repo.get(&scenarios[0].id).await.unwrap().unwrap();
        assert!(loaded.completed);

        let incomplete = repo
            .count(ScenarioFilters {
                completed: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(incomplete, 3);

        assert!(matches!(
            repo.mark_completed("missing").await,
            Err(StoreError::ScenarioNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_no_rows() {
        let repo = repo().await;
        let mut scenarios = sample_scenarios();
        // Duplicate primary key in the middle of the batch
        let duplicate_id = scenarios[0].id.clone();
        scenarios[2].id = duplicate_id;

        assert!(repo.insert_batch(&scenarios).await.is_err());
        let count = repo.count(ScenarioFilters::default()).await.unwrap();
        assert_eq!(count, 0);
    }
}
