//! SQLite implementation of the trial repository port.
//!
//! The composite assessment is split across columns: the per-dimension
//! detail and normalized scores as JSON, the headline numbers flattened so
//! they can be filtered and aggregated in SQL. Strengths, weaknesses, and
//! the label are derived values and are rebuilt on read.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, SqlitePool};
use uuid::Uuid;

use crate::domain::models::{
    CompositeAssessment, Dimension, DimensionAssessment, NormalizedScore, RatingLabel, Tier,
    TrialRecord,
};
use crate::domain::ports::errors::StoreError;
use crate::domain::ports::trial_repository::{TrialFilters, TrialRepository};
use crate::infrastructure::database::utils::{from_json, parse_datetime, to_json};

pub struct SqliteTrialRepository {
    pool: SqlitePool,
}

impl SqliteTrialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &SqliteRow) -> Result<TrialRecord, StoreError> {
    let id: String = row.get("id");
    let tier: String = row.get("tier");
    let tier = Tier::from_str(&tier)
        .ok_or_else(|| StoreError::InvalidValue(format!("unknown tier: {tier}")))?;
    let repetition: i64 = row.get("repetition");
    let word_count: i64 = row.get("word_count");
    let attempts_made: i64 = row.get("attempts_made");
    let tool_config: String = row.get("tool_config");
    let processing_metadata: String = row.get("processing_metadata");
    let dimension_scores: String = row.get("dimension_scores");
    let normalized_scores: String = row.get("normalized_scores");
    let started_at: String = row.get("started_at");
    let finished_at: String = row.get("finished_at");

    let dimensions: Vec<DimensionAssessment> = from_json(&dimension_scores)?;
    let normalized: Vec<NormalizedScore> = from_json(&normalized_scores)?;
    let overall_score: f64 = row.get("overall_score");
    let strengths: Vec<Dimension> = normalized
        .iter()
        .filter(|n| n.is_strength())
        .map(|n| n.dimension)
        .collect();
    let weaknesses: Vec<Dimension> = normalized
        .iter()
        .filter(|n| n.is_weakness())
        .map(|n| n.dimension)
        .collect();

    let assessment = CompositeAssessment {
        dimensions,
        normalized_scores: normalized,
        overall_score,
        confidence: row.get("confidence"),
        strengths,
        weaknesses,
        label: RatingLabel::from_overall(overall_score),
        reasoning: row.get("reasoning"),
    };

    Ok(TrialRecord {
        id: Uuid::parse_str(&id)?,
        experiment_id: row.get("experiment_id"),
        scenario_id: row.get("scenario_id"),
        domain: row.get("domain"),
        tier,
        repetition: u32::try_from(repetition)
            .map_err(|_| StoreError::InvalidValue(format!("negative repetition: {repetition}")))?,
        model_id: row.get("model_id"),
        tool_config: from_json(&tool_config)?,
        response_text: row.get("response_text"),
        word_count: usize::try_from(word_count)
            .map_err(|_| StoreError::InvalidValue(format!("negative word count: {word_count}")))?,
        processing_metadata: from_json(&processing_metadata)?,
        assessment,
        attempts_made: u32::try_from(attempts_made).unwrap_or(0),
        started_at: parse_datetime(&started_at)?,
        finished_at: parse_datetime(&finished_at)?,
        completed: row.get::<i64, _>("completed") != 0,
    })
}

fn apply_filters(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, filters: &TrialFilters) {
    if let Some(experiment_id) = &filters.experiment_id {
        builder.push(" AND experiment_id = ").push_bind(experiment_id.clone());
    }
    if let Some(domain) = &filters.domain {
        builder.push(" AND domain = ").push_bind(domain.clone());
    }
    if let Some(tier) = filters.tier {
        builder.push(" AND tier = ").push_bind(tier.as_str());
    }
    if let Some(model_id) = &filters.model_id {
        builder.push(" AND model_id = ").push_bind(model_id.clone());
    }
    if let Some(min) = filters.min_overall_score {
        builder.push(" AND overall_score >= ").push_bind(min);
    }
}

#[async_trait]
impl TrialRepository for SqliteTrialRepository {
    async fn insert(&self, record: &TrialRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO trials (
                id, experiment_id, scenario_id, domain, tier, repetition,
                model_id, tool_config, response_text, word_count,
                processing_metadata, dimension_scores, normalized_scores,
                overall_score, confidence, reasoning, attempts_made,
                started_at, finished_at, completed
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.experiment_id)
        .bind(&record.scenario_id)
        .bind(&record.domain)
        .bind(record.tier.as_str())
        .bind(i64::from(record.repetition))
        .bind(&record.model_id)
        .bind(to_json(&record.tool_config)?)
        .bind(&record.response_text)
        .bind(i64::try_from(record.word_count).unwrap_or(i64::MAX))
        .bind(to_json(&record.processing_metadata)?)
        .bind(to_json(&record.assessment.dimensions)?)
        .bind(to_json(&record.assessment.normalized_scores)?)
        .bind(record.assessment.overall_score)
        .bind(record.assessment.confidence)
        .bind(&record.assessment.reasoning)
        .bind(i64::from(record.attempts_made))
        .bind(record.started_at.to_rfc3339())
        .bind(record.finished_at.to_rfc3339())
        .bind(i64::from(record.completed))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, filters: TrialFilters) -> Result<Vec<TrialRecord>, StoreError> {
        let mut builder = QueryBuilder::new("SELECT * FROM trials WHERE 1=1");
        apply_filters(&mut builder, &filters);
        builder.push(" ORDER BY finished_at DESC");
        if let Some(limit) = filters.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn count(&self, filters: TrialFilters) -> Result<i64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM trials WHERE 1=1");
        apply_filters(&mut builder, &filters);
        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.get(0))
    }
}
