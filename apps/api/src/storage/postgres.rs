use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{AnalysisStore, StoreError};
use crate::analysis::models::{AnalysisResult, NewAnalysis};
use crate::models::analysis::AnalysisRow;

#[derive(Clone)]
pub struct PgAnalysisStore {
    pool: PgPool,
}

impl PgAnalysisStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    async fn create(&self, analysis: NewAnalysis) -> Result<AnalysisResult, StoreError> {
        let id = Uuid::new_v4();

        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            INSERT INTO analyses
                (id, user_id, resume_content, overall_score, criteria, sections,
                 identified_skills, important_keywords, suggested_improvements,
                 general_feedback, job_specific_feedback, job_alignment, is_fallback)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(analysis.user_id)
        .bind(&analysis.resume_content)
        .bind(analysis.overall_score)
        .bind(Json(&analysis.criteria))
        .bind(Json(&analysis.sections))
        .bind(&analysis.identified_skills)
        .bind(&analysis.important_keywords)
        .bind(&analysis.suggested_improvements)
        .bind(&analysis.general_feedback)
        .bind(&analysis.job_specific_feedback)
        .bind(analysis.job_alignment.as_ref().map(Json))
        .bind(analysis.is_fallback)
        .fetch_one(&self.pool)
        .await?;

        info!("Stored analysis {} for user {}", row.id, row.user_id);
        Ok(row.into())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<AnalysisResult>, StoreError> {
        let row = sqlx::query_as::<_, AnalysisRow>("SELECT * FROM analyses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<AnalysisResult>, StoreError> {
        let rows = sqlx::query_as::<_, AnalysisRow>(
            "SELECT * FROM analyses WHERE user_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
