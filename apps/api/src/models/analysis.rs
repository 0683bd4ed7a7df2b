use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::models::{AnalysisResult, JobAlignment, ResumeSections, ScoringCriteria};

/// Row of the `analyses` table. Job columns are nullable rather than omitted.
#[derive(Debug, Clone, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_content: String,
    pub overall_score: i32,
    pub criteria: Json<ScoringCriteria>,
    pub sections: Json<ResumeSections>,
    pub identified_skills: Vec<String>,
    pub important_keywords: Vec<String>,
    pub suggested_improvements: Vec<String>,
    pub general_feedback: String,
    pub job_specific_feedback: Option<String>,
    pub job_alignment: Option<Json<JobAlignment>>,
    pub is_fallback: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AnalysisRow> for AnalysisResult {
    fn from(row: AnalysisRow) -> Self {
        AnalysisResult {
            id: row.id,
            user_id: row.user_id,
            resume_content: row.resume_content,
            overall_score: row.overall_score,
            criteria: row.criteria.0,
            sections: row.sections.0,
            identified_skills: row.identified_skills,
            important_keywords: row.important_keywords,
            suggested_improvements: row.suggested_improvements,
            general_feedback: row.general_feedback,
            job_specific_feedback: row.job_specific_feedback,
            job_alignment: row.job_alignment.map(|j| j.0),
            is_fallback: row.is_fallback,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::JobDescription;
    use crate::testing::sample_review;

    #[test]
    fn test_row_converts_with_nullable_job_columns() {
        let review = sample_review();
        let row = AnalysisRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            resume_content: "Marketing manager".to_string(),
            overall_score: review.overall_score,
            criteria: Json(review.criteria.clone()),
            sections: Json(review.sections.clone()),
            identified_skills: review.identified_skills.clone(),
            important_keywords: review.important_keywords.clone(),
            suggested_improvements: review.suggested_improvements.clone(),
            general_feedback: review.general_feedback.clone(),
            job_specific_feedback: None,
            job_alignment: None,
            is_fallback: false,
            created_at: Utc::now(),
        };

        let result = AnalysisResult::from(row.clone());
        assert_eq!(result.id, row.id);
        assert_eq!(result.criteria, review.criteria);
        assert!(!result.has_any_job_field());

        let with_job = AnalysisRow {
            job_specific_feedback: Some("Aligned".to_string()),
            job_alignment: Some(Json(JobAlignment {
                job_description: JobDescription {
                    role_title: Some("Marketing Manager".to_string()),
                    ..Default::default()
                },
                matched_skills: vec!["SEO".to_string()],
                missing_skills: vec![],
            })),
            ..row
        };
        assert!(AnalysisResult::from(with_job).has_job_fields());
    }
}
