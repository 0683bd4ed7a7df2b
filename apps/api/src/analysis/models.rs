//! Domain records for the analysis pipeline.
//!
//! `JobDescription` and `ResumeReview` are what the model returns (after the
//! schema boundary has normalized and validated them). `NewAnalysis` is the
//! assembled, not-yet-stored record; `AnalysisResult` is what the store hands back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every criterion is scored out of this fixed maximum.
pub const CRITERION_MAX_SCORE: i32 = 10;
pub const CRITERION_MIN_SCORE: i32 = 1;

// ────────────────────────────────────────────────────────────────────────────
// Job description
// ────────────────────────────────────────────────────────────────────────────

/// Structured fields extracted from a job posting. Every field is optional.
/// `primary_keywords` and `skills` are sets; `requirements` keeps posting order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    pub role_title: Option<String>,
    pub years_of_experience: Option<f32>,
    pub industry: Option<String>,
    pub company: Option<String>,
    pub primary_keywords: Option<Vec<String>>,
    pub summary: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
}

impl JobDescription {
    pub fn skills(&self) -> &[String] {
        self.skills.as_deref().unwrap_or(&[])
    }

    pub fn requirements(&self) -> &[String] {
        self.requirements.as_deref().unwrap_or(&[])
    }

    pub fn primary_keywords(&self) -> &[String] {
        self.primary_keywords.as_deref().unwrap_or(&[])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// One rubric dimension as scored by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub score: i32,
    pub max_score: i32,
    pub feedback: String,
    /// Keywords or highlights quoted from the resume that justify the score.
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// The five-dimension rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringCriteria {
    pub keyword_relevance: CriterionScore,
    pub achievements_metrics: CriterionScore,
    pub structure_readability: CriterionScore,
    pub summary_clarity: CriterionScore,
    pub overall_polish: CriterionScore,
}

impl ScoringCriteria {
    /// Dimension name, weight, and score, in rubric order. Weights sum to 1.0.
    pub fn dimensions(&self) -> [(&'static str, f64, &CriterionScore); 5] {
        [
            ("keyword_relevance", 0.30, &self.keyword_relevance),
            ("achievements_metrics", 0.25, &self.achievements_metrics),
            ("structure_readability", 0.20, &self.structure_readability),
            ("summary_clarity", 0.15, &self.summary_clarity),
            ("overall_polish", 0.10, &self.overall_polish),
        ]
    }

    /// Weighted composite on a 0–100 scale.
    pub fn weighted_score(&self) -> f64 {
        self.dimensions()
            .iter()
            .map(|(_, weight, c)| weight * c.score as f64 / CRITERION_MAX_SCORE as f64)
            .sum::<f64>()
            * 100.0
    }
}

/// Narrative feedback per resume section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSections {
    pub professional_summary: String,
    pub work_experience: String,
    pub technical_skills: String,
    pub education: String,
    pub key_achievements: String,
}

impl ResumeSections {
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("professional_summary", self.professional_summary.as_str()),
            ("work_experience", self.work_experience.as_str()),
            ("technical_skills", self.technical_skills.as_str()),
            ("education", self.education.as_str()),
            ("key_achievements", self.key_achievements.as_str()),
        ]
    }
}

/// Validated output of the scoring completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeReview {
    pub overall_score: i32,
    pub criteria: ScoringCriteria,
    pub sections: ResumeSections,
    pub identified_skills: Vec<String>,
    pub important_keywords: Vec<String>,
    pub suggested_improvements: Vec<String>,
    pub general_feedback: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Job alignment
// ────────────────────────────────────────────────────────────────────────────

/// Job-alignment object stored alongside the job-specific narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAlignment {
    pub job_description: JobDescription,
    /// Job skills that also appear among the review's identified skills.
    pub matched_skills: Vec<String>,
    /// Job skills the review did not identify.
    pub missing_skills: Vec<String>,
}

/// Job context carried through the pipeline. Description and narrative travel
/// together so neither can be dropped independently on the way to storage.
#[derive(Debug, Clone, PartialEq)]
pub enum JobContext {
    None,
    Parsed(JobDescription),
    Analyzed {
        description: JobDescription,
        feedback: String,
    },
}

impl JobContext {
    pub fn description(&self) -> Option<&JobDescription> {
        match self {
            JobContext::None => None,
            JobContext::Parsed(description) | JobContext::Analyzed { description, .. } => {
                Some(description)
            }
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, JobContext::None)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

/// An assembled analysis waiting to be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAnalysis {
    pub user_id: Uuid,
    pub resume_content: String,
    pub overall_score: i32,
    pub criteria: ScoringCriteria,
    pub sections: ResumeSections,
    pub identified_skills: Vec<String>,
    pub important_keywords: Vec<String>,
    pub suggested_improvements: Vec<String>,
    pub general_feedback: String,
    pub job_specific_feedback: Option<String>,
    pub job_alignment: Option<JobAlignment>,
    pub is_fallback: bool,
}

impl NewAnalysis {
    pub fn has_job_fields(&self) -> bool {
        self.job_specific_feedback.is_some() && self.job_alignment.is_some()
    }

    pub fn has_any_job_field(&self) -> bool {
        self.job_specific_feedback.is_some() || self.job_alignment.is_some()
    }
}

/// A stored analysis. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_content: String,
    pub overall_score: i32,
    pub criteria: ScoringCriteria,
    pub sections: ResumeSections,
    pub identified_skills: Vec<String>,
    pub important_keywords: Vec<String>,
    pub suggested_improvements: Vec<String>,
    pub general_feedback: String,
    pub job_specific_feedback: Option<String>,
    pub job_alignment: Option<JobAlignment>,
    pub is_fallback: bool,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn from_new(id: Uuid, created_at: DateTime<Utc>, new: NewAnalysis) -> Self {
        Self {
            id,
            user_id: new.user_id,
            resume_content: new.resume_content,
            overall_score: new.overall_score,
            criteria: new.criteria,
            sections: new.sections,
            identified_skills: new.identified_skills,
            important_keywords: new.important_keywords,
            suggested_improvements: new.suggested_improvements,
            general_feedback: new.general_feedback,
            job_specific_feedback: new.job_specific_feedback,
            job_alignment: new.job_alignment,
            is_fallback: new.is_fallback,
            created_at,
        }
    }

    pub fn has_job_fields(&self) -> bool {
        self.job_specific_feedback.is_some() && self.job_alignment.is_some()
    }

    pub fn has_any_job_field(&self) -> bool {
        self.job_specific_feedback.is_some() || self.job_alignment.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_review;

    #[test]
    fn test_job_description_missing_fields_deserialize_as_none() {
        let job: JobDescription =
            serde_json::from_str(r#"{"role_title": "SEO Specialist", "skills": null}"#).unwrap();
        assert_eq!(job.role_title.as_deref(), Some("SEO Specialist"));
        assert!(job.skills.is_none());
        assert!(job.skills().is_empty());
        assert!(job.years_of_experience.is_none());
    }

    #[test]
    fn test_job_description_serializes_absent_fields_as_null() {
        let json = serde_json::to_value(JobDescription::default()).unwrap();
        assert!(json.get("company").unwrap().is_null());
        assert!(json.get("requirements").unwrap().is_null());
    }

    #[test]
    fn test_weights_sum_to_one() {
        let review = sample_review();
        let total: f64 = review.criteria.dimensions().iter().map(|(_, w, _)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_score_of_perfect_criteria_is_100() {
        let mut criteria = sample_review().criteria;
        for c in [
            &mut criteria.keyword_relevance,
            &mut criteria.achievements_metrics,
            &mut criteria.structure_readability,
            &mut criteria.summary_clarity,
            &mut criteria.overall_polish,
        ] {
            c.score = CRITERION_MAX_SCORE;
        }
        assert!((criteria.weighted_score() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_job_context_description_access() {
        let description = JobDescription {
            role_title: Some("Marketing Lead".to_string()),
            ..Default::default()
        };
        assert!(JobContext::None.description().is_none());
        assert!(!JobContext::None.is_present());

        let parsed = JobContext::Parsed(description.clone());
        assert_eq!(parsed.description(), Some(&description));

        let analyzed = JobContext::Analyzed {
            description: description.clone(),
            feedback: "Strong fit".to_string(),
        };
        assert!(analyzed.is_present());
        assert_eq!(analyzed.description(), Some(&description));
    }
}
