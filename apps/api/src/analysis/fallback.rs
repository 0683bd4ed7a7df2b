//! Canned review used ONLY outside production when scoring fails.
//!
//! Records built from it are stored with `is_fallback = true`.

use crate::analysis::models::{
    CriterionScore, ResumeReview, ResumeSections, ScoringCriteria, CRITERION_MAX_SCORE,
};

pub const FALLBACK_NOTICE: &str = "[FALLBACK] Automated scoring was unavailable for this request; \
    this placeholder review was generated without reading the resume.";

fn placeholder(score: i32, feedback: &str) -> CriterionScore {
    CriterionScore {
        score,
        max_score: CRITERION_MAX_SCORE,
        feedback: feedback.to_string(),
        evidence: vec!["placeholder: resume not evaluated".to_string()],
    }
}

pub fn fallback_review() -> ResumeReview {
    ResumeReview {
        overall_score: 50,
        criteria: ScoringCriteria {
            keyword_relevance: placeholder(5, "Placeholder: keyword relevance was not evaluated."),
            achievements_metrics: placeholder(5, "Placeholder: achievements were not evaluated."),
            structure_readability: placeholder(5, "Placeholder: structure was not evaluated."),
            summary_clarity: placeholder(5, "Placeholder: summary clarity was not evaluated."),
            overall_polish: placeholder(5, "Placeholder: polish was not evaluated."),
        },
        sections: ResumeSections {
            professional_summary: "Placeholder: not evaluated.".to_string(),
            work_experience: "Placeholder: not evaluated.".to_string(),
            technical_skills: "Placeholder: not evaluated.".to_string(),
            education: "Placeholder: not evaluated.".to_string(),
            key_achievements: "Placeholder: not evaluated.".to_string(),
        },
        identified_skills: vec![
            "Communication".to_string(),
            "Problem Solving".to_string(),
            "Teamwork".to_string(),
        ],
        important_keywords: vec![
            "results".to_string(),
            "leadership".to_string(),
            "impact".to_string(),
        ],
        suggested_improvements: vec![
            "Quantify achievements with numbers and percentages.".to_string(),
            "Open with a two-line professional summary.".to_string(),
            "Group skills by category and name specific tools.".to_string(),
        ],
        general_feedback: FALLBACK_NOTICE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::schema::Schema;

    #[test]
    fn test_fallback_review_passes_the_scoring_schema() {
        let mut review = fallback_review();
        assert!(review.validate().is_ok());
        review.normalize();
        assert_eq!(review, fallback_review());
    }

    #[test]
    fn test_fallback_review_is_labeled() {
        assert!(fallback_review().general_feedback.starts_with("[FALLBACK]"));
    }
}
