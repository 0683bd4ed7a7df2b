//! Result Assembler: merges the review and the job context into one record.

use thiserror::Error;
use uuid::Uuid;

use crate::analysis::models::{JobAlignment, JobContext, NewAnalysis, ResumeReview};

/// Shorter names only match by equality, so "R" does not match "React".
const MIN_CONTAINMENT_CHARS: usize = 3;

#[derive(Debug, Error)]
#[error("job description reached assembly without job-fit feedback")]
pub struct IncompleteJobContext;

/// Truncates on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

fn skills_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return true;
    }
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    short.chars().count() >= MIN_CONTAINMENT_CHARS && long.contains(short.as_str())
}

/// Splits the job's skills into those the review identified and those it did not.
pub fn skill_overlap(identified: &[String], job_skills: &[String]) -> (Vec<String>, Vec<String>) {
    job_skills
        .iter()
        .cloned()
        .partition(|skill| identified.iter().any(|found| skills_match(found, skill)))
}

/// Builds the record to store. `JobContext::Parsed` here means the job-fit step
/// was skipped, which is refused rather than stored half-populated.
pub fn assemble(
    user_id: Uuid,
    resume_content: &str,
    review: ResumeReview,
    job: JobContext,
    stored_content_max_chars: usize,
    is_fallback: bool,
) -> Result<NewAnalysis, IncompleteJobContext> {
    let (job_specific_feedback, job_alignment) = match job {
        JobContext::None => (None, None),
        JobContext::Parsed(_) => return Err(IncompleteJobContext),
        JobContext::Analyzed {
            description,
            feedback,
        } => {
            let (matched_skills, missing_skills) =
                skill_overlap(&review.identified_skills, description.skills());
            (
                Some(feedback),
                Some(JobAlignment {
                    job_description: description,
                    matched_skills,
                    missing_skills,
                }),
            )
        }
    };

    Ok(NewAnalysis {
        user_id,
        resume_content: truncate_chars(resume_content, stored_content_max_chars),
        overall_score: review.overall_score,
        criteria: review.criteria,
        sections: review.sections,
        identified_skills: review.identified_skills,
        important_keywords: review.important_keywords,
        suggested_improvements: review.suggested_improvements,
        general_feedback: review.general_feedback,
        job_specific_feedback,
        job_alignment,
        is_fallback,
    })
}
