//! Job-Fit Analyzer: narrative comparison of a resume against a parsed job description.
//!
//! The narrative is opaque: the only enforced constraint is that it is not blank.

use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::models::JobDescription;
use crate::analysis::prompts::{render, JOB_FIT_PROMPT_TEMPLATE, JOB_FIT_SYSTEM};
use crate::analysis::schema::{SchemaViolation, ValidationError};
use crate::llm_client::prompts::EVIDENCE_INSTRUCTION;
use crate::llm_client::{CompletionRequest, CompletionService, LlmError, DEFAULT_MAX_TOKENS};

pub const TARGET_NARRATIVE_WORDS: usize = 500;
const JOB_FIT_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Error)]
pub enum JobFitError {
    #[error("job-fit completion failed: {0}")]
    Completion(#[from] LlmError),

    #[error("job-fit narrative rejected: {0}")]
    Validation(#[from] ValidationError),
}

pub fn build_job_fit_prompt(
    resume_text: &str,
    job: &JobDescription,
) -> Result<String, serde_json::Error> {
    let job_json = serde_json::to_string_pretty(job)?;
    Ok(render(
        JOB_FIT_PROMPT_TEMPLATE,
        &[
            ("evidence_instruction", EVIDENCE_INSTRUCTION),
            ("job_json", job_json.as_str()),
            ("resume_text", resume_text),
        ],
    ))
}

/// Requests the job-fit narrative. Short narratives are logged, blank ones rejected.
pub async fn analyze_job_fit(
    llm: &dyn CompletionService,
    resume_text: &str,
    job: &JobDescription,
) -> Result<String, JobFitError> {
    let prompt = build_job_fit_prompt(resume_text, job).map_err(|e| {
        ValidationError::Schema(SchemaViolation::single(
            "job_description",
            format!("could not be serialized for the prompt: {e}"),
        ))
    })?;

    let request = CompletionRequest::text(JOB_FIT_SYSTEM, prompt)
        .with_temperature(JOB_FIT_TEMPERATURE)
        .with_max_tokens(DEFAULT_MAX_TOKENS);
    let narrative = llm.complete(request).await?;
    let narrative = narrative.trim();

    if narrative.is_empty() {
        return Err(ValidationError::Schema(SchemaViolation::single(
            "job_specific_feedback",
            "must not be blank",
        ))
        .into());
    }

    let words = narrative.split_whitespace().count();
    if words < TARGET_NARRATIVE_WORDS {
        warn!(
            "Job-fit narrative is {} words (target {})",
            words, TARGET_NARRATIVE_WORDS
        );
    } else {
        info!("Job-fit narrative generated: {} words", words);
    }

    Ok(narrative.to_string())
}
