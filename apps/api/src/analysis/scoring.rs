//! Resume Scoring Orchestrator: composite prompt, one completion, strict validation.
//!
//! Flow: build prompt (rubric + resume + optional job block) → one JSON completion
//! at temperature 0 → schema boundary → `ResumeReview` or a field-level error.
//! The caller builds the prompt so it can inspect it before anything is sent.
//!
//! Re-prompting on invalid output is off by default (`max_validation_retries = 0`).
//! Completion failures are never retried here; the LLM client owns transport retries.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::models::{JobDescription, ResumeReview};
use crate::analysis::prompts::{
    render, JOB_CONTEXT_HEADING, JOB_CONTEXT_TEMPLATE, SCORING_PROMPT_TEMPLATE, SCORING_SYSTEM,
};
use crate::analysis::schema::{parse_response, ParsedResponse, ValidationError};
use crate::analysis::stage::{PipelineStage, StageTracker};
use crate::llm_client::prompts::EVIDENCE_INSTRUCTION;
use crate::llm_client::{CompletionRequest, CompletionService, LlmError};

/// Requirements listed in the job block.
const MAX_PROMPT_REQUIREMENTS: usize = 10;
/// Gap between the model's overall score and the weighted rubric worth logging.
const SCORE_DIVERGENCE_WARN: f64 = 20.0;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring completion failed: {0}")]
    Completion(#[from] LlmError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Builds the composite scoring prompt. The job block only biases the model;
/// the requested output shape is identical with or without it.
pub fn build_scoring_prompt(resume_text: &str, job: Option<&JobDescription>) -> String {
    let job_context = job.map(build_job_context).unwrap_or_default();
    render(
        SCORING_PROMPT_TEMPLATE,
        &[
            ("evidence_instruction", EVIDENCE_INSTRUCTION),
            ("job_context", job_context.as_str()),
            ("resume_text", resume_text),
        ],
    )
}

/// Whether a built scoring prompt carries the job block.
pub fn has_job_block(prompt: &str) -> bool {
    prompt.contains(JOB_CONTEXT_HEADING)
}

fn build_job_context(job: &JobDescription) -> String {
    let role = job.role_title.as_deref().unwrap_or("Not specified");
    let experience = job
        .years_of_experience
        .map(|years| format!("{years}+ years"))
        .unwrap_or_else(|| "Not specified".to_string());
    let skills = if job.skills().is_empty() {
        "Not specified".to_string()
    } else {
        job.skills().join(", ")
    };
    let requirements = if job.requirements().is_empty() {
        "  - Not specified".to_string()
    } else {
        job.requirements()
            .iter()
            .take(MAX_PROMPT_REQUIREMENTS)
            .map(|r| format!("  - {r}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    render(
        JOB_CONTEXT_TEMPLATE,
        &[
            ("role", role),
            ("experience", experience.as_str()),
            ("skills", skills.as_str()),
            ("requirements", requirements.as_str()),
        ],
    )
}

/// Scores a resume from a prompt made by `build_scoring_prompt`. Issues one
/// completion per attempt; with `max_validation_retries = 0` that is exactly one call.
pub async fn score_resume(
    llm: &dyn CompletionService,
    prompt: String,
    max_validation_retries: u32,
    tracker: &mut StageTracker,
) -> Result<ResumeReview, ScoringError> {
    let request = CompletionRequest::json(SCORING_SYSTEM, prompt);

    let mut last_error = None;
    for attempt in 0..=max_validation_retries {
        tracker.enter(PipelineStage::AwaitingCompletion);
        let raw = llm.complete(request.clone()).await?;

        tracker.enter(PipelineStage::Validating);
        match parse_response::<ResumeReview>(&raw) {
            ParsedResponse::Ok(review) => {
                log_score_divergence(&review);
                info!(
                    "Resume scored {}/100 on attempt {}",
                    review.overall_score,
                    attempt + 1
                );
                return Ok(review);
            }
            ParsedResponse::ParseError(message) => {
                warn!(
                    "Scoring attempt {}/{}: response is not valid JSON: {}",
                    attempt + 1,
                    max_validation_retries + 1,
                    message
                );
                last_error = Some(ValidationError::Malformed(message));
            }
            ParsedResponse::SchemaError(violation) => {
                warn!(
                    "Scoring attempt {}/{}: {}",
                    attempt + 1,
                    max_validation_retries + 1,
                    violation
                );
                last_error = Some(ValidationError::Schema(violation));
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| ValidationError::Malformed("no scoring attempt was made".to_string()))
        .into())
}

fn log_score_divergence(review: &ResumeReview) {
    let weighted = review.criteria.weighted_score();
    let gap = (review.overall_score as f64 - weighted).abs();
    if gap > SCORE_DIVERGENCE_WARN {
        warn!(
            "Model overall score {} diverges from weighted rubric {:.1}",
            review.overall_score, weighted
        );
    } else {
        debug!(
            "Model overall score {} vs weighted rubric {:.1}",
            review.overall_score, weighted
        );
    }
}
