//! Job Description Parser: extracts structured fields from a raw job posting.
//!
//! One extraction call, then the schema boundary. There is no silent fallback:
//! any failure is an `ExtractionError` and the caller decides whether to
//! continue without job context.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::analysis::models::JobDescription;
use crate::analysis::prompts::{render, JOB_PARSE_PROMPT_TEMPLATE, JOB_PARSE_SYSTEM};
use crate::analysis::schema::{parse_response, ValidationError};
use crate::llm_client::{CompletionRequest, CompletionService, LlmError};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("job posting is empty once markup is removed")]
    EmptyPosting,

    #[error("job posting extraction call failed: {0}")]
    Completion(#[from] LlmError),

    #[error("job posting extraction returned unusable output: {0}")]
    Invalid(#[from] ValidationError),
}

/// Strips HTML markup and entities and collapses whitespace.
pub fn clean_job_text(raw: &str) -> String {
    static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>").expect("valid regex")
    });
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let text = SCRIPT_RE.replace_all(raw, " ");
    let text = TAG_RE.replace_all(&text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WS_RE.replace_all(&text, " ").trim().to_string()
}

/// Parses a job posting into a validated `JobDescription`.
pub async fn parse_job_description(
    job_text: &str,
    llm: &dyn CompletionService,
) -> Result<JobDescription, ExtractionError> {
    let cleaned = clean_job_text(job_text);
    if cleaned.is_empty() {
        return Err(ExtractionError::EmptyPosting);
    }

    let prompt = render(JOB_PARSE_PROMPT_TEMPLATE, &[("job_text", cleaned.as_str())]);
    let raw = llm
        .complete(CompletionRequest::json(JOB_PARSE_SYSTEM, prompt))
        .await?;

    let job = parse_response::<JobDescription>(&raw).into_result()?;
    info!(
        "Job posting parsed: role={:?}, {} skills, {} requirements",
        job.role_title,
        job.skills().len(),
        job.requirements().len()
    );
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::schema::Schema;
    use crate::testing::{sample_job_json, ScriptedCompletion, SEO_JOB_POSTING};

    const STARTUP_POSTING: &str = r#"
        <div class="jd"><h1>Growth Marketing Lead</h1>
        <script>trackView();</script>
        <p>We move fast &amp; own the funnel.</p>
        <ul><li>3+ years&nbsp;in growth</li><li>SEO &lt;required&gt;</li></ul></div>
    "#;

    #[test]
    fn test_clean_job_text_strips_markup_and_entities() {
        assert_eq!(
            clean_job_text(STARTUP_POSTING),
            "Growth Marketing Lead We move fast & own the funnel. 3+ years in growth SEO <required>"
        );
    }

    #[test]
    fn test_clean_job_text_collapses_whitespace() {
        assert_eq!(
            clean_job_text("  5+ years\n\n\trequired,   SEO skills "),
            "5+ years required, SEO skills"
        );
    }

    #[tokio::test]
    async fn test_parse_sends_cleaned_text_with_zero_temperature() {
        let llm = ScriptedCompletion::always(&sample_job_json());
        let job = parse_job_description(SEO_JOB_POSTING, &llm).await.unwrap();

        assert_eq!(job.role_title.as_deref(), Some("Marketing Manager"));
        assert_eq!(job.years_of_experience, Some(5.0));
        assert!(job.skills().iter().any(|s| s == "SEO"));
        assert!(job.company.is_none());

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system, JOB_PARSE_SYSTEM);
        assert_eq!(calls[0].temperature, 0.0);
        assert!(calls[0].prompt.contains("Marketing Manager 5+ years required, SEO skills"));
        assert!(!calls[0].prompt.contains("<h2>"));
    }

    #[tokio::test]
    async fn test_parsed_job_revalidates_cleanly() {
        let llm = ScriptedCompletion::always(&sample_job_json());
        let job = parse_job_description(SEO_JOB_POSTING, &llm).await.unwrap();
        assert!(job.validate().is_ok());
    }

    #[tokio::test]
    async fn test_markup_only_posting_is_rejected_before_any_call() {
        let llm = ScriptedCompletion::always(&sample_job_json());
        let err = parse_job_description("<div> <br/> </div>", &llm)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyPosting));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_response_is_extraction_error() {
        let llm = ScriptedCompletion::always("Sure! Here is the JSON: {role_title: ");
        let err = parse_job_description(SEO_JOB_POSTING, &llm)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Invalid(ValidationError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_object_fails_schema() {
        let llm = ScriptedCompletion::always("{}");
        let err = parse_job_description(SEO_JOB_POSTING, &llm)
            .await
            .unwrap_err();
        match err {
            ExtractionError::Invalid(ValidationError::Schema(violation)) => {
                assert_eq!(violation.fields(), vec!["job_description"]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_extraction_error() {
        let llm = ScriptedCompletion::new(|_| {
            Err(LlmError::Api {
                status: 400,
                message: "bad request".to_string(),
            })
        });
        let err = parse_job_description(SEO_JOB_POSTING, &llm)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Completion(_)));
    }
}
