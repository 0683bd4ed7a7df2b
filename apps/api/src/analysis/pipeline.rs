//! `ResumeAnalyzer` drives one analysis from raw text to a stored record:
//! preprocess, parse the job posting, score, run job fit, assemble, persist.
//!
//! The AI stages are bounded by `AnalysisSettings::pipeline_timeout`; a write
//! handed to the store runs to completion. Every failure is logged once, here,
//! with the stage it happened in.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::analysis::assembler::assemble;
use crate::analysis::error::PipelineError;
use crate::analysis::fallback::fallback_review;
use crate::analysis::jd_parser::parse_job_description;
use crate::analysis::job_fit::analyze_job_fit;
use crate::analysis::models::{AnalysisResult, JobContext, NewAnalysis};
use crate::analysis::preprocess::Preprocessor;
use crate::analysis::scoring::{build_scoring_prompt, has_job_block, score_resume};
use crate::analysis::stage::{PipelineStage, StageTracker};
use crate::config::{AnalysisSettings, JobParseFailurePolicy};
use crate::llm_client::CompletionService;
use crate::storage::AnalysisStore;

/// Whether job fields are expected on this run, checked at every boundary
/// from ingestion to the stored record.
#[derive(Debug, Clone, Copy)]
struct JobPresence {
    expected: bool,
}

impl JobPresence {
    /// Fixed at ingestion from the request. `None` when a posting was supplied
    /// but may be dropped on a parse failure; settled once parsing finishes.
    fn from_input(job_text: Option<&str>, policy: JobParseFailurePolicy) -> Option<Self> {
        match (job_text, policy) {
            (None, _) => Some(Self { expected: false }),
            (Some(_), JobParseFailurePolicy::Abort) => Some(Self { expected: true }),
            (Some(_), JobParseFailurePolicy::Continue) => None,
        }
    }

    fn after_parsing(ingested: Option<Self>, job: &JobContext) -> Result<Self, PipelineError> {
        match ingested {
            Some(presence) => {
                presence.check("job parsing", job.is_present())?;
                Ok(presence)
            }
            None => Ok(Self {
                expected: job.is_present(),
            }),
        }
    }

    /// The job block is in the scoring prompt exactly when job fields are expected.
    fn check_prompt(self, prompt: &str) -> Result<(), PipelineError> {
        self.check("prompt construction", has_job_block(prompt))
    }

    fn check(self, boundary: &str, present: bool) -> Result<(), PipelineError> {
        if present == self.expected {
            return Ok(());
        }
        Err(self.violation(boundary, present))
    }

    /// Records carry two job fields; both or neither must be set.
    fn check_record(
        self,
        boundary: &str,
        has_all: bool,
        has_any: bool,
    ) -> Result<(), PipelineError> {
        let consistent = if self.expected { has_all } else { !has_any };
        if consistent {
            return Ok(());
        }
        Err(self.violation(boundary, has_any))
    }

    fn violation(self, boundary: &str, present: bool) -> PipelineError {
        PipelineError::Invariant(format!(
            "job fields expected {} but {} at {}",
            if self.expected { "present" } else { "absent" },
            if present { "found (possibly partial)" } else { "missing" },
            boundary
        ))
    }
}

pub struct ResumeAnalyzer {
    llm: Arc<dyn CompletionService>,
    preprocessor: Preprocessor,
    store: Arc<dyn AnalysisStore>,
    settings: AnalysisSettings,
}

impl ResumeAnalyzer {
    pub fn new(
        llm: Arc<dyn CompletionService>,
        store: Arc<dyn AnalysisStore>,
        settings: AnalysisSettings,
    ) -> Self {
        let preprocessor = Preprocessor::new(
            Arc::clone(&llm),
            settings.preprocess_threshold_chars,
            settings.preprocess_chunk_chars,
        );
        Self {
            llm,
            preprocessor,
            store,
            settings,
        }
    }

    /// Analyzes `resume_content` for `user_id`, optionally against a job posting,
    /// and stores the result. Nothing is stored when this returns an error,
    /// except for the post-write consistency failure described in `persist`.
    pub async fn analyze(
        &self,
        resume_content: &str,
        user_id: Uuid,
        job_text: Option<&str>,
    ) -> Result<AnalysisResult, PipelineError> {
        let mut tracker = StageTracker::start();
        let deadline = self.settings.pipeline_timeout;

        let prepared = tokio::time::timeout(
            deadline,
            self.prepare(resume_content, user_id, job_text, &mut tracker),
        )
        .await
        .unwrap_or(Err(PipelineError::Timeout(deadline)));

        let result = match prepared {
            Ok((analysis, presence)) => self.persist(analysis, presence, &mut tracker).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            error!(
                "Analysis failed for user {} at stage {} after {}ms (content_len={}): {}",
                user_id,
                tracker.stage(),
                tracker.elapsed_ms(),
                resume_content.chars().count(),
                e
            );
        }
        result
    }

    /// Every AI stage up to an assembled, checked record ready for the store.
    async fn prepare(
        &self,
        resume_content: &str,
        user_id: Uuid,
        job_text: Option<&str>,
        tracker: &mut StageTracker,
    ) -> Result<(NewAnalysis, JobPresence), PipelineError> {
        self.validate_input(resume_content, user_id)?;
        let job_text = job_text.filter(|text| !text.trim().is_empty());
        let ingested = JobPresence::from_input(job_text, self.settings.job_parse_failure);

        tracker.enter(PipelineStage::Preprocessing);
        let resume_text = self.preprocessor.preprocess(resume_content).await;

        let job = self.parse_job(job_text, tracker).await?;
        let presence = JobPresence::after_parsing(ingested, &job)?;

        tracker.enter(PipelineStage::Prompting);
        let prompt = build_scoring_prompt(&resume_text, job.description());
        presence.check_prompt(&prompt)?;
        let scored = score_resume(
            self.llm.as_ref(),
            prompt,
            self.settings.max_validation_retries,
            tracker,
        )
        .await;
        let (review, is_fallback) = match scored {
            Ok(review) => (review, false),
            Err(e) if self.settings.allow_fallback => {
                warn!("Scoring failed ({e}); storing fallback review for user {user_id}");
                (fallback_review(), true)
            }
            Err(e) => return Err(e.into()),
        };

        // Job fit reads the resume as submitted, not the summary scoring saw.
        let job = match job {
            JobContext::Parsed(description) => {
                tracker.enter(PipelineStage::JobFit);
                let feedback =
                    analyze_job_fit(self.llm.as_ref(), resume_content, &description).await?;
                JobContext::Analyzed {
                    description,
                    feedback,
                }
            }
            other => other,
        };

        presence.check("assembly", job.is_present())?;
        let analysis = assemble(
            user_id,
            resume_content,
            review,
            job,
            self.settings.stored_content_max_chars,
            is_fallback,
        )
        .map_err(|e| PipelineError::Invariant(e.to_string()))?;

        presence.check_record(
            "persistence",
            analysis.has_job_fields(),
            analysis.has_any_job_field(),
        )?;
        Ok((analysis, presence))
    }

    async fn persist(
        &self,
        analysis: NewAnalysis,
        presence: JobPresence,
        tracker: &mut StageTracker,
    ) -> Result<AnalysisResult, PipelineError> {
        tracker.enter(PipelineStage::Persisting);
        let user_id = analysis.user_id;
        let stored = self.store.create(analysis).await?;

        // The record is already written here. A mismatch means the store dropped
        // or invented job fields; the error names the record for cleanup.
        presence.check_record(
            &format!("stored record of analysis {}", stored.id),
            stored.has_job_fields(),
            stored.has_any_job_field(),
        )?;

        tracker.enter(PipelineStage::Done);
        debug!("Stages visited: {:?}", tracker.visited());
        info!(
            "Analysis {} stored for user {} in {}ms (score {}, job context: {}, fallback: {})",
            stored.id,
            user_id,
            tracker.elapsed_ms(),
            stored.overall_score,
            presence.expected,
            stored.is_fallback
        );
        Ok(stored)
    }

    fn validate_input(&self, resume_content: &str, user_id: Uuid) -> Result<(), PipelineError> {
        if user_id.is_nil() {
            return Err(PipelineError::Input("user id must not be nil".to_string()));
        }
        if resume_content.trim().is_empty() {
            return Err(PipelineError::Input("resume content is empty".to_string()));
        }
        let chars = resume_content.chars().count();
        if chars > self.settings.max_resume_chars {
            return Err(PipelineError::Input(format!(
                "resume content is {chars} characters; the limit is {}",
                self.settings.max_resume_chars
            )));
        }
        Ok(())
    }

    /// `job_text` is already free of blank postings.
    async fn parse_job(
        &self,
        job_text: Option<&str>,
        tracker: &mut StageTracker,
    ) -> Result<JobContext, PipelineError> {
        let Some(job_text) = job_text else {
            return Ok(JobContext::None);
        };

        tracker.enter(PipelineStage::JobParsing);
        match parse_job_description(job_text, self.llm.as_ref()).await {
            Ok(description) => Ok(JobContext::Parsed(description)),
            Err(e) => match self.settings.job_parse_failure {
                JobParseFailurePolicy::Abort => Err(e.into()),
                JobParseFailurePolicy::Continue => {
                    warn!("Job posting could not be parsed ({e}); continuing without job context");
                    Ok(JobContext::None)
                }
            },
        }
    }
}
