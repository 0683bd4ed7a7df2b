use std::time::Duration;

use thiserror::Error;

use crate::analysis::jd_parser::ExtractionError;
use crate::analysis::job_fit::JobFitError;
use crate::analysis::schema::ValidationError;
use crate::analysis::scoring::ScoringError;
use crate::llm_client::LlmError;
use crate::storage::StoreError;

/// Every way `ResumeAnalyzer::analyze` can fail. Nothing is stored on any of
/// them except an `Invariant` raised on the stored record, which names its id.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Resume content rejected before any AI call.
    #[error("invalid input: {0}")]
    Input(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("completion failed: {0}")]
    Completion(#[from] LlmError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("analysis did not finish within {0:?}")]
    Timeout(Duration),

    #[error("storage failed: {0}")]
    Storage(#[from] StoreError),

    #[error("pipeline invariant violated: {0}")]
    Invariant(String),
}

impl From<ScoringError> for PipelineError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::Completion(e) => PipelineError::Completion(e),
            ScoringError::Validation(e) => PipelineError::Validation(e),
        }
    }
}

impl From<JobFitError> for PipelineError {
    fn from(err: JobFitError) -> Self {
        match err {
            JobFitError::Completion(e) => PipelineError::Completion(e),
            JobFitError::Validation(e) => PipelineError::Validation(e),
        }
    }
}
