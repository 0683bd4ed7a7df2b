use std::sync::Arc;

use crate::analysis::pipeline::ResumeAnalyzer;
use crate::config::Config;
use crate::llm_client::CompletionService;
use crate::storage::AnalysisStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<ResumeAnalyzer>,
    /// Read side of the store; writes only happen inside the analyzer.
    pub store: Arc<dyn AnalysisStore>,
    /// Rate-limited completion service, shared with the analyzer.
    pub llm: Arc<dyn CompletionService>,
    pub config: Config,
}
