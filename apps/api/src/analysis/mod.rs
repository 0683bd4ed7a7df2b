// Resume analysis pipeline.
// Implements: preprocessing, job posting parsing, rubric scoring, job fit, assembly.
// All model calls go through llm_client::CompletionService.

pub mod assembler;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod jd_parser;
pub mod job_fit;
pub mod models;
pub mod pipeline;
pub mod preprocess;
pub mod prompts;
pub mod schema;
pub mod scoring;
pub mod stage;
