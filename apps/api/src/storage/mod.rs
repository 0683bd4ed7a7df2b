//! Storage collaborator: create/read/list of analysis records.
//!
//! The pipeline only depends on `AnalysisStore`. PostgreSQL is the deployed
//! backend; the in-memory store serves local runs and tests.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::models::{AnalysisResult, NewAnalysis};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryAnalysisStore;
pub use postgres::PgAnalysisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Stores a new record and returns it with its id and creation time.
    async fn create(&self, analysis: NewAnalysis) -> Result<AnalysisResult, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<AnalysisResult>, StoreError>;

    /// All records owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<AnalysisResult>, StoreError>;

    /// Backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;
}
