use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AnalysisStore, StoreError};
use crate::analysis::models::{AnalysisResult, NewAnalysis};

/// Process-local store. Records are kept in creation order.
#[derive(Default)]
pub struct InMemoryAnalysisStore {
    records: RwLock<Vec<AnalysisResult>>,
}

#[cfg(test)]
impl InMemoryAnalysisStore {
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl AnalysisStore for InMemoryAnalysisStore {
    async fn create(&self, analysis: NewAnalysis) -> Result<AnalysisResult, StoreError> {
        let record = AnalysisResult::from_new(Uuid::new_v4(), Utc::now(), analysis);
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<AnalysisResult>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<AnalysisResult>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
