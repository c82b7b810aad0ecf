use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries;
use crate::models::prediction::PredictionResult;

/// Durable key-value record of completed predictions, keyed by job id.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Idempotent write: storing the same result twice leaves one record
    /// with identical content.
    async fn put_item(&self, result: &PredictionResult) -> Result<(), ResultStoreError>;

    async fn get_item(&self, job_id: Uuid) -> Result<Option<PredictionResult>, ResultStoreError>;
}

/// PostgreSQL-backed result store.
pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn put_item(&self, result: &PredictionResult) -> Result<(), ResultStoreError> {
        queries::upsert_prediction(&self.pool, result).await?;
        Ok(())
    }

    async fn get_item(&self, job_id: Uuid) -> Result<Option<PredictionResult>, ResultStoreError> {
        let result = queries::get_prediction(&self.pool, job_id).await?;
        Ok(result)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResultStoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
