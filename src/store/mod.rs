//! Persistence seam for the ledgers.
//!
//! One [`Store`] handle is opened in `main`, shared as `Arc<dyn Store>` and
//! closed on shutdown. References between records are plain ids; no backend
//! enforces them.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::config::{Config, StoreBackend};
use crate::error::StoreError;
use crate::models::{
    Dataset, JobStatus, MapVisualization, ProcessingJob, StatusCheck, ValidationResult,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Per-ledger record counts at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub datasets: i64,
    pub processing_jobs: i64,
    pub validations: i64,
    pub visualizations: i64,
}

// ---

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn insert_dataset(&self, dataset: &Dataset) -> StoreResult<()>;
    async fn get_dataset(&self, id: Uuid) -> StoreResult<Option<Dataset>>;
    async fn list_datasets(&self, limit: u32) -> StoreResult<Vec<Dataset>>;
    /// Returns `false` when nothing was removed.
    async fn delete_dataset(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_job(&self, job: &ProcessingJob) -> StoreResult<()>;
    async fn get_job(&self, id: Uuid) -> StoreResult<Option<ProcessingJob>>;
    async fn list_jobs(&self, limit: u32) -> StoreResult<Vec<ProcessingJob>>;
    /// Overwrite a stored job. Returns `false` when the id is unknown.
    async fn update_job(&self, job: &ProcessingJob) -> StoreResult<bool>;

    async fn insert_validation(&self, result: &ValidationResult) -> StoreResult<()>;
    async fn list_validations(&self, limit: u32) -> StoreResult<Vec<ValidationResult>>;

    async fn insert_map(&self, map: &MapVisualization) -> StoreResult<()>;
    async fn get_map(&self, id: Uuid) -> StoreResult<Option<MapVisualization>>;
    async fn list_maps(&self, limit: u32) -> StoreResult<Vec<MapVisualization>>;

    async fn insert_status_check(&self, check: &StatusCheck) -> StoreResult<()>;
    async fn list_status_checks(&self, limit: u32) -> StoreResult<Vec<StatusCheck>>;

    async fn record_counts(&self) -> StoreResult<RecordCounts>;
    /// Only statuses with at least one job appear.
    async fn job_status_counts(&self) -> StoreResult<Vec<(JobStatus, i64)>>;

    /// Release connections. Called once during shutdown.
    async fn close(&self);
}

/// Open the backend selected by `cfg`, creating the schema when needed.
pub async fn connect(cfg: &Config) -> Result<Arc<dyn Store>> {
    // ---
    match cfg.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; records are lost on exit");
            Ok(Arc::new(MemoryStore::default()))
        }
        StoreBackend::Postgres => {
            let db_url = cfg.db_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("DATABASE_URL is required for the postgres backend")
            })?;

            tracing::info!("Attempting to connect to database: {}", cfg.masked_db_url());

            let pool = PgPoolOptions::new()
                .max_connections(cfg.db_pool_max)
                .connect(db_url)
                .await
                .map_err(|e| {
                    let url = cfg.masked_db_url();
                    anyhow::anyhow!("Failed to connect to database '{}': {}", url, e)
                })?;

            tracing::info!("Successfully connected to database");

            crate::schema::create_schema(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}
