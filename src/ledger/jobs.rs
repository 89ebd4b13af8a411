use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::downscale::Downscaler;
use crate::error::{Entity, Error, Result};
use crate::models::{Algorithm, JobStatus, ProcessingJob};
use crate::store::Store;

// ---

#[derive(Clone)]
pub struct JobLedger {
    store: Arc<dyn Store>,
    downscaler: Arc<dyn Downscaler>,
    list_limit: u32,
}

impl JobLedger {
    pub fn new(store: Arc<dyn Store>, downscaler: Arc<dyn Downscaler>, list_limit: u32) -> Self {
        Self {
            store,
            downscaler,
            list_limit,
        }
    }

    /// Queue a job against an existing dataset.
    ///
    /// The dataset is checked before the algorithm name.
    pub async fn create(
        &self,
        dataset_id: Uuid,
        algorithm: &str,
        parameters: Map<String, Value>,
    ) -> Result<ProcessingJob> {
        // ---
        if self.store.get_dataset(dataset_id).await?.is_none() {
            return Err(Error::NotFound(Entity::Dataset));
        }
        let algorithm: Algorithm = algorithm.parse()?;

        let job = ProcessingJob {
            id: Uuid::new_v4(),
            dataset_id,
            algorithm,
            parameters,
            status: JobStatus::Queued,
            created_timestamp: Utc::now(),
            completed_timestamp: None,
            progress_percentage: 0,
            output_data: None,
            accuracy_metrics: None,
        };
        self.store.insert_job(&job).await?;

        info!(job_id = %job.id, %dataset_id, %algorithm, "Processing job queued");
        Ok(job)
    }

    pub async fn list(&self) -> Result<Vec<ProcessingJob>> {
        Ok(self.store.list_jobs(self.list_limit).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<ProcessingJob> {
        // ---
        match self.store.get_job(id).await? {
            Some(job) => Ok(job),
            None => {
                debug!(job_id = %id, "job lookup missed");
                Err(Error::NotFound(Entity::ProcessingJob))
            }
        }
    }

    /// Run the job to completion in one step.
    ///
    /// Any existing job is moved to `completed` with fresh output and
    /// metrics, including one that already completed.
    pub async fn simulate(&self, id: Uuid) -> Result<ProcessingJob> {
        // ---
        let mut job = self.get(id).await?;

        let run = self
            .downscaler
            .execute(job.algorithm, job.dataset_id, &job.parameters);

        job.status = JobStatus::Completed;
        job.completed_timestamp = Some(Utc::now());
        job.progress_percentage = 100;
        job.output_data = Some(run.output_data);
        job.accuracy_metrics = Some(run.accuracy_metrics);

        // The job may have been removed between the read and this write.
        if !self.store.update_job(&job).await? {
            return Err(Error::NotFound(Entity::ProcessingJob));
        }

        info!(
            job_id = %job.id,
            rmse = run.accuracy_metrics.rmse,
            r_squared = run.accuracy_metrics.r_squared,
            "Processing simulation completed"
        );
        Ok(job)
    }
}
