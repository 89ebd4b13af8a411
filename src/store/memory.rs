//! Process-local store used by tests and `STORE_BACKEND=memory`.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RecordCounts, Store, StoreResult};
use crate::models::{
    Dataset, JobStatus, MapVisualization, ProcessingJob, StatusCheck, ValidationResult,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    datasets: RwLock<HashMap<Uuid, Dataset>>,
    jobs: RwLock<HashMap<Uuid, ProcessingJob>>,
    validations: RwLock<HashMap<Uuid, ValidationResult>>,
    maps: RwLock<HashMap<Uuid, MapVisualization>>,
    status_checks: RwLock<HashMap<Uuid, StatusCheck>>,
}

/// Oldest first, at most `limit` records.
fn sorted_by<T: Clone>(
    records: &HashMap<Uuid, T>,
    limit: u32,
    created: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut out: Vec<T> = records.values().cloned().collect();
    out.sort_by_key(|r| created(r));
    out.truncate(limit as usize);
    out
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_dataset(&self, dataset: &Dataset) -> StoreResult<()> {
        self.datasets.write().await.insert(dataset.id, dataset.clone());
        Ok(())
    }

    async fn get_dataset(&self, id: Uuid) -> StoreResult<Option<Dataset>> {
        Ok(self.datasets.read().await.get(&id).cloned())
    }

    async fn list_datasets(&self, limit: u32) -> StoreResult<Vec<Dataset>> {
        Ok(sorted_by(&*self.datasets.read().await, limit, |d| d.upload_timestamp))
    }

    async fn delete_dataset(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.datasets.write().await.remove(&id).is_some())
    }

    async fn insert_job(&self, job: &ProcessingJob) -> StoreResult<()> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<ProcessingJob>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn list_jobs(&self, limit: u32) -> StoreResult<Vec<ProcessingJob>> {
        Ok(sorted_by(&*self.jobs.read().await, limit, |j| j.created_timestamp))
    }

    async fn update_job(&self, job: &ProcessingJob) -> StoreResult<bool> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_validation(&self, result: &ValidationResult) -> StoreResult<()> {
        self.validations.write().await.insert(result.id, result.clone());
        Ok(())
    }

    async fn list_validations(&self, limit: u32) -> StoreResult<Vec<ValidationResult>> {
        Ok(sorted_by(&*self.validations.read().await, limit, |v| {
            v.validation_timestamp
        }))
    }

    async fn insert_map(&self, map: &MapVisualization) -> StoreResult<()> {
        self.maps.write().await.insert(map.id, map.clone());
        Ok(())
    }

    async fn get_map(&self, id: Uuid) -> StoreResult<Option<MapVisualization>> {
        Ok(self.maps.read().await.get(&id).cloned())
    }

    async fn list_maps(&self, limit: u32) -> StoreResult<Vec<MapVisualization>> {
        Ok(sorted_by(&*self.maps.read().await, limit, |m| m.created_timestamp))
    }

    async fn insert_status_check(&self, check: &StatusCheck) -> StoreResult<()> {
        self.status_checks.write().await.insert(check.id, check.clone());
        Ok(())
    }

    async fn list_status_checks(&self, limit: u32) -> StoreResult<Vec<StatusCheck>> {
        Ok(sorted_by(&*self.status_checks.read().await, limit, |c| c.timestamp))
    }

    async fn record_counts(&self) -> StoreResult<RecordCounts> {
        // Each ledger is read under its own lock; the snapshot may be torn.
        Ok(RecordCounts {
            datasets: self.datasets.read().await.len() as i64,
            processing_jobs: self.jobs.read().await.len() as i64,
            validations: self.validations.read().await.len() as i64,
            visualizations: self.maps.read().await.len() as i64,
        })
    }

    async fn job_status_counts(&self) -> StoreResult<Vec<(JobStatus, i64)>> {
        let mut counts: BTreeMap<JobStatus, i64> = BTreeMap::new();
        for job in self.jobs.read().await.values() {
            *counts.entry(job.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn close(&self) {
        tracing::debug!("memory store closed");
    }
}
