use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Entity, Error, Result};
use crate::models::{DataFormat, Dataset, ProcessingStatus, SatelliteSource};
use crate::store::Store;

// ---

#[derive(Clone)]
pub struct DatasetLedger {
    store: Arc<dyn Store>,
    list_limit: u32,
}

impl DatasetLedger {
    pub fn new(store: Arc<dyn Store>, list_limit: u32) -> Self {
        Self { store, list_limit }
    }

    /// Record an uploaded file.
    ///
    /// `file_size` is the length of `content` as received. Format and source
    /// are checked before anything is written, so a rejected upload leaves
    /// no record behind.
    pub async fn upload(
        &self,
        filename: &str,
        content: &[u8],
        data_format: &str,
        satellite_source: &str,
    ) -> Result<Dataset> {
        // ---
        let data_format = DataFormat::parse_lenient(data_format)?;
        let satellite_source: SatelliteSource = satellite_source.parse()?;

        let file_size = i64::try_from(content.len())
            .map_err(|_| Error::Upload(format!("{} bytes exceeds size range", content.len())))?;

        let dataset = Dataset {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            file_size,
            upload_timestamp: Utc::now(),
            data_format,
            satellite_source,
            processing_status: ProcessingStatus::Uploaded,
            geographical_bounds: None,
            time_range: None,
            no2_statistics: None,
        };

        self.store
            .insert_dataset(&dataset)
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;

        info!(
            dataset_id = %dataset.id,
            file_size,
            %data_format,
            %satellite_source,
            "Dataset uploaded: {}",
            dataset.filename
        );
        Ok(dataset)
    }

    pub async fn list(&self) -> Result<Vec<Dataset>> {
        Ok(self.store.list_datasets(self.list_limit).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Dataset> {
        // ---
        match self.store.get_dataset(id).await? {
            Some(dataset) => Ok(dataset),
            None => {
                debug!(dataset_id = %id, "dataset lookup missed");
                Err(Error::NotFound(Entity::Dataset))
            }
        }
    }

    /// Remove a dataset. Jobs, validations and maps that reference it stay.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        // ---
        if !self.store.delete_dataset(id).await? {
            return Err(Error::NotFound(Entity::Dataset));
        }
        info!(dataset_id = %id, "Dataset deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::ledger::testing::{ledgers, seeded_dataset};

    #[tokio::test]
    async fn test_upload_records_received_size() {
        // ---
        let l = ledgers();
        let content = vec![0u8; 4096];
        let ds = l
            .datasets
            .upload("s5p.h5", &content, "HDF5", "Sentinel-5P")
            .await
            .unwrap();

        assert_eq!(ds.file_size, 4096);
        assert_eq!(ds.data_format, DataFormat::Hdf5);
        assert_eq!(ds.satellite_source, SatelliteSource::Sentinel5p);
        assert_eq!(ds.processing_status, ProcessingStatus::Uploaded);
        assert_eq!(l.datasets.get(ds.id).await.unwrap(), ds);
    }

    #[tokio::test]
    async fn test_empty_upload_has_zero_size() {
        let l = ledgers();
        let ds = l.datasets.upload("empty.grib", &[], "grib", "OMI").await.unwrap();
        assert_eq!(ds.file_size, 0);
    }

    #[tokio::test]
    async fn test_invalid_enums_create_nothing() {
        // ---
        let l = ledgers();

        let err = l
            .datasets
            .upload("a.zarr", b"x", "zarr", "TROPOMI")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEnum(ref e) if e.kind == "format"));

        let err = l
            .datasets
            .upload("a.nc", b"x", "netcdf", "Landsat")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEnum(ref e) if e.kind == "source"));

        assert!(l.datasets.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_and_delete_missing() {
        // ---
        let l = ledgers();
        let id = Uuid::new_v4();
        assert!(matches!(
            l.datasets.get(id).await,
            Err(Error::NotFound(Entity::Dataset))
        ));
        assert!(matches!(
            l.datasets.delete(id).await,
            Err(Error::NotFound(Entity::Dataset))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_only_the_dataset() {
        // ---
        let l = ledgers();
        let ds = seeded_dataset(&l).await;
        let job = l
            .jobs
            .create(ds.id, "kriging", Default::default())
            .await
            .unwrap();

        l.datasets.delete(ds.id).await.unwrap();

        assert!(l.datasets.get(ds.id).await.is_err());
        assert_eq!(l.jobs.get(job.id).await.unwrap().dataset_id, ds.id);
    }
}
