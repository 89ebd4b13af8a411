//! PostgreSQL backend. Tables are created by [`crate::schema::create_schema`].
//!
//! Enumerations are stored as their text form and free-form maps as JSONB.
//! Rows are decoded into private `*Row` structs and converted, so a value
//! that no longer parses surfaces as [`StoreError::Corrupt`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{RecordCounts, Store, StoreResult};
use crate::error::StoreError;
use crate::models::{
    AccuracyMetrics, Dataset, FeatureCollection, JobStatus, MapVisualization, OutputData,
    ProcessingJob, StatusCheck, ValidationResult,
};

// ---

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct DatasetRow {
    id: Uuid,
    filename: String,
    file_size: i64,
    upload_timestamp: DateTime<Utc>,
    data_format: String,
    satellite_source: String,
    processing_status: String,
    geographical_bounds: Option<Json<BTreeMap<String, f64>>>,
    time_range: Option<Json<BTreeMap<String, String>>>,
    no2_statistics: Option<Json<BTreeMap<String, f64>>>,
}

impl TryFrom<DatasetRow> for Dataset {
    type Error = StoreError;

    fn try_from(row: DatasetRow) -> Result<Self, Self::Error> {
        Ok(Dataset {
            id: row.id,
            filename: row.filename,
            file_size: row.file_size,
            upload_timestamp: row.upload_timestamp,
            data_format: row.data_format.parse()?,
            satellite_source: row.satellite_source.parse()?,
            processing_status: row.processing_status.parse()?,
            geographical_bounds: row.geographical_bounds.map(|j| j.0),
            time_range: row.time_range.map(|j| j.0),
            no2_statistics: row.no2_statistics.map(|j| j.0),
        })
    }
}

#[derive(FromRow)]
struct JobRow {
    id: Uuid,
    dataset_id: Uuid,
    algorithm: String,
    parameters: Json<Map<String, Value>>,
    status: String,
    created_timestamp: DateTime<Utc>,
    completed_timestamp: Option<DateTime<Utc>>,
    progress_percentage: i16,
    output_data: Option<Json<OutputData>>,
    accuracy_metrics: Option<Json<AccuracyMetrics>>,
}

impl TryFrom<JobRow> for ProcessingJob {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let progress_percentage = u8::try_from(row.progress_percentage)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "job {} has progress {}",
                    row.id, row.progress_percentage
                ))
            })?;

        Ok(ProcessingJob {
            id: row.id,
            dataset_id: row.dataset_id,
            algorithm: row.algorithm.parse()?,
            parameters: row.parameters.0,
            status: row.status.parse()?,
            created_timestamp: row.created_timestamp,
            completed_timestamp: row.completed_timestamp,
            progress_percentage,
            output_data: row.output_data.map(|j| j.0),
            accuracy_metrics: row.accuracy_metrics.map(|j| j.0),
        })
    }
}

#[derive(FromRow)]
struct MapRow {
    id: Uuid,
    dataset_id: Uuid,
    processing_job_id: Option<Uuid>,
    map_type: String,
    zoom_level: i32,
    center_lat: f64,
    center_lon: f64,
    layer_data: Json<FeatureCollection>,
    created_timestamp: DateTime<Utc>,
}

impl From<MapRow> for MapVisualization {
    fn from(row: MapRow) -> Self {
        MapVisualization {
            id: row.id,
            dataset_id: row.dataset_id,
            processing_job_id: row.processing_job_id,
            map_type: row.map_type,
            zoom_level: row.zoom_level,
            center_coordinates: [row.center_lat, row.center_lon],
            layer_data: row.layer_data.0,
            created_timestamp: row.created_timestamp,
        }
    }
}

#[derive(FromRow)]
struct ValidationRow {
    id: Uuid,
    dataset_id: Uuid,
    processing_job_id: Uuid,
    ground_truth_source: String,
    accuracy_score: f64,
    rmse: f64,
    mae: f64,
    r_squared: f64,
    validation_timestamp: DateTime<Utc>,
    validation_notes: Option<String>,
}

impl From<ValidationRow> for ValidationResult {
    fn from(row: ValidationRow) -> Self {
        ValidationResult {
            id: row.id,
            dataset_id: row.dataset_id,
            processing_job_id: row.processing_job_id,
            ground_truth_source: row.ground_truth_source,
            accuracy_score: row.accuracy_score,
            rmse: row.rmse,
            mae: row.mae,
            r_squared: row.r_squared,
            validation_timestamp: row.validation_timestamp,
            validation_notes: row.validation_notes,
        }
    }
}

#[derive(FromRow)]
struct StatusCheckRow {
    id: Uuid,
    client_name: String,
    timestamp: DateTime<Utc>,
}

impl From<StatusCheckRow> for StatusCheck {
    fn from(row: StatusCheckRow) -> Self {
        StatusCheck {
            id: row.id,
            client_name: row.client_name,
            timestamp: row.timestamp,
        }
    }
}

const DATASET_COLUMNS: &str = "id, filename, file_size, upload_timestamp, data_format, \
     satellite_source, processing_status, geographical_bounds, time_range, no2_statistics";

const JOB_COLUMNS: &str = "id, dataset_id, algorithm, parameters, status, created_timestamp, \
     completed_timestamp, progress_percentage, output_data, accuracy_metrics";

const MAP_COLUMNS: &str = "id, dataset_id, processing_job_id, map_type, zoom_level, \
     center_lat, center_lon, layer_data, created_timestamp";

// ---

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_dataset(&self, dataset: &Dataset) -> StoreResult<()> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO datasets (
                id, filename, file_size, upload_timestamp, data_format,
                satellite_source, processing_status,
                geographical_bounds, time_range, no2_statistics
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(dataset.id)
        .bind(&dataset.filename)
        .bind(dataset.file_size)
        .bind(dataset.upload_timestamp)
        .bind(dataset.data_format.as_str())
        .bind(dataset.satellite_source.as_str())
        .bind(dataset.processing_status.as_str())
        .bind(dataset.geographical_bounds.as_ref().map(Json))
        .bind(dataset.time_range.as_ref().map(Json))
        .bind(dataset.no2_statistics.as_ref().map(Json))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_dataset(&self, id: Uuid) -> StoreResult<Option<Dataset>> {
        let sql = format!("SELECT {DATASET_COLUMNS} FROM datasets WHERE id = $1");
        sqlx::query_as::<_, DatasetRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Dataset::try_from)
            .transpose()
    }

    async fn list_datasets(&self, limit: u32) -> StoreResult<Vec<Dataset>> {
        let sql = format!(
            "SELECT {DATASET_COLUMNS} FROM datasets ORDER BY upload_timestamp LIMIT $1"
        );
        sqlx::query_as::<_, DatasetRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Dataset::try_from)
            .collect()
    }

    async fn delete_dataset(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM datasets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_job(&self, job: &ProcessingJob) -> StoreResult<()> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO processing_jobs (
                id, dataset_id, algorithm, parameters, status, created_timestamp,
                completed_timestamp, progress_percentage, output_data, accuracy_metrics
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(job.id)
        .bind(job.dataset_id)
        .bind(job.algorithm.as_str())
        .bind(Json(&job.parameters))
        .bind(job.status.as_str())
        .bind(job.created_timestamp)
        .bind(job.completed_timestamp)
        .bind(i16::from(job.progress_percentage))
        .bind(job.output_data.as_ref().map(Json))
        .bind(job.accuracy_metrics.as_ref().map(Json))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<ProcessingJob>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM processing_jobs WHERE id = $1");
        sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ProcessingJob::try_from)
            .transpose()
    }

    async fn list_jobs(&self, limit: u32) -> StoreResult<Vec<ProcessingJob>> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM processing_jobs ORDER BY created_timestamp LIMIT $1"
        );
        sqlx::query_as::<_, JobRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ProcessingJob::try_from)
            .collect()
    }

    async fn update_job(&self, job: &ProcessingJob) -> StoreResult<bool> {
        // ---
        let result = sqlx::query(
            r#"
            UPDATE processing_jobs SET
                status              = $2,
                completed_timestamp = $3,
                progress_percentage = $4,
                output_data         = $5,
                accuracy_metrics    = $6
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(job.status.as_str())
        .bind(job.completed_timestamp)
        .bind(i16::from(job.progress_percentage))
        .bind(job.output_data.as_ref().map(Json))
        .bind(job.accuracy_metrics.as_ref().map(Json))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_validation(&self, result: &ValidationResult) -> StoreResult<()> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO validation_results (
                id, dataset_id, processing_job_id, ground_truth_source,
                accuracy_score, rmse, mae, r_squared,
                validation_timestamp, validation_notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(result.id)
        .bind(result.dataset_id)
        .bind(result.processing_job_id)
        .bind(&result.ground_truth_source)
        .bind(result.accuracy_score)
        .bind(result.rmse)
        .bind(result.mae)
        .bind(result.r_squared)
        .bind(result.validation_timestamp)
        .bind(&result.validation_notes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_validations(&self, limit: u32) -> StoreResult<Vec<ValidationResult>> {
        let rows = sqlx::query_as::<_, ValidationRow>(
            r#"
            SELECT id, dataset_id, processing_job_id, ground_truth_source,
                   accuracy_score, rmse, mae, r_squared,
                   validation_timestamp, validation_notes
            FROM validation_results
            ORDER BY validation_timestamp
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ValidationResult::from).collect())
    }

    async fn insert_map(&self, map: &MapVisualization) -> StoreResult<()> {
        // ---
        let [center_lat, center_lon] = map.center_coordinates;
        sqlx::query(
            r#"
            INSERT INTO map_visualizations (
                id, dataset_id, processing_job_id, map_type, zoom_level,
                center_lat, center_lon, layer_data, created_timestamp
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(map.id)
        .bind(map.dataset_id)
        .bind(map.processing_job_id)
        .bind(&map.map_type)
        .bind(map.zoom_level)
        .bind(center_lat)
        .bind(center_lon)
        .bind(Json(&map.layer_data))
        .bind(map.created_timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_map(&self, id: Uuid) -> StoreResult<Option<MapVisualization>> {
        let sql = format!("SELECT {MAP_COLUMNS} FROM map_visualizations WHERE id = $1");
        let row = sqlx::query_as::<_, MapRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(MapVisualization::from))
    }

    async fn list_maps(&self, limit: u32) -> StoreResult<Vec<MapVisualization>> {
        let sql = format!(
            "SELECT {MAP_COLUMNS} FROM map_visualizations ORDER BY created_timestamp LIMIT $1"
        );
        let rows = sqlx::query_as::<_, MapRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(MapVisualization::from).collect())
    }

    async fn insert_status_check(&self, check: &StatusCheck) -> StoreResult<()> {
        sqlx::query("INSERT INTO status_checks (id, client_name, timestamp) VALUES ($1, $2, $3)")
            .bind(check.id)
            .bind(&check.client_name)
            .bind(check.timestamp)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_status_checks(&self, limit: u32) -> StoreResult<Vec<StatusCheck>> {
        let rows = sqlx::query_as::<_, StatusCheckRow>(
            "SELECT id, client_name, timestamp FROM status_checks ORDER BY timestamp LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(StatusCheck::from).collect())
    }

    async fn record_counts(&self) -> StoreResult<RecordCounts> {
        // ---
        let (datasets, processing_jobs, validations, visualizations): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM datasets),
                    (SELECT COUNT(*) FROM processing_jobs),
                    (SELECT COUNT(*) FROM validation_results),
                    (SELECT COUNT(*) FROM map_visualizations)
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(RecordCounts {
            datasets,
            processing_jobs,
            validations,
            visualizations,
        })
    }

    async fn job_status_counts(&self) -> StoreResult<Vec<(JobStatus, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM processing_jobs GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(status, count)| -> StoreResult<(JobStatus, i64)> {
                Ok((status.parse()?, count))
            })
            .collect()
    }

    async fn close(&self) {
        // ---
        tracing::info!("Closing database pool");
        self.pool.close().await;
    }
}
