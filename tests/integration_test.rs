use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_test::assert_ok;

use airlens::{
    downscale::MockDownscaler,
    ledger::Ledgers,
    routes::{self, AppState},
    store::MemoryStore,
    Config,
};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: bool,
    dataset_id: String,
    message: String,
    metadata: Value,
}

#[derive(Debug, Deserialize)]
struct Job {
    id: String,
    status: String,
    progress_percentage: u8,
    completed_timestamp: Option<DateTime<Utc>>,
    accuracy_metrics: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    total_datasets: i64,
    total_processing_jobs: i64,
    total_validations: i64,
    total_visualizations: i64,
    job_status_breakdown: BTreeMap<String, i64>,
    platform_stats: Value,
}

/// Serve the real router over a fresh memory store; returns the base URL.
async fn spawn_app() -> Result<String> {
    spawn_app_with(Config::default()).await
}

async fn spawn_app_with(cfg: Config) -> Result<String> {
    // ---
    let ledgers = Ledgers::new(
        Arc::new(MemoryStore::default()),
        Arc::new(MockDownscaler),
        cfg.list_limit,
    );
    let app = routes::router(AppState {
        ledgers,
        config: cfg,
    });

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(format!("http://{addr}/api"))
}

async fn upload(
    client: &Client,
    base: &str,
    content: Vec<u8>,
    data_format: &str,
    satellite_source: &str,
) -> Result<reqwest::Response> {
    // ---
    let form = multipart::Form::new()
        .text("data_format", data_format.to_string())
        .text("satellite_source", satellite_source.to_string())
        .part("file", multipart::Part::bytes(content).file_name("tropomi_no2.nc"));

    Ok(client
        .post(format!("{base}/datasets/upload"))
        .multipart(form)
        .send()
        .await?)
}

#[tokio::test]
async fn end_to_end_pipeline() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    // 1) Upload
    let resp = upload(&client, &base, vec![7u8; 1234], "netcdf", "TROPOMI").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let up: UploadResponse = resp.json().await?;
    assert!(up.success);
    assert_eq!(up.message, "Successfully uploaded tropomi_no2.nc");
    assert_eq!(up.metadata["file_size"], json!(1234));
    assert_eq!(up.metadata["processing_status"], json!("uploaded"));

    // 2) Start job
    let job: Job = client
        .post(format!("{base}/processing/start"))
        .json(&json!({
            "dataset_id": up.dataset_id,
            "algorithm": "random_forest",
            "parameters": {"n_estimators": 100}
        }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(job.status, "queued");
    assert_eq!(job.progress_percentage, 0);

    // 3) Simulate
    let resp = client
        .post(format!("{base}/processing/jobs/{}/simulate", job.id))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["success"], json!(true));

    let done: Job = client
        .get(format!("{base}/processing/jobs/{}", job.id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(done.status, "completed");
    assert_eq!(done.progress_percentage, 100);
    assert!(done.completed_timestamp.is_some());
    let metrics = done.accuracy_metrics.expect("metrics after simulate");
    assert!((0.85..=0.96).contains(&metrics["r_squared"]));

    // 4) Validate
    let resp = client
        .post(format!("{base}/validation/validate"))
        .form(&[
            ("dataset_id", up.dataset_id.as_str()),
            ("processing_job_id", job.id.as_str()),
            ("ground_truth_source", "EEA AirBase"),
        ])
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    // 5) Map with defaults
    let resp = client
        .post(format!("{base}/maps/create"))
        .form(&[("dataset_id", up.dataset_id.as_str())])
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let map: Value = resp.json().await?;
    assert_eq!(map["layer_data"]["type"], json!("FeatureCollection"));
    assert_eq!(map["layer_data"]["features"].as_array().map(Vec::len), Some(50));
    assert_eq!(map["center_coordinates"], json!([52.3676, 4.9041]));

    let fetched = client
        .get(format!("{base}/maps/{}", map["id"].as_str().unwrap_or_default()))
        .send()
        .await?;
    assert_eq!(fetched.status(), StatusCode::OK);

    // 6) Summary
    let summary: Summary = client
        .get(format!("{base}/analytics/summary"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(summary.total_datasets, 1);
    assert_eq!(summary.total_processing_jobs, 1);
    assert_eq!(summary.total_validations, 1);
    assert_eq!(summary.total_visualizations, 1);
    assert_eq!(
        summary.job_status_breakdown,
        BTreeMap::from([("completed".to_string(), 1)])
    );
    assert_eq!(summary.platform_stats["uptime"], json!("99.9%"));
    assert_eq!(
        summary.platform_stats["algorithm_accuracy"]["kriging"],
        json!(89.1)
    );

    Ok(())
}

#[tokio::test]
async fn invalid_upload_is_rejected_without_a_record() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let resp = upload(&client, &base, vec![1, 2, 3], "zarr", "TROPOMI").await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await?;
    assert!(body["detail"].as_str().unwrap_or_default().contains("netcdf"));

    let resp = upload(&client, &base, vec![1, 2, 3], "grib", "Landsat-8").await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let datasets: Vec<Value> = client
        .get(format!("{base}/datasets"))
        .send()
        .await?
        .json()
        .await?;
    assert!(datasets.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_ids_are_not_found() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let missing = uuid::Uuid::new_v4();

    for url in [
        format!("{base}/datasets/{missing}"),
        format!("{base}/datasets/not-a-uuid"),
        format!("{base}/processing/jobs/{missing}"),
        format!("{base}/maps/{missing}"),
    ] {
        let resp = client.get(&url).send().await?;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "GET {url}");
    }

    let resp = client
        .delete(format!("{base}/datasets/{missing}"))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .post(format!("{base}/processing/jobs/{missing}/simulate"))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await?;
    assert_eq!(body["detail"], json!("Processing job not found"));

    let resp = client
        .post(format!("{base}/processing/start"))
        .json(&json!({"dataset_id": missing.to_string(), "algorithm": "kriging"}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn delete_keeps_dependent_records() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let up: UploadResponse = upload(&client, &base, b"HDF".to_vec(), "HDF5", "OMI")
        .await?
        .json()
        .await?;
    let job: Job = client
        .post(format!("{base}/processing/start"))
        .json(&json!({"dataset_id": up.dataset_id, "algorithm": "neural_network"}))
        .send()
        .await?
        .json()
        .await?;

    let resp = client
        .delete(format!("{base}/datasets/{}", up.dataset_id))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    // Job survives; new work against the dataset does not.
    let resp = client
        .get(format!("{base}/processing/jobs/{}", job.id))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base}/processing/start"))
        .json(&json!({"dataset_id": up.dataset_id, "algorithm": "kriging"}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .post(format!("{base}/processing/start"))
        .json(&json!({"dataset_id": up.dataset_id, "algorithm": "svm"}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND, "dataset checked first");

    Ok(())
}

#[tokio::test]
async fn liveness_and_status_checks() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let root: Value = client.get(format!("{base}/")).send().await?.json().await?;
    assert_eq!(root["status"], json!("active"));
    assert_eq!(root["version"], json!("1.0.0"));

    let health = client
        .get(base.replace("/api", "/health"))
        .send()
        .await?;
    assert_eq!(health.status(), StatusCode::OK);

    let created = client
        .post(format!("{base}/status"))
        .json(&json!({"client_name": "dashboard"}))
        .send()
        .await;
    let created = assert_ok!(created);
    assert_eq!(created.status(), StatusCode::OK);

    let checks: Vec<Value> = client
        .get(format!("{base}/status"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0]["client_name"], json!("dashboard"));

    Ok(())
}

async fn seed_dataset(client: &Client, base: &str) -> Result<String> {
    let up: UploadResponse = upload(client, base, b"CDF".to_vec(), "netcdf", "TROPOMI")
        .await?
        .json()
        .await?;
    Ok(up.dataset_id)
}

#[tokio::test]
async fn oversized_upload_is_rejected_with_413() -> Result<()> {
    // ---
    let base = spawn_app_with(Config {
        max_upload_mb: 1,
        ..Config::default()
    })
    .await?;
    let client = Client::new();

    let resp = upload(&client, &base, vec![0u8; 1024 * 1024 + 64 * 1024], "netcdf", "TROPOMI")
        .await?;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = resp.json().await?;
    assert!(body["detail"].is_string());

    let datasets: Vec<Value> = client
        .get(format!("{base}/datasets"))
        .send()
        .await?
        .json()
        .await?;
    assert!(datasets.is_empty());

    // Under the limit still goes through.
    let resp = upload(&client, &base, vec![0u8; 512 * 1024], "netcdf", "TROPOMI").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn blank_job_id_on_map_form_is_absent() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let dataset_id = seed_dataset(&client, &base).await?;

    let resp = client
        .post(format!("{base}/maps/create"))
        .form(&[
            ("dataset_id", dataset_id.as_str()),
            ("processing_job_id", ""),
            ("map_type", "contour"),
            ("zoom_level", "7"),
        ])
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let map: Value = resp.json().await?;
    assert_eq!(map["processing_job_id"], Value::Null);
    assert_eq!(map["map_type"], json!("contour"));
    assert_eq!(map["zoom_level"], json!(7));
    Ok(())
}

#[tokio::test]
async fn form_references_must_exist() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let dataset_id = seed_dataset(&client, &base).await?;
    let missing = uuid::Uuid::new_v4().to_string();

    // Validation: dataset checked before job.
    let resp = client
        .post(format!("{base}/validation/validate"))
        .form(&[
            ("dataset_id", missing.as_str()),
            ("processing_job_id", missing.as_str()),
            ("ground_truth_source", "EEA AirBase"),
        ])
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await?;
    assert_eq!(body["detail"], json!("Dataset not found"));

    let resp = client
        .post(format!("{base}/validation/validate"))
        .form(&[
            ("dataset_id", dataset_id.as_str()),
            ("processing_job_id", missing.as_str()),
            ("ground_truth_source", "EEA AirBase"),
        ])
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await?;
    assert_eq!(body["detail"], json!("Processing job not found"));

    // Maps: same for the dataset and a supplied job.
    let resp = client
        .post(format!("{base}/maps/create"))
        .form(&[("dataset_id", missing.as_str())])
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await?;
    assert_eq!(body["detail"], json!("Dataset not found"));

    let resp = client
        .post(format!("{base}/maps/create"))
        .form(&[
            ("dataset_id", dataset_id.as_str()),
            ("processing_job_id", missing.as_str()),
        ])
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await?;
    assert_eq!(body["detail"], json!("Processing job not found"));

    let results: Vec<Value> = client
        .get(format!("{base}/validation/results"))
        .send()
        .await?
        .json()
        .await?;
    assert!(results.is_empty());
    let maps: Vec<Value> = client.get(format!("{base}/maps")).send().await?.json().await?;
    assert!(maps.is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_requests_get_a_json_detail() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();
    let dataset_id = seed_dataset(&client, &base).await?;

    let resp = client
        .post(format!("{base}/datasets/upload"))
        .json(&json!({"data_format": "netcdf"}))
        .send()
        .await?;
    assert!(resp.status().is_client_error(), "{}", resp.status());
    let body: Value = resp.json().await?;
    assert!(body["detail"].is_string());

    let resp = client
        .post(format!("{base}/maps/create"))
        .form(&[("dataset_id", dataset_id.as_str()), ("zoom_level", "abc")])
        .send()
        .await?;
    assert!(resp.status().is_client_error(), "{}", resp.status());
    let body: Value = resp.json().await?;
    assert!(body["detail"].is_string());

    let resp = client
        .post(format!("{base}/processing/start"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert!(resp.status().is_client_error(), "{}", resp.status());
    let body: Value = resp.json().await?;
    assert!(body["detail"].is_string());

    let resp = client
        .post(format!("{base}/maps/create"))
        .form(&[("dataset_id", dataset_id.as_str()), ("center_lat", "NaN")])
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await?;
    assert!(body["detail"].as_str().unwrap_or_default().contains("finite"));
    Ok(())
}
