use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::{parse_id, AppState};
use crate::error::{Entity, Result};
use crate::models::ProcessingJob;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/processing/start", post(start))
        .route("/api/processing/jobs", get(list))
        .route("/api/processing/jobs/{id}", get(fetch))
        .route("/api/processing/jobs/{id}/simulate", post(simulate))
}

/// Body of `POST /api/processing/start`.
#[derive(Debug, Deserialize)]
struct StartJob {
    dataset_id: String,
    algorithm: String,
    #[serde(default)]
    parameters: Map<String, Value>,
}

#[derive(Serialize)]
struct SimulateResponse {
    success: bool,
    message: &'static str,
}

async fn start(
    State(state): State<AppState>,
    body: std::result::Result<Json<StartJob>, JsonRejection>,
) -> Result<Json<ProcessingJob>> {
    // ---
    let Json(body) = body?;
    info!("POST /api/processing/start - algorithm={}", body.algorithm);
    let dataset_id = parse_id(&body.dataset_id, Entity::Dataset)?;
    let job = state
        .ledgers
        .jobs
        .create(dataset_id, &body.algorithm, body.parameters)
        .await?;
    Ok(Json(job))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProcessingJob>>> {
    Ok(Json(state.ledgers.jobs.list().await?))
}

async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProcessingJob>> {
    let id = parse_id(&id, Entity::ProcessingJob)?;
    Ok(Json(state.ledgers.jobs.get(id).await?))
}

async fn simulate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SimulateResponse>> {
    // ---
    let id = parse_id(&id, Entity::ProcessingJob)?;
    state.ledgers.jobs.simulate(id).await?;
    Ok(Json(SimulateResponse {
        success: true,
        message: "Processing simulation completed",
    }))
}
