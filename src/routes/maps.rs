use axum::{
    extract::{rejection::FormRejection, Path, State},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;

use super::{parse_id, AppState};
use crate::error::{Entity, Result};
use crate::ledger::MapRequest;
use crate::models::MapVisualization;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/maps/create", post(create))
        .route("/api/maps", get(list))
        .route("/api/maps/{id}", get(fetch))
}

fn default_map_type() -> String {
    MapRequest::DEFAULT_MAP_TYPE.to_string()
}

fn default_zoom() -> i32 {
    MapRequest::DEFAULT_ZOOM
}

fn default_lat() -> f64 {
    MapRequest::DEFAULT_LAT
}

fn default_lon() -> f64 {
    MapRequest::DEFAULT_LON
}

#[derive(Debug, Deserialize)]
struct MapForm {
    dataset_id: String,
    /// Blank is the same as absent.
    processing_job_id: Option<String>,
    #[serde(default = "default_map_type")]
    map_type: String,
    #[serde(default = "default_zoom")]
    zoom_level: i32,
    #[serde(default = "default_lat")]
    center_lat: f64,
    #[serde(default = "default_lon")]
    center_lon: f64,
}

async fn create(
    State(state): State<AppState>,
    form: std::result::Result<Form<MapForm>, FormRejection>,
) -> Result<Json<MapVisualization>> {
    // ---
    let Form(form) = form?;
    let dataset_id = parse_id(&form.dataset_id, Entity::Dataset)?;
    let processing_job_id = match form.processing_job_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_id(raw, Entity::ProcessingJob)?),
    };

    let req = MapRequest {
        dataset_id,
        processing_job_id,
        map_type: form.map_type,
        zoom_level: form.zoom_level,
        center_lat: form.center_lat,
        center_lon: form.center_lon,
    };
    Ok(Json(state.ledgers.maps.create(req).await?))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<MapVisualization>>> {
    Ok(Json(state.ledgers.maps.list().await?))
}

async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MapVisualization>> {
    let id = parse_id(&id, Entity::MapVisualization)?;
    Ok(Json(state.ledgers.maps.get(id).await?))
}
