use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{parse_id, AppState};
use crate::error::{Entity, Error, Result};
use crate::models::Dataset;

// ---

pub fn router(upload_limit: usize) -> Router<AppState> {
    // ---
    Router::new()
        .route(
            "/api/datasets/upload",
            post(upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/datasets", get(list))
        .route("/api/datasets/{id}", get(fetch).delete(remove))
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    dataset_id: Uuid,
    message: String,
    metadata: Dataset,
}

#[derive(Serialize)]
struct DeleteResponse {
    success: bool,
    message: &'static str,
}

/// Handle `POST /api/datasets/upload` (multipart: `file`, `data_format`,
/// `satellite_source`). Parts may arrive in any order.
///
/// A body over the upload limit surfaces as a 413 from the part stream.
async fn upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    // ---
    info!("POST /api/datasets/upload");
    let mut multipart = multipart?;

    let mut file: Option<(String, Bytes)> = None;
    let mut data_format: Option<String> = None;
    let mut satellite_source: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("unnamed").to_owned();
                let content = field.bytes().await?;
                debug!("received file part '{}' ({} bytes)", filename, content.len());
                file = Some((filename, content));
            }
            Some("data_format") => data_format = Some(field.text().await?),
            Some("satellite_source") => {
                satellite_source = Some(field.text().await?)
            }
            other => debug!("ignoring multipart part {:?}", other),
        }
    }

    let data_format = data_format.ok_or(Error::MissingField("data_format"))?;
    let satellite_source = satellite_source.ok_or(Error::MissingField("satellite_source"))?;
    let (filename, content) = file.ok_or(Error::MissingField("file"))?;

    let dataset = state
        .ledgers
        .datasets
        .upload(&filename, &content, &data_format, &satellite_source)
        .await?;

    Ok(Json(UploadResponse {
        success: true,
        dataset_id: dataset.id,
        message: format!("Successfully uploaded {}", dataset.filename),
        metadata: dataset,
    }))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Dataset>>> {
    Ok(Json(state.ledgers.datasets.list().await?))
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Dataset>> {
    let id = parse_id(&id, Entity::Dataset)?;
    Ok(Json(state.ledgers.datasets.get(id).await?))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    // ---
    let id = parse_id(&id, Entity::Dataset)?;
    state.ledgers.datasets.delete(id).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Dataset deleted successfully",
    }))
}
