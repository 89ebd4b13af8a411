use axum::{
    extract::{rejection::FormRejection, State},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;

use super::{parse_id, AppState};
use crate::error::{Entity, Result};
use crate::models::ValidationResult;

// ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/validation/validate", post(validate))
        .route("/api/validation/results", get(list))
}

#[derive(Debug, Deserialize)]
struct ValidateForm {
    dataset_id: String,
    processing_job_id: String,
    ground_truth_source: String,
}

async fn validate(
    State(state): State<AppState>,
    form: std::result::Result<Form<ValidateForm>, FormRejection>,
) -> Result<Json<ValidationResult>> {
    // ---
    let Form(form) = form?;
    let dataset_id = parse_id(&form.dataset_id, Entity::Dataset)?;
    let job_id = parse_id(&form.processing_job_id, Entity::ProcessingJob)?;
    let result = state
        .ledgers
        .validations
        .create(dataset_id, job_id, &form.ground_truth_source)
        .await?;
    Ok(Json(result))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<ValidationResult>>> {
    Ok(Json(state.ledgers.validations.list().await?))
}
