use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::AppState;
use crate::error::Result;
use crate::models::StatusCheck;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/status", get(list).post(record))
}

#[derive(Debug, Deserialize)]
struct StatusCheckCreate {
    client_name: String,
}

async fn record(
    State(state): State<AppState>,
    body: std::result::Result<Json<StatusCheckCreate>, JsonRejection>,
) -> Result<Json<StatusCheck>> {
    let Json(body) = body?;
    Ok(Json(state.ledgers.status.record(&body.client_name).await?))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<StatusCheck>>> {
    Ok(Json(state.ledgers.status.list().await?))
}
