use axum::{extract::State, routing::get, Json, Router};

use super::AppState;
use crate::error::Result;
use crate::ledger::AnalyticsSummary;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/analytics/summary", get(summary))
}

async fn summary(State(state): State<AppState>) -> Result<Json<AnalyticsSummary>> {
    Ok(Json(state.ledgers.analytics.summary().await?))
}
