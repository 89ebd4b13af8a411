//! Route gateway. Each sibling module exports a sub-router over
//! [`AppState`]; `main.rs` only sees [`router`].

use axum::Router;
use uuid::Uuid;

use crate::error::{Entity, Error, Result};
use crate::ledger::Ledgers;
use crate::Config;

mod analytics;
mod datasets;
mod health;
mod maps;
mod processing;
mod status;
mod validation;

/// Shared by all handlers; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub ledgers: Ledgers,
    pub config: Config,
}

// ---

pub fn router(state: AppState) -> Router {
    // ---
    let upload_limit = state.config.max_upload_bytes();

    Router::new()
        .merge(health::router())
        .merge(datasets::router(upload_limit))
        .merge(processing::router())
        .merge(validation::router())
        .merge(maps::router())
        .merge(analytics::router())
        .merge(status::router())
        .with_state(state)
}

/// Ids that are not UUIDs cannot name a record, so they resolve to NotFound.
fn parse_id(raw: &str, entity: Entity) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| Error::NotFound(entity))
}
