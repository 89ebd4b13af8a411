//! AirLens: metadata API for satellite NO₂ datasets.
//!
//! Records dataset uploads, queues and completes (simulated) downscaling
//! jobs, stores validation results and serves map layers. Four ledgers share
//! one [`store::Store`] handle:
//!
//! ```text
//! Dataset -> ProcessingJob -> (ValidationResult, MapVisualization)
//! ```
//!
//! Module layout follows the Explicit Module Boundary Pattern (EMBP): `main.rs`
//! talks to `config`, `store` and `routes` only; handlers reach the ledgers
//! through [`routes::AppState`].

pub mod config;
pub mod downscale;
pub mod error;
pub mod ledger;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
