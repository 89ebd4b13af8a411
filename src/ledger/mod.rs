//! Ledgers: one CRUD surface per record type over a shared [`Store`].
//!
//! Each ledger owns its record type. Cross-ledger references are soft: they
//! are resolved through the store when a record is written and never again.

use std::sync::Arc;

use crate::downscale::Downscaler;
use crate::store::Store;

mod analytics;
mod datasets;
mod jobs;
mod maps;
mod status;
mod validations;

pub use analytics::{Analytics, AnalyticsSummary, PlatformStats};
pub use datasets::DatasetLedger;
pub use jobs::JobLedger;
pub use maps::{MapRequest, VisualizationLedger, FEATURE_COUNT};
pub use status::StatusLedger;
pub use validations::{ValidationLedger, VALIDATION_NOTES};

/// Every ledger wired to the same store handle.
#[derive(Clone)]
pub struct Ledgers {
    pub datasets: DatasetLedger,
    pub jobs: JobLedger,
    pub validations: ValidationLedger,
    pub maps: VisualizationLedger,
    pub analytics: Analytics,
    pub status: StatusLedger,
}

impl Ledgers {
    pub fn new(store: Arc<dyn Store>, downscaler: Arc<dyn Downscaler>, list_limit: u32) -> Self {
        // ---
        Self {
            datasets: DatasetLedger::new(store.clone(), list_limit),
            jobs: JobLedger::new(store.clone(), downscaler, list_limit),
            validations: ValidationLedger::new(store.clone(), list_limit),
            maps: VisualizationLedger::new(store.clone(), list_limit),
            analytics: Analytics::new(store.clone()),
            status: StatusLedger::new(store, list_limit),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    // ---
    use std::sync::Arc;

    use super::Ledgers;
    use crate::downscale::MockDownscaler;
    use crate::models::Dataset;
    use crate::store::MemoryStore;

    pub fn ledgers() -> Ledgers {
        Ledgers::new(Arc::new(MemoryStore::default()), Arc::new(MockDownscaler), 1000)
    }

    pub async fn seeded_dataset(ledgers: &Ledgers) -> Dataset {
        ledgers
            .datasets
            .upload("no2_2024.nc", b"CDF\x01 fake netcdf", "netcdf", "TROPOMI")
            .await
            .expect("upload")
    }
}
