use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::store::Store;

// ---

/// Fixed platform descriptors reported with every summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformStats {
    pub uptime: &'static str,
    pub avg_processing_time: &'static str,
    pub supported_formats: &'static [&'static str],
    pub supported_satellites: &'static [&'static str],
    pub algorithm_accuracy: BTreeMap<&'static str, f64>,
}

impl Default for PlatformStats {
    fn default() -> Self {
        Self {
            uptime: "99.9%",
            avg_processing_time: "5.2 minutes",
            supported_formats: &["NetCDF", "HDF5", "GRIB"],
            supported_satellites: &["TROPOMI", "OMI", "Sentinel-5P", "GOME-2"],
            algorithm_accuracy: BTreeMap::from([
                ("random_forest", 96.2),
                ("neural_network", 94.8),
                ("kriging", 89.1),
                ("physics_based", 93.7),
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_datasets: i64,
    pub total_processing_jobs: i64,
    pub total_validations: i64,
    pub total_visualizations: i64,
    pub job_status_breakdown: BTreeMap<String, i64>,
    pub platform_stats: PlatformStats,
}

/// Read-only counts across the ledgers.
#[derive(Clone)]
pub struct Analytics {
    store: Arc<dyn Store>,
}

impl Analytics {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Counts and the status breakdown are read separately and may reflect
    /// slightly different moments.
    pub async fn summary(&self) -> Result<AnalyticsSummary> {
        // ---
        let (counts, statuses) =
            futures::try_join!(self.store.record_counts(), self.store.job_status_counts())?;

        let job_status_breakdown = statuses
            .into_iter()
            .map(|(status, count)| (status.to_string(), count))
            .collect();

        Ok(AnalyticsSummary {
            total_datasets: counts.datasets,
            total_processing_jobs: counts.processing_jobs,
            total_validations: counts.validations,
            total_visualizations: counts.visualizations,
            job_status_breakdown,
            platform_stats: PlatformStats::default(),
        })
    }
}
