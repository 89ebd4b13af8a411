//! Downscaling capability used when a processing job is run.
//!
//! Only [`MockDownscaler`] exists: it fabricates a fixed output descriptor
//! and samples accuracy metrics, whatever the requested algorithm.

use rand::Rng;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{AccuracyMetrics, Algorithm, OutputData};

/// Result of one downscaling run.
#[derive(Debug, Clone, PartialEq)]
pub struct Downscaled {
    pub output_data: OutputData,
    pub accuracy_metrics: AccuracyMetrics,
}

pub trait Downscaler: Send + Sync {
    fn execute(
        &self,
        algorithm: Algorithm,
        dataset_id: Uuid,
        parameters: &Map<String, Value>,
    ) -> Downscaled;
}

// ---

#[derive(Debug, Clone, Copy, Default)]
pub struct MockDownscaler;

impl Downscaler for MockDownscaler {
    fn execute(
        &self,
        algorithm: Algorithm,
        dataset_id: Uuid,
        parameters: &Map<String, Value>,
    ) -> Downscaled {
        // ---
        tracing::debug!(
            %algorithm,
            %dataset_id,
            parameter_count = parameters.len(),
            "mock downscaling run"
        );

        Downscaled {
            output_data: mock_output(),
            accuracy_metrics: sample_metrics(&mut rand::thread_rng()),
        }
    }
}

/// 1 km GeoTIFF on a 1000x1000 WGS84 grid.
pub fn mock_output() -> OutputData {
    OutputData {
        downscaled_resolution: "1km".to_string(),
        output_format: "geotiff".to_string(),
        grid_size: [1000, 1000],
        coordinate_system: "EPSG:4326".to_string(),
    }
}

pub fn sample_metrics<R: Rng + ?Sized>(rng: &mut R) -> AccuracyMetrics {
    AccuracyMetrics {
        rmse: rng.gen_range(0.1..=0.3),
        mae: rng.gen_range(0.05..=0.2),
        r_squared: rng.gen_range(0.85..=0.96),
        bias: rng.gen_range(-0.1..=0.1),
    }
}
