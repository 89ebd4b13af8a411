//! Record types for the four ledgers plus the status-check log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::InvalidEnum;

// ---

/// Declare a closed set of string values.
///
/// Generates `ALL`, `as_str`, `Display`, `FromStr` (failing with
/// [`InvalidEnum`]) and serde support through the string form.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            pub const ALL: &'static [&'static str] = &[ $( $text ),+ ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(InvalidEnum {
                        kind: $kind,
                        value: s.to_string(),
                        allowed: Self::ALL,
                    }),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidEnum;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

string_enum! {
    /// Container format of an uploaded satellite product.
    DataFormat ("format") {
        Netcdf => "netcdf",
        Hdf5 => "hdf5",
        Grib => "grib",
    }
}

string_enum! {
    /// Instrument the product was retrieved from.
    SatelliteSource ("source") {
        Tropomi => "TROPOMI",
        Omi => "OMI",
        Sentinel5p => "Sentinel-5P",
        Gome2 => "GOME-2",
    }
}

string_enum! {
    /// Only `Uploaded` is ever assigned; the rest are kept for wire compatibility.
    ProcessingStatus ("processing status") {
        Uploaded => "uploaded",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
    }
}

string_enum! {
    /// Downscaling method requested for a job.
    Algorithm ("algorithm") {
        RandomForest => "random_forest",
        NeuralNetwork => "neural_network",
        Kriging => "kriging",
        PhysicsBased => "physics_based",
    }
}

string_enum! {
    /// Job lifecycle. Jobs only move `Queued -> Completed`.
    JobStatus ("job status") {
        Queued => "queued",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
    }
}

impl DataFormat {
    /// Formats are matched case-insensitively and stored lower-case.
    pub fn parse_lenient(value: &str) -> Result<Self, InvalidEnum> {
        value.to_lowercase().parse().map_err(|e: InvalidEnum| InvalidEnum {
            value: value.to_string(),
            ..e
        })
    }
}

// ---

/// Metadata for one uploaded satellite file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    // ---
    pub id: Uuid,
    pub filename: String,
    pub file_size: i64,
    pub upload_timestamp: DateTime<Utc>,
    pub data_format: DataFormat,
    pub satellite_source: SatelliteSource,
    pub processing_status: ProcessingStatus,
    pub geographical_bounds: Option<BTreeMap<String, f64>>,
    pub time_range: Option<BTreeMap<String, String>>,
    pub no2_statistics: Option<BTreeMap<String, f64>>,
}

/// Descriptor of the raster a downscaling run would produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputData {
    pub downscaled_resolution: String,
    pub output_format: String,
    pub grid_size: [u32; 2],
    pub coordinate_system: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub r_squared: f64,
    pub bias: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingJob {
    // ---
    pub id: Uuid,
    /// Soft reference, checked only when the job is created.
    pub dataset_id: Uuid,
    pub algorithm: Algorithm,
    pub parameters: Map<String, Value>,
    pub status: JobStatus,
    pub created_timestamp: DateTime<Utc>,
    pub completed_timestamp: Option<DateTime<Utc>>,
    pub progress_percentage: u8,
    pub output_data: Option<OutputData>,
    pub accuracy_metrics: Option<AccuracyMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    // ---
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub processing_job_id: Uuid,
    pub ground_truth_source: String,
    pub accuracy_score: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r_squared: f64,
    pub validation_timestamp: DateTime<Utc>,
    pub validation_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapVisualization {
    // ---
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub processing_job_id: Option<Uuid>,
    /// Usually "heatmap", "contour" or "point_data"; not restricted.
    pub map_type: String,
    pub zoom_level: i32,
    /// `[lat, lon]`
    pub center_coordinates: [f64; 2],
    pub layer_data: FeatureCollection,
    pub created_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: Uuid,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

// --- GeoJSON subset used for map layers

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// GeoJSON order: `[lon, lat]`
    Point { coordinates: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub no2_value: f64,
    pub timestamp: DateTime<Utc>,
}
