use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Entity, Error, Result};
use crate::models::{Feature, FeatureCollection, FeatureProperties, Geometry, MapVisualization};
use crate::store::Store;

/// Points generated per map layer.
pub const FEATURE_COUNT: usize = 50;

/// Max offset of a generated point from the map center, in degrees.
const JITTER_DEG: f64 = 0.1;

// ---

/// Parameters for a new map; defaults center on Amsterdam.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRequest {
    pub dataset_id: Uuid,
    pub processing_job_id: Option<Uuid>,
    pub map_type: String,
    pub zoom_level: i32,
    pub center_lat: f64,
    pub center_lon: f64,
}

impl MapRequest {
    pub const DEFAULT_MAP_TYPE: &'static str = "heatmap";
    pub const DEFAULT_ZOOM: i32 = 5;
    pub const DEFAULT_LAT: f64 = 52.3676;
    pub const DEFAULT_LON: f64 = 4.9041;

    pub fn new(dataset_id: Uuid) -> Self {
        Self {
            dataset_id,
            processing_job_id: None,
            map_type: Self::DEFAULT_MAP_TYPE.to_string(),
            zoom_level: Self::DEFAULT_ZOOM,
            center_lat: Self::DEFAULT_LAT,
            center_lon: Self::DEFAULT_LON,
        }
    }
}

/// Scatter [`FEATURE_COUNT`] NO₂ points within ±0.1° of the center.
fn synthetic_layer<R: Rng + ?Sized>(
    rng: &mut R,
    center_lat: f64,
    center_lon: f64,
    now: DateTime<Utc>,
) -> FeatureCollection {
    // ---
    let features = (0..FEATURE_COUNT)
        .map(|_| Feature {
            geometry: Geometry::Point {
                coordinates: [
                    center_lon + rng.gen_range(-JITTER_DEG..=JITTER_DEG),
                    center_lat + rng.gen_range(-JITTER_DEG..=JITTER_DEG),
                ],
            },
            properties: FeatureProperties {
                no2_value: rng.gen_range(10.0..=50.0),
                timestamp: now,
            },
        })
        .collect();

    FeatureCollection { features }
}

#[derive(Clone)]
pub struct VisualizationLedger {
    store: Arc<dyn Store>,
    list_limit: u32,
}

impl VisualizationLedger {
    pub fn new(store: Arc<dyn Store>, list_limit: u32) -> Self {
        Self { store, list_limit }
    }

    /// Build and store a map layer for a dataset.
    ///
    /// A supplied `processing_job_id` must name an existing job, and the
    /// center must be a finite coordinate pair.
    pub async fn create(&self, req: MapRequest) -> Result<MapVisualization> {
        // ---
        if !(req.center_lat.is_finite() && req.center_lon.is_finite()) {
            return Err(Error::InvalidCoordinates {
                lat: req.center_lat,
                lon: req.center_lon,
            });
        }
        if self.store.get_dataset(req.dataset_id).await?.is_none() {
            return Err(Error::NotFound(Entity::Dataset));
        }
        if let Some(job_id) = req.processing_job_id {
            if self.store.get_job(job_id).await?.is_none() {
                return Err(Error::NotFound(Entity::ProcessingJob));
            }
        }

        let now = Utc::now();
        let layer_data =
            synthetic_layer(&mut rand::thread_rng(), req.center_lat, req.center_lon, now);

        let map = MapVisualization {
            id: Uuid::new_v4(),
            dataset_id: req.dataset_id,
            processing_job_id: req.processing_job_id,
            map_type: req.map_type,
            zoom_level: req.zoom_level,
            center_coordinates: [req.center_lat, req.center_lon],
            layer_data,
            created_timestamp: now,
        };
        self.store.insert_map(&map).await?;

        info!(
            map_id = %map.id,
            dataset_id = %map.dataset_id,
            map_type = %map.map_type,
            "Map visualization created"
        );
        Ok(map)
    }

    pub async fn list(&self) -> Result<Vec<MapVisualization>> {
        Ok(self.store.list_maps(self.list_limit).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<MapVisualization> {
        // ---
        match self.store.get_map(id).await? {
            Some(map) => Ok(map),
            None => {
                debug!(map_id = %id, "map lookup missed");
                Err(Error::NotFound(Entity::MapVisualization))
            }
        }
    }
}
