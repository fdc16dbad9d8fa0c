//! Delivery rows and optimized route rows.
//!
//! Coordinates are stored as plain degrees. Geometry handed to the storage
//! side is always WGS84 longitude/latitude.

use chrono::NaiveDateTime;
use geo::Point;
use serde::{Deserialize, Serialize};

/// A WGS84 point: `x` is longitude, `y` is latitude, both in degrees.
pub type GeoPoint = Point<f64>;

/// One validated input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub delivery_id: u64,
    pub pickup_lat: f64,
    pub pickup_lon: f64,
    pub dropoff_lat: f64,
    pub dropoff_lon: f64,
    pub timestamp: NaiveDateTime,
}

impl DeliveryRecord {
    pub fn pickup(&self) -> GeoPoint {
        GeoPoint::new(self.pickup_lon, self.pickup_lat)
    }

    pub fn dropoff(&self) -> GeoPoint {
        GeoPoint::new(self.dropoff_lon, self.dropoff_lat)
    }
}

/// One delivery in its optimized position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    #[serde(flatten)]
    pub delivery: DeliveryRecord,
    /// Pickup location exactly as it appeared in the input row.
    pub geometry: GeoPoint,
    /// Index of the batch that produced this row.
    pub batch_index: usize,
    /// Position within the batch's visiting order, starting at 0.
    pub sequence: usize,
}

impl OptimizedRoute {
    pub fn delivery_id(&self) -> u64 {
        self.delivery.delivery_id
    }

    /// Well-known-text rendering of the geometry, e.g. `POINT (-74.006 40.7128)`.
    pub fn geometry_wkt(&self) -> String {
        format!("POINT ({} {})", self.geometry.x(), self.geometry.y())
    }
}
