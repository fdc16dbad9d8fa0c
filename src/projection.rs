//! UTM zone selection and WGS84 <-> UTM transforms.
//!
//! A batch is projected into the single zone of its first pickup point so that
//! planar distances inside the batch are comparable. Points outside that zone
//! are still projected, with growing scale error; batches spanning several
//! zones trade accuracy for consistency.

use std::fmt;

use geo::{EuclideanDistance, Point};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::record::GeoPoint;

const GEOGRAPHIC: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";

const ZONE_WIDTH_DEG: f64 = 6.0;
const MAX_ZONE: u8 = 60;

/// A projected point in meters: `x` is easting, `y` is northing.
pub type PlanarPoint = Point<f64>;

/// Straight-line distance in meters between two points of the same zone.
pub fn planar_distance(a: &PlanarPoint, b: &PlanarPoint) -> f64 {
    a.euclidean_distance(b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

/// A hemisphere-qualified UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmZone {
    pub number: u8,
    pub hemisphere: Hemisphere,
}

impl UtmZone {
    /// Zone containing the given reference point.
    ///
    /// The zone number is `floor((lon + 180) / 6) + 1`. Longitude 180 would
    /// yield 61 and is folded into zone 60.
    pub fn for_point(point: GeoPoint) -> Self {
        let raw = ((point.x() + 180.0) / ZONE_WIDTH_DEG).floor() as i64 + 1;
        let number = raw.clamp(1, i64::from(MAX_ZONE)) as u8;
        let hemisphere = if point.y() >= 0.0 {
            Hemisphere::North
        } else {
            Hemisphere::South
        };
        Self { number, hemisphere }
    }

    /// EPSG code of the WGS84 / UTM coordinate system for this zone.
    pub fn epsg(&self) -> u32 {
        let base = match self.hemisphere {
            Hemisphere::North => 32600,
            Hemisphere::South => 32700,
        };
        base + u32::from(self.number)
    }

    fn proj_string(&self) -> String {
        let south = match self.hemisphere {
            Hemisphere::North => "",
            Hemisphere::South => " +south",
        };
        format!(
            "+proj=utm +zone={}{south} +ellps=WGS84 +datum=WGS84 +units=m +no_defs",
            self.number
        )
    }

    fn error(&self, err: impl fmt::Display) -> ProjectionError {
        ProjectionError {
            epsg: self.epsg(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Forward and inverse transforms between WGS84 and one UTM zone.
pub struct UtmProjection {
    zone: UtmZone,
    geographic: Proj,
    planar: Proj,
}

impl UtmProjection {
    pub fn new(zone: UtmZone) -> Result<Self, ProjectionError> {
        let geographic = Proj::from_proj_string(GEOGRAPHIC).map_err(|e| zone.error(e))?;
        let planar = Proj::from_proj_string(&zone.proj_string()).map_err(|e| zone.error(e))?;
        Ok(Self {
            zone,
            geographic,
            planar,
        })
    }

    /// Projection for the zone containing `reference`.
    pub fn for_reference(reference: GeoPoint) -> Result<Self, ProjectionError> {
        Self::new(UtmZone::for_point(reference))
    }

    pub fn zone(&self) -> UtmZone {
        self.zone
    }

    /// WGS84 degrees to UTM meters. Fails when the result is not finite.
    pub fn forward(&self, point: GeoPoint) -> Result<PlanarPoint, ProjectionError> {
        let mut xyz = (point.x().to_radians(), point.y().to_radians(), 0.0);
        transform(&self.geographic, &self.planar, &mut xyz).map_err(|e| self.zone.error(e))?;
        self.finite(xyz.0, xyz.1)
    }

    /// UTM meters back to WGS84 degrees.
    pub fn inverse(&self, point: PlanarPoint) -> Result<GeoPoint, ProjectionError> {
        let mut xyz = (point.x(), point.y(), 0.0);
        transform(&self.planar, &self.geographic, &mut xyz).map_err(|e| self.zone.error(e))?;
        self.finite(xyz.0.to_degrees(), xyz.1.to_degrees())
    }

    fn finite(&self, x: f64, y: f64) -> Result<Point<f64>, ProjectionError> {
        if x.is_finite() && y.is_finite() {
            Ok(Point::new(x, y))
        } else {
            Err(self.zone.error(format!("non-finite result ({x}, {y})")))
        }
    }
}

impl fmt::Debug for UtmProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtmProjection").field("zone", &self.zone).finish()
    }
}
