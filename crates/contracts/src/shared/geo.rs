//! Geographic primitives shared by the map endpoints (EPSG:4326, degrees).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lookup::opaque_id;
use super::null_as_empty;

/// Axis-aligned lon/lat box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Builds a box from the server's `[minLon, minLat, maxLon, maxLat]` order.
    ///
    /// Returns `None` for inverted or non-finite extents. Zero-width boxes
    /// (a single point, points on one meridian) are kept.
    pub fn from_extent(extent: [f64; 4]) -> Option<Self> {
        let [min_lon, min_lat, max_lon, max_lat] = extent;
        let bbox = Self::new(min_lat, min_lon, max_lat, max_lon);
        bbox.is_valid().then_some(bbox)
    }

    pub fn is_valid(&self) -> bool {
        [self.south, self.west, self.north, self.east]
            .iter()
            .all(|v| v.is_finite())
            && self.west <= self.east
            && self.south <= self.north
    }

    /// Box collapsed to one point.
    pub fn is_point(&self) -> bool {
        self.west == self.east && self.south == self.north
    }

    /// Query parameter form: `minLon,minLat,maxLon,maxLat`.
    pub fn to_param(&self) -> String {
        format!("{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

/// GeoJSON FeatureCollection as produced by the layer endpoints.
///
/// The server may attach an `error` key next to an empty feature list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties
            .as_ref()
            .and_then(|p| p.get(key))
            .filter(|v| !v.is_null())
    }

    /// Property rendered as text; numbers are formatted, `null` is absent.
    pub fn property_text(&self, key: &str) -> Option<String> {
        self.property(key).map(opaque_id)
    }

    /// Integer property; numeric strings are accepted.
    pub fn property_i64(&self, key: &str) -> Option<i64> {
        match self.property(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Geometry object; coordinates are kept raw and handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

impl Geometry {
    /// `(lon, lat)` of a `Point` geometry.
    pub fn point_lon_lat(&self) -> Option<(f64, f64)> {
        if self.kind != "Point" {
            return None;
        }
        let coords = self.coordinates.as_array()?;
        let lon = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        Some((lon, lat))
    }
}
