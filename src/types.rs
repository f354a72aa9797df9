use serde::{Deserialize, Serialize};

/// A single GPS sample forming part of a travel path.
///
/// Serializes with the PascalCase field names the location API's
/// snap-to-roads request expects; absent optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TracePoint {
    /// `[longitude, latitude]` in WGS84 decimal degrees.
    pub position: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_kmh: Option<f64>,
    /// ISO 8601 timestamp, passed through verbatim from the source format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Heading in degrees, 0–360.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_deg: Option<f64>,
}

impl TracePoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            position: [lon, lat],
            speed_kmh: None,
            timestamp: None,
            heading_deg: None,
        }
    }
}

/// One batch-put geofence request entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeofenceEntry {
    pub geofence_id: String,
    pub geometry: GeofenceGeometry,
}

/// Geofence geometry: exactly one of a polygon or a circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeofenceGeometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<Vec<[f64; 2]>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle: Option<Circle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Circle {
    /// `[longitude, latitude]` center.
    pub center: [f64; 2],
    /// Radius in meters.
    pub radius: f64,
}
