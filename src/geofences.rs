use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoValue};
use log::warn;
use serde_json::Value;

use crate::error::ConvertError;
use crate::flatten::flatten;
use crate::geometry::{position_from_value, round6};
use crate::types::{Circle, GeofenceEntry, GeofenceGeometry};

type Result<T> = std::result::Result<T, ConvertError>;

/// Mean earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Segment count for circle-to-polygon approximation.
const CIRCLE_SEGMENTS: usize = 48;

/// Convert a geofence response (get-geofence or list entries) into Polygon
/// features.
///
/// Polygon geofences pass their rings through; circle geofences are
/// approximated as a closed ring and keep `center`/`radius` properties so
/// [`feature_collection_to_geofence_entries`] can reconstruct the circle
/// exactly. Geofences with neither geometry are dropped with a warning.
pub fn geofences_to_feature_collection(
    response: &Value,
    flatten_properties: bool,
) -> Result<FeatureCollection> {
    let entries: Vec<&Value> = if response.get("Geometry").is_some() {
        vec![response]
    } else if let Some(entries) = response.get("Entries").and_then(Value::as_array) {
        entries.iter().collect()
    } else {
        return Err(ConvertError::UnsupportedRecord {
            kind: "geofence response".to_string(),
        });
    };

    let features = entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let feature = geofence_feature(entry, flatten_properties);
            if feature.is_none() {
                warn!("dropping geofence entry {i}: no polygon or circle geometry");
            }
            feature
        })
        .collect();

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn geofence_feature(entry: &Value, flatten_properties: bool) -> Option<Feature> {
    let geometry = entry.get("Geometry")?;

    let mut circle_props: Option<(Vec<f64>, f64)> = None;
    let rings: Vec<Vec<Vec<f64>>> = if let Some(polygon) = geometry.get("Polygon").and_then(Value::as_array) {
        polygon
            .iter()
            .map(|ring| {
                ring.as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(|p| position_from_value(p).ok())
                    .collect()
            })
            .collect()
    } else if let Some(circle) = geometry.get("Circle") {
        let center = position_from_value(circle.get("Center")?).ok()?;
        let radius = circle.get("Radius")?.as_f64()?;
        let ring = circle_ring(&center, radius, CIRCLE_SEGMENTS);
        circle_props = Some((center, radius));
        vec![ring]
    } else {
        return None;
    };

    if rings.is_empty() || rings[0].is_empty() {
        return None;
    }

    let id = entry
        .get("GeofenceId")
        .and_then(Value::as_str)
        .map(|s| Id::String(s.to_string()));

    let mut obj = entry.as_object()?.clone();
    obj.shift_remove("Geometry");
    let mut props = if flatten_properties {
        flatten(&Value::Object(obj), "")
    } else {
        obj
    };
    if let Some((center, radius)) = circle_props {
        props.insert("center".to_string(), Value::from(center));
        props.insert("radius".to_string(), Value::from(radius));
    }

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoValue::Polygon(rings))),
        id,
        properties: Some(props),
        foreign_members: None,
    })
}

/// Approximate a circle as a closed counterclockwise ring using the
/// spherical destination-point formula.
fn circle_ring(center: &[f64], radius_m: f64, segments: usize) -> Vec<Vec<f64>> {
    let lon1 = center[0].to_radians();
    let lat1 = center[1].to_radians();
    let angular = radius_m / EARTH_RADIUS_M;

    let mut ring = Vec::with_capacity(segments + 1);
    for i in 0..segments {
        let bearing = -(i as f64) * std::f64::consts::TAU / segments as f64;
        let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());
        ring.push(vec![round6(lon2.to_degrees()), round6(lat2.to_degrees())]);
    }
    ring.push(ring[0].clone());
    ring
}

/// Convert a GeoJSON FeatureCollection into batch-put geofence entries.
///
/// Polygon features map to polygon geofences. A feature carrying
/// `center`/`radius` properties (the output of a prior circle conversion)
/// or a Point feature with a `radius` property maps to a circle geofence.
/// Features with no usable geometry are dropped, never emitted as null
/// entries. The geofence id comes from the feature id, a `geofenceId`
/// property, or falls back to `geofence-<index>`.
pub fn feature_collection_to_geofence_entries(fc: &FeatureCollection) -> Vec<GeofenceEntry> {
    let mut entries = Vec::new();

    for (i, feature) in fc.features.iter().enumerate() {
        let Some(geometry) = entry_geometry(feature) else {
            warn!("dropping feature {i}: no geofence-compatible geometry");
            continue;
        };
        entries.push(GeofenceEntry {
            geofence_id: entry_id(feature, i),
            geometry,
        });
    }

    entries
}

fn entry_geometry(feature: &Feature) -> Option<GeofenceGeometry> {
    let props = feature.properties.as_ref();

    // center/radius properties reconstruct the original circle exactly.
    if let Some(props) = props {
        let center = props.get("center").and_then(|v| position_from_value(v).ok());
        let radius = props.get("radius").and_then(Value::as_f64);
        if let (Some(center), Some(radius)) = (center, radius) {
            return Some(circle_geometry([center[0], center[1]], radius));
        }
    }

    match &feature.geometry.as_ref()?.value {
        GeoValue::Polygon(rings) => {
            if rings.is_empty() || rings[0].len() < 4 {
                return None;
            }
            let polygon: Option<Vec<Vec<[f64; 2]>>> = rings
                .iter()
                .map(|ring| {
                    ring.iter()
                        .map(|p| (p.len() >= 2).then(|| [p[0], p[1]]))
                        .collect()
                })
                .collect();
            Some(GeofenceGeometry { polygon: Some(polygon?), circle: None })
        }
        GeoValue::Point(point) => {
            let radius = props?.get("radius").and_then(Value::as_f64)?;
            Some(circle_geometry([point[0], point[1]], radius))
        }
        _ => None,
    }
}

fn circle_geometry(center: [f64; 2], radius: f64) -> GeofenceGeometry {
    GeofenceGeometry {
        polygon: None,
        circle: Some(Circle { center, radius }),
    }
}

fn entry_id(feature: &Feature, index: usize) -> String {
    match &feature.id {
        Some(Id::String(s)) => return s.clone(),
        Some(Id::Number(n)) => return n.to_string(),
        None => {}
    }
    feature
        .properties
        .as_ref()
        .and_then(|p| p.get("geofenceId").or_else(|| p.get("GeofenceId")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("geofence-{index}"))
}
