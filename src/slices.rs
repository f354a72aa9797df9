use geojson::{Feature, Geometry, Value as GeoValue};
use log::warn;
use serde_json::{Map, Value};

use crate::flatten::flatten;
use crate::geometry::Position;

/// Marker field naming an index into the parent line's coordinates. It is
/// positional bookkeeping and never emitted as a property.
const GEOMETRY_OFFSET: &str = "GeometryOffset";

/// Which features [`extract_slices`] emits per marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SliceEmit {
    /// A LineString over the marker's sub-segment (slices of >= 2 points).
    pub lines: bool,
    /// A Point at the sub-segment's first coordinate.
    pub start_points: bool,
}

/// Slice a parent line into sub-segments described by ordered markers
/// carrying a `GeometryOffset` index (travel steps, spans).
///
/// Marker `i` spans the coordinates from its own offset through the next
/// marker's offset inclusive, so adjacent slices overlap by one point; the
/// last marker runs to the end of the parent line. Each emitted feature
/// gets the marker's remaining fields (flattened when `flatten_properties`)
/// plus `FeatureType = feature_type`. Empty markers emit nothing.
pub fn extract_slices(
    parent: &[Position],
    markers: &[Value],
    feature_type: &str,
    emit: SliceEmit,
    flatten_properties: bool,
) -> Vec<Feature> {
    let mut features = Vec::new();
    if parent.is_empty() {
        return features;
    }

    for (i, marker) in markers.iter().enumerate() {
        let Some(offset) = marker.get(GEOMETRY_OFFSET).and_then(Value::as_u64) else {
            warn!("skipping {feature_type} marker {i}: missing GeometryOffset");
            continue;
        };
        let start = (offset as usize).min(parent.len() - 1);
        let end = match markers.get(i + 1).and_then(|m| m.get(GEOMETRY_OFFSET)).and_then(Value::as_u64) {
            // One point of overlap with the next slice.
            Some(next) => (next as usize).min(parent.len() - 1),
            None => parent.len() - 1,
        };
        if end < start {
            warn!("skipping {feature_type} marker {i}: offsets out of order");
            continue;
        }
        let slice = &parent[start..=end];

        let props = marker_properties(marker, feature_type, flatten_properties);

        if emit.lines && slice.len() >= 2 {
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::LineString(slice.to_vec()))),
                id: None,
                properties: Some(props.clone()),
                foreign_members: None,
            });
        }
        if emit.start_points {
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::Point(slice[0].clone()))),
                id: None,
                properties: Some(props),
                foreign_members: None,
            });
        }
    }

    features
}

fn marker_properties(
    marker: &Value,
    feature_type: &str,
    flatten_properties: bool,
) -> Map<String, Value> {
    let metadata = match marker {
        Value::Object(map) => {
            let mut map = map.clone();
            map.shift_remove(GEOMETRY_OFFSET);
            map
        }
        _ => Map::new(),
    };
    let mut props = if flatten_properties {
        flatten(&Value::Object(metadata), "")
    } else {
        metadata
    };
    props.insert(
        "FeatureType".to_string(),
        Value::String(feature_type.to_string()),
    );
    props
}
