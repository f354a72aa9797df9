use geojson::{FeatureCollection, Value as GeoValue};
use log::warn;

use crate::error::ConvertError;
use crate::types::TracePoint;

/// Convert a GeoJSON FeatureCollection into trace points.
///
/// Point features contribute one trace point, MultiPoint and LineString
/// features one per coordinate. Other geometry types (and features without
/// geometry) are skipped with a warning. A `timestamp` (or `Timestamp`)
/// property on a Point feature carries onto its trace point.
pub fn geojson_to_trace_points(input: &str) -> Result<Vec<TracePoint>, ConvertError> {
    let fc: FeatureCollection = input
        .parse()
        .map_err(|e: geojson::Error| ConvertError::MalformedInput {
            context: format!("invalid GeoJSON: {e}"),
        })?;

    let mut points = Vec::new();
    for (i, feature) in fc.features.iter().enumerate() {
        let Some(geometry) = feature.geometry.as_ref() else {
            warn!("skipping feature {i}: no geometry");
            continue;
        };
        match &geometry.value {
            GeoValue::Point(coords) => {
                if let Some(mut point) = trace_point(coords) {
                    point.timestamp = feature
                        .properties
                        .as_ref()
                        .and_then(|p| p.get("timestamp").or_else(|| p.get("Timestamp")))
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    points.push(point);
                }
            }
            GeoValue::MultiPoint(coords) | GeoValue::LineString(coords) => {
                points.extend(coords.iter().filter_map(|c| trace_point(c)));
            }
            _ => {
                warn!("skipping feature {i}: unsupported geometry type");
            }
        }
    }
    Ok(points)
}

fn trace_point(coords: &[f64]) -> Option<TracePoint> {
    if coords.len() < 2 {
        return None;
    }
    Some(TracePoint::new(coords[0], coords[1]))
}
