use geojson::{Feature, FeatureCollection, Geometry, Value as GeoValue};
use log::warn;
use serde_json::{Map, Value};

use crate::error::ConvertError;
use crate::flatten::flatten;
use crate::geometry::{extract_line_string, position_from_value};
use crate::options::SnapOptions;

type Result<T> = std::result::Result<T, ConvertError>;

/// Convert a snap-to-roads result into a FeatureCollection.
///
/// The response's `SnappedGeometry` line variant becomes one LineString
/// feature (`FeatureType = "SnappedGeometry"`); each entry of
/// `SnappedTracePoints` becomes a Point at its snapped position
/// (`"SnappedTracePoint"`), optionally accompanied by a Point at the
/// submitted original position (`"OriginalTracePoint"`). Snapped entries
/// without a snapped position are skipped with a warning.
pub fn snapped_points_to_feature_collection(
    response: &Value,
    opts: &SnapOptions,
) -> Result<FeatureCollection> {
    if response.get("SnappedGeometry").is_none() && response.get("SnappedTracePoints").is_none() {
        return Err(ConvertError::UnsupportedRecord {
            kind: "snap-to-roads response".to_string(),
        });
    }

    let mut features = Vec::new();

    if opts.include_snapped_geometry {
        if let Some(geometry) = response.get("SnappedGeometry") {
            let line = extract_line_string(geometry)?;
            if line.len() >= 2 {
                let mut props = Map::new();
                props.insert(
                    "FeatureType".to_string(),
                    Value::String("SnappedGeometry".to_string()),
                );
                features.push(Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(GeoValue::LineString(line))),
                    id: None,
                    properties: Some(props),
                    foreign_members: None,
                });
            }
        }
    }

    let trace_points = response
        .get("SnappedTracePoints")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for (i, entry) in trace_points.iter().enumerate() {
        let snapped = entry
            .get("SnappedPosition")
            .and_then(|v| position_from_value(v).ok());
        let original = entry
            .get("OriginalPosition")
            .and_then(|v| position_from_value(v).ok());

        if opts.include_snapped_trace_points {
            match snapped {
                Some(position) => {
                    features.push(point_with_entry_props(
                        position,
                        entry,
                        "SnappedTracePoint",
                        opts.flatten_properties,
                    ));
                }
                None => warn!("skipping snapped trace point {i}: no snapped position"),
            }
        }
        if opts.include_original_positions {
            if let Some(position) = original {
                features.push(point_with_entry_props(
                    position,
                    entry,
                    "OriginalTracePoint",
                    opts.flatten_properties,
                ));
            }
        }
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn point_with_entry_props(
    position: Vec<f64>,
    entry: &Value,
    feature_type: &str,
    flatten_properties: bool,
) -> Feature {
    let mut obj = entry.as_object().cloned().unwrap_or_default();
    obj.shift_remove("SnappedPosition");
    let mut props = if flatten_properties {
        flatten(&Value::Object(obj), "")
    } else {
        obj
    };
    props.insert(
        "FeatureType".to_string(),
        Value::String(feature_type.to_string()),
    );
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoValue::Point(position))),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response() -> Value {
        json!({
            "SnappedGeometry": {"LineString": [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]},
            "SnappedTracePoints": [
                {
                    "OriginalPosition": [0.1, 0.1],
                    "SnappedPosition": [0.0, 0.0],
                    "Confidence": 0.9
                },
                {
                    "OriginalPosition": [1.9, 2.1],
                    "SnappedPosition": [2.0, 2.0],
                    "Confidence": 0.7
                }
            ]
        })
    }

    #[test]
    fn test_line_and_snapped_points() {
        let fc = snapped_points_to_feature_collection(&response(), &SnapOptions::default()).unwrap();
        assert_eq!(fc.features.len(), 3);

        let line = &fc.features[0];
        assert_eq!(
            line.properties.as_ref().unwrap()["FeatureType"],
            "SnappedGeometry"
        );

        let point = &fc.features[1];
        let props = point.properties.as_ref().unwrap();
        assert_eq!(props["FeatureType"], "SnappedTracePoint");
        assert_eq!(props["Confidence"], 0.9);
        // Original position stays atomic in the flat property map.
        assert_eq!(props["OriginalPosition"], json!([0.1, 0.1]));
        assert!(!props.contains_key("SnappedPosition"));
    }

    #[test]
    fn test_original_positions_opt_in() {
        let opts = SnapOptions { include_original_positions: true, ..SnapOptions::default() };
        let fc = snapped_points_to_feature_collection(&response(), &opts).unwrap();
        let originals = fc
            .features
            .iter()
            .filter(|f| f.properties.as_ref().unwrap()["FeatureType"] == "OriginalTracePoint")
            .count();
        assert_eq!(originals, 2);
    }

    #[test]
    fn test_geometry_only_response() {
        let response = json!({"SnappedGeometry": {"LineString": [[0.0, 0.0], [1.0, 1.0]]}});
        let fc = snapped_points_to_feature_collection(&response, &SnapOptions::default()).unwrap();
        assert_eq!(fc.features.len(), 1);
    }

    #[test]
    fn test_unknown_shape_is_unsupported() {
        assert!(snapped_points_to_feature_collection(&json!({}), &SnapOptions::default()).is_err());
    }
}
