use geojson::{Feature, FeatureCollection, Geometry, Value as GeoValue};
use log::warn;
use serde_json::Value;

use crate::error::ConvertError;
use crate::flatten::flatten;
use crate::geometry::extract_polygon;
use crate::options::ErrorPolicy;

type Result<T> = std::result::Result<T, ConvertError>;

/// Convert an isoline calculation response into Polygon features.
///
/// Each entry of `Isolines` (or a single isoline object) contributes one
/// Polygon resolved through the geometry variant (explicit rings or an
/// encoded `PolylinePolygon`). An unresolvable isoline fails the call under
/// `Strict` and is dropped with a warning under `Skip`.
pub fn isolines_to_feature_collection(
    response: &Value,
    flatten_properties: bool,
    on_error: ErrorPolicy,
) -> Result<FeatureCollection> {
    let isolines: Vec<&Value> = if let Some(entries) = response.get("Isolines").and_then(Value::as_array) {
        entries.iter().collect()
    } else if response.get("Geometry").is_some() {
        vec![response]
    } else {
        return Err(ConvertError::UnsupportedRecord {
            kind: "isoline response".to_string(),
        });
    };

    let mut features = Vec::new();
    for (i, isoline) in isolines.into_iter().enumerate() {
        // The geometry variant can be nested or carried inline.
        let geometry = isoline.get("Geometry").unwrap_or(isoline);
        let rings = match extract_polygon(geometry) {
            Ok(rings) => rings,
            Err(ConvertError::MissingGeometry) if on_error == ErrorPolicy::Skip => {
                warn!("dropping isoline {i}: no usable geometry");
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut obj = isoline.as_object().cloned().unwrap_or_default();
        obj.shift_remove("Geometry");
        let props = if flatten_properties {
            flatten(&Value::Object(obj), "")
        } else {
            obj
        };

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(GeoValue::Polygon(rings))),
            id: None,
            properties: Some(props),
            foreign_members: None,
        });
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ring() -> Value {
        json!([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]])
    }

    #[test]
    fn test_isolines_become_polygons() {
        let response = json!({
            "Isolines": [{
                "TimeThreshold": 300,
                "Geometry": {"Polygon": [ring()]}
            }]
        });
        let fc = isolines_to_feature_collection(&response, true, ErrorPolicy::Strict).unwrap();
        assert_eq!(fc.features.len(), 1);
        match &fc.features[0].geometry.as_ref().unwrap().value {
            GeoValue::Polygon(rings) => assert_eq!(rings[0].len(), 4),
            _ => panic!("expected Polygon"),
        }
        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["TimeThreshold"], 300);
        assert!(!props.contains_key("Geometry"));
    }

    #[test]
    fn test_strict_fails_on_missing_geometry() {
        let response = json!({"Isolines": [{"TimeThreshold": 300, "Geometry": {}}]});
        assert!(matches!(
            isolines_to_feature_collection(&response, true, ErrorPolicy::Strict),
            Err(ConvertError::MissingGeometry)
        ));
    }

    #[test]
    fn test_skip_drops_bad_isoline() {
        let response = json!({
            "Isolines": [
                {"Geometry": {}},
                {"Geometry": {"Polygon": [ring()]}}
            ]
        });
        let fc = isolines_to_feature_collection(&response, true, ErrorPolicy::Skip).unwrap();
        assert_eq!(fc.features.len(), 1);
    }

    #[test]
    fn test_single_isoline_object() {
        let response = json!({"Geometry": {"Polygon": [ring()]}});
        let fc = isolines_to_feature_collection(&response, true, ErrorPolicy::Strict).unwrap();
        assert_eq!(fc.features.len(), 1);
    }
}
