use geojson::{Feature, FeatureCollection, Geometry, Value as GeoValue};
use serde_json::{Map, Value};

use crate::error::ConvertError;
use crate::flatten::flatten;
use crate::geometry::{extract_line_string, Position};
use crate::options::RoutesOptions;
use crate::slices::{extract_slices, SliceEmit};
use crate::stitch::stitch_legs;

type Result<T> = std::result::Result<T, ConvertError>;

/// Convert a route calculation response into a FeatureCollection.
///
/// Every route yields one stitched LineString feature tagged
/// `FeatureType = "Route"`; options add per-leg lines (`"Leg"`), travel
/// step sub-lines (`"TravelStepGeometry"`), travel step start points
/// (`"TravelStepStartPosition"`) and span sub-lines (`"Span"`). Travel
/// step and span markers index into their own leg's geometry. Legs with no
/// usable coordinate source follow `opts.on_error`.
pub fn routes_to_feature_collection(
    response: &Value,
    opts: &RoutesOptions,
) -> Result<FeatureCollection> {
    static NO_LEGS: &[Value] = &[];

    // Singular route shape is checked before the collection shape.
    let routes: Vec<&Value> = if response.get("Legs").is_some() {
        vec![response]
    } else if let Some(routes) = response.get("Routes").and_then(Value::as_array) {
        routes.iter().collect()
    } else {
        return Err(ConvertError::UnsupportedRecord {
            kind: "route response".to_string(),
        });
    };

    let mut features = Vec::new();
    for route in routes {
        let legs: &[Value] = route
            .get("Legs")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(NO_LEGS);

        let line = stitch_legs(legs, opts.on_error)?;
        if line.len() >= 2 {
            let mut props = route_properties(route, opts.flatten_properties);
            props.insert("FeatureType".to_string(), Value::String("Route".to_string()));
            features.push(line_feature(line, props));
        }

        for leg in legs {
            let Some(leg_line) = leg
                .get("Geometry")
                .and_then(|geometry| extract_line_string(geometry).ok())
            else {
                // stitch_legs already applied the error policy.
                continue;
            };

            if opts.include_legs && leg_line.len() >= 2 {
                let mut props = leg_properties(leg, opts.flatten_properties);
                props.insert("FeatureType".to_string(), Value::String("Leg".to_string()));
                features.push(line_feature(leg_line.clone(), props));
            }

            let steps = markers(leg, "TravelSteps");
            if opts.include_travel_step_geometry {
                features.extend(extract_slices(
                    &leg_line,
                    steps,
                    "TravelStepGeometry",
                    SliceEmit { lines: true, start_points: false },
                    opts.flatten_properties,
                ));
            }
            if opts.include_travel_step_start_positions {
                features.extend(extract_slices(
                    &leg_line,
                    steps,
                    "TravelStepStartPosition",
                    SliceEmit { lines: false, start_points: true },
                    opts.flatten_properties,
                ));
            }
            if opts.include_span_geometry {
                features.extend(extract_slices(
                    &leg_line,
                    markers(leg, "Spans"),
                    "Span",
                    SliceEmit { lines: true, start_points: false },
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

fn markers<'a>(leg: &'a Value, key: &str) -> &'a [Value] {
    static NONE: &[Value] = &[];
    leg.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(NONE)
}

/// Route fields minus the legs, which become geometry and leg features.
fn route_properties(route: &Value, flatten_properties: bool) -> Map<String, Value> {
    strip_and_flatten(route, &["Legs"], flatten_properties)
}

/// Leg fields minus geometry and the positional marker lists.
fn leg_properties(leg: &Value, flatten_properties: bool) -> Map<String, Value> {
    strip_and_flatten(leg, &["Geometry", "TravelSteps", "Spans"], flatten_properties)
}

fn strip_and_flatten(value: &Value, drop: &[&str], flatten_properties: bool) -> Map<String, Value> {
    let mut obj = value.as_object().cloned().unwrap_or_default();
    for key in drop {
        obj.shift_remove(*key);
    }
    if flatten_properties {
        flatten(&Value::Object(obj), "")
    } else {
        obj
    }
}

fn line_feature(line: Vec<Position>, props: Map<String, Value>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoValue::LineString(line))),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}
