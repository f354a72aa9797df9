use serde_json::{Map, Value};

/// Keys whose values are fixed-shape coordinate tuples or arrays, not
/// semantic lists. They are carried into the flat map verbatim instead of
/// being split into `Key.0`, `Key.1`, ... entries.
pub const DO_NOT_FLATTEN: &[&str] = &[
    "Geometry",
    "Position",
    "Center",
    "BoundingBox",
    "BiasPosition",
    "QueryPosition",
    "DeparturePosition",
    "DestinationPosition",
    "StartPosition",
    "EndPosition",
    "Point",
    "SnappedPosition",
    "SnappedOrigin",
    "SnappedDestination",
    "OriginalPosition",
    "Origin",
    "Destination",
    "FilterBBox",
    "ResultBBox",
    "RouteBBox",
    "MapView",
    "LineString",
];

/// Keys holding a list of position arrays (polygon rings and the like):
/// flattened exactly one level, each entry staying an atomic coordinate
/// list under `Key.<index>`.
pub const FLATTEN_ONE_LEVEL: &[&str] = &["Polygon", "PolylinePolygon", "SnappedPositions"];

/// Recursively flatten a nested JSON tree into a single-level map with
/// dot/index-joined keys.
///
/// Insertion order mirrors depth-first source traversal. A non-object,
/// non-array `value` yields an empty map. Already-flat input comes back
/// equal.
pub fn flatten(value: &Value, prefix: &str) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(&mut out, value, prefix);
    out
}

fn flatten_into(out: &mut Map<String, Value>, value: &Value, prefix: &str) {
    match value {
        Value::Array(entries) => {
            for (i, entry) in entries.iter().enumerate() {
                let key = join_key(prefix, &i.to_string());
                if entry.is_object() || entry.is_array() {
                    flatten_into(out, entry, &key);
                } else {
                    out.insert(key, entry.clone());
                }
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                let key = join_key(prefix, k);
                if !v.is_object() && !v.is_array() {
                    out.insert(key, v.clone());
                } else if DO_NOT_FLATTEN.contains(&k.as_str()) {
                    out.insert(key, v.clone());
                } else if FLATTEN_ONE_LEVEL.contains(&k.as_str()) {
                    match v {
                        Value::Array(rings) => {
                            for (i, ring) in rings.iter().enumerate() {
                                out.insert(format!("{key}.{i}"), ring.clone());
                            }
                        }
                        _ => {
                            out.insert(key, v.clone());
                        }
                    }
                } else {
                    flatten_into(out, v, &key);
                }
            }
        }
        _ => {}
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
