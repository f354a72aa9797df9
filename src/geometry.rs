use flexpolyline::Polyline;
use serde_json::Value;

use crate::error::ConvertError;

/// `[lon, lat]` in WGS84 decimal degrees.
pub type Position = Vec<f64>;

type Result<T> = std::result::Result<T, ConvertError>;

/// Prefix marking an encoded flexible polyline in text trace input.
pub const FLEXIBLE_POLYLINE_PREFIX: &str = "FP:";

/// Normalize a line geometry variant into a coordinate sequence.
///
/// An explicit non-empty `LineString` array wins; otherwise an encoded
/// `Polyline` string is decoded. Neither present is `MissingGeometry`.
pub fn extract_line_string(geometry: &Value) -> Result<Vec<Position>> {
    if let Some(coords) = geometry.get("LineString").and_then(Value::as_array) {
        if !coords.is_empty() {
            return coords.iter().map(position_from_value).collect();
        }
    }
    if let Some(encoded) = geometry.get("Polyline").and_then(Value::as_str) {
        return decode_flexible_polyline(encoded);
    }
    Err(ConvertError::MissingGeometry)
}

/// Normalize a polygon geometry variant into a sequence of rings.
///
/// Explicit `Polygon` rings win; otherwise each entry of `PolylinePolygon`
/// is decoded as one ring.
pub fn extract_polygon(geometry: &Value) -> Result<Vec<Vec<Position>>> {
    if let Some(rings) = geometry.get("Polygon").and_then(Value::as_array) {
        if !rings.is_empty() {
            return rings
                .iter()
                .map(|ring| {
                    ring.as_array()
                        .ok_or_else(|| ConvertError::MalformedInput {
                            context: "polygon ring is not an array".to_string(),
                        })?
                        .iter()
                        .map(position_from_value)
                        .collect()
                })
                .collect();
        }
    }
    if let Some(rings) = geometry.get("PolylinePolygon").and_then(Value::as_array) {
        if !rings.is_empty() {
            return rings
                .iter()
                .map(|ring| {
                    let encoded =
                        ring.as_str().ok_or_else(|| ConvertError::MalformedInput {
                            context: "encoded polygon ring is not a string".to_string(),
                        })?;
                    decode_flexible_polyline(encoded)
                })
                .collect();
        }
    }
    Err(ConvertError::MissingGeometry)
}

/// Decode a flexible polyline into `[lon, lat]` positions rounded to six
/// decimal places. A leading `FP:` prefix is accepted and stripped; any
/// third dimension in the encoding is dropped.
pub fn decode_flexible_polyline(encoded: &str) -> Result<Vec<Position>> {
    let encoded = encoded.strip_prefix(FLEXIBLE_POLYLINE_PREFIX).unwrap_or(encoded);
    let decoded =
        Polyline::decode(encoded).map_err(|e| ConvertError::PolylineDecode(e.to_string()))?;
    let positions = match decoded {
        Polyline::Data2d { coordinates, .. } => coordinates
            .into_iter()
            .map(|(lat, lon)| vec![round6(lon), round6(lat)])
            .collect(),
        Polyline::Data3d { coordinates, .. } => coordinates
            .into_iter()
            .map(|(lat, lon, _)| vec![round6(lon), round6(lat)])
            .collect(),
    };
    Ok(positions)
}

/// Read a `[lon, lat, ...]` JSON array as a position, keeping lon/lat only.
pub fn position_from_value(value: &Value) -> Result<Position> {
    let nums = value.as_array().ok_or_else(|| ConvertError::MalformedInput {
        context: "position is not an array".to_string(),
    })?;
    if nums.len() < 2 {
        return Err(ConvertError::MalformedInput {
            context: "position has fewer than two components".to_string(),
        });
    }
    let lon = nums[0].as_f64().ok_or_else(|| ConvertError::MalformedInput {
        context: "non-numeric longitude".to_string(),
    })?;
    let lat = nums[1].as_f64().ok_or_else(|| ConvertError::MalformedInput {
        context: "non-numeric latitude".to_string(),
    })?;
    Ok(vec![lon, lat])
}

pub fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}
