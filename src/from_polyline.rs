use crate::error::ConvertError;
use crate::geometry::decode_flexible_polyline;
use crate::types::TracePoint;

/// Decode an encoded flexible polyline (optionally `FP:`-prefixed) into
/// position-only trace points.
pub fn polyline_to_trace_points(encoded: &str) -> Result<Vec<TracePoint>, ConvertError> {
    let line = decode_flexible_polyline(encoded.trim())?;
    Ok(line
        .into_iter()
        .map(|p| TracePoint::new(p[0], p[1]))
        .collect())
}
