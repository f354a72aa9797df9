use geojson::feature::Id;
use geojson::FeatureCollection;
use log::warn;
use serde_json::Value;

use crate::error::ConvertError;
use crate::geometry::position_from_value;
use crate::places::point_feature;

type Result<T> = std::result::Result<T, ConvertError>;

/// Convert a device position response into a FeatureCollection of Point
/// features.
///
/// Handles the singular get-position shape (`Position` at the top level)
/// and the history/list shapes (`DevicePositions` / `Entries` arrays).
/// Positions become geometry; the remaining fields (DeviceId, SampleTime,
/// Accuracy, ...) become flattened properties.
pub fn device_positions_to_feature_collection(
    response: &Value,
    flatten_properties: bool,
) -> Result<FeatureCollection> {
    let entries: Vec<&Value> = if response.get("Position").is_some() {
        vec![response]
    } else if let Some(entries) = response
        .get("DevicePositions")
        .or_else(|| response.get("Entries"))
        .and_then(Value::as_array)
    {
        entries.iter().collect()
    } else {
        return Err(ConvertError::UnsupportedRecord {
            kind: "device position response".to_string(),
        });
    };

    let features = entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let Some(position) = entry.get("Position").and_then(|v| position_from_value(v).ok())
            else {
                warn!("dropping device position entry {i}: no position");
                return None;
            };
            let mut obj = entry.as_object()?.clone();
            obj.shift_remove("Position");
            let id = entry
                .get("DeviceId")
                .and_then(Value::as_str)
                .map(|s| Id::String(s.to_string()));
            Some(point_feature(position, &Value::Object(obj), id, flatten_properties))
        })
        .collect();

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}
