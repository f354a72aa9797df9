use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoValue};
use log::warn;
use serde_json::{Map, Value};

use crate::error::ConvertError;
use crate::flatten::flatten;
use crate::geometry::{position_from_value, Position};

type Result<T> = std::result::Result<T, ConvertError>;

/// The place response variants, checked singular-shape first.
enum PlacesResponse<'a> {
    /// Get-place style: one place object at the top level.
    Single(&'a Value),
    /// Search/geocode results or suggestions.
    Collection(&'a [Value]),
}

fn classify(response: &Value) -> Result<PlacesResponse<'_>> {
    if response.get("Place").is_some() || response.get("Position").is_some() {
        return Ok(PlacesResponse::Single(response));
    }
    for key in ["Results", "ResultItems"] {
        if let Some(entries) = response.get(key).and_then(Value::as_array) {
            return Ok(PlacesResponse::Collection(entries));
        }
    }
    Err(ConvertError::UnsupportedRecord {
        kind: "place response".to_string(),
    })
}

/// Convert a place response (get-place, search results, suggestions) into
/// a FeatureCollection of Point features.
///
/// Entries without a resolvable position (text-only suggestions) are
/// dropped. The feature id comes from `PlaceId` when present; properties
/// are the entry's remaining fields, flattened when requested.
pub fn places_to_feature_collection(
    response: &Value,
    flatten_properties: bool,
) -> Result<FeatureCollection> {
    let entries: Vec<&Value> = match classify(response)? {
        PlacesResponse::Single(entry) => vec![entry],
        PlacesResponse::Collection(entries) => entries.iter().collect(),
    };

    let features = entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let feature = place_feature(entry, flatten_properties);
            if feature.is_none() {
                warn!("dropping place entry {i}: no position");
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

fn place_feature(entry: &Value, flatten_properties: bool) -> Option<Feature> {
    let position = place_position(entry)?;
    let mut obj = entry.as_object()?.clone();

    // The position becomes the feature geometry, not a property.
    obj.shift_remove("Position");
    if let Some(Value::Object(place)) = obj.get_mut("Place") {
        place.shift_remove("Geometry");
    }

    let id = entry
        .get("PlaceId")
        .or_else(|| entry.get("Place").and_then(|p| p.get("PlaceId")))
        .and_then(Value::as_str)
        .map(|s| Id::String(s.to_string()));

    Some(point_feature(position, &Value::Object(obj), id, flatten_properties))
}

/// Position precedence: top-level `Position`, then the legacy
/// `Place.Geometry.Point` nesting.
fn place_position(entry: &Value) -> Option<Position> {
    if let Some(position) = entry.get("Position") {
        return position_from_value(position).ok();
    }
    let point = entry.get("Place")?.get("Geometry")?.get("Point")?;
    position_from_value(point).ok()
}

/// Shared Point-feature builder for place and device-position entries.
pub(crate) fn point_feature(
    position: Position,
    properties: &Value,
    id: Option<Id>,
    flatten_properties: bool,
) -> Feature {
    let props = if flatten_properties {
        flatten(properties, "")
    } else {
        match properties {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        }
    };
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoValue::Point(position))),
        id,
        properties: Some(props),
        foreign_members: None,
    }
}
