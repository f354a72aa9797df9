pub mod devices;
pub mod error;
pub mod flatten;
pub mod from_csv;
pub mod from_geojson;
pub mod from_gpx;
pub mod from_kml;
pub mod from_nmea;
pub mod from_polyline;
pub mod geofences;
pub mod geometry;
pub mod isolines;
pub mod options;
pub mod places;
pub mod routes;
pub mod slices;
pub mod snap;
pub mod stitch;
pub mod types;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::options::{CsvOptions, ErrorPolicy, RoutesOptions, SnapOptions};

/// Convert CSV trace data to a trace point list.
#[wasm_bindgen(js_name = csvToTracePoints)]
pub fn csv_to_trace_points(csv: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts: CsvOptions = parse_options(options)?;
    let points = from_csv::csv_to_trace_points(csv, &opts).map_err(JsValue::from)?;
    to_js(&points)
}

/// Convert a GPX document to a trace point list.
#[wasm_bindgen(js_name = gpxToTracePoints)]
pub fn gpx_to_trace_points(xml: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let points = from_gpx::gpx_to_trace_points(xml).map_err(JsValue::from)?;
    to_js(&points)
}

/// Convert a KML document to a trace point list.
#[wasm_bindgen(js_name = kmlToTracePoints)]
pub fn kml_to_trace_points(xml: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let points = from_kml::kml_to_trace_points(xml).map_err(JsValue::from)?;
    to_js(&points)
}

/// Convert NMEA 0183 text to a trace point list.
#[wasm_bindgen(js_name = nmeaToTracePoints)]
pub fn nmea_to_trace_points(text: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let points = from_nmea::nmea_to_trace_points(text).map_err(JsValue::from)?;
    to_js(&points)
}

/// Decode an encoded flexible polyline (optionally `FP:`-prefixed) to a
/// trace point list.
#[wasm_bindgen(js_name = polylineToTracePoints)]
pub fn polyline_to_trace_points(encoded: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let points = from_polyline::polyline_to_trace_points(encoded).map_err(JsValue::from)?;
    to_js(&points)
}

/// Convert a GeoJSON FeatureCollection string to a trace point list.
#[wasm_bindgen(js_name = geojsonToTracePoints)]
pub fn geojson_to_trace_points(json: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let points = from_geojson::geojson_to_trace_points(json).map_err(JsValue::from)?;
    to_js(&points)
}

/// Convert a place response to a GeoJSON FeatureCollection.
#[wasm_bindgen(js_name = placesToFeatureCollection)]
pub fn places_to_feature_collection(
    response: JsValue,
    flatten_properties: Option<bool>,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let response: Value = from_js(response)?;
    let fc = places::places_to_feature_collection(&response, flatten_properties.unwrap_or(true))
        .map_err(JsValue::from)?;
    to_js(&fc)
}

/// Convert a device position response to a GeoJSON FeatureCollection.
#[wasm_bindgen(js_name = devicePositionsToFeatureCollection)]
pub fn device_positions_to_feature_collection(
    response: JsValue,
    flatten_properties: Option<bool>,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let response: Value = from_js(response)?;
    let fc = devices::device_positions_to_feature_collection(
        &response,
        flatten_properties.unwrap_or(true),
    )
    .map_err(JsValue::from)?;
    to_js(&fc)
}

/// Convert a route calculation response to a GeoJSON FeatureCollection.
#[wasm_bindgen(js_name = routesToFeatureCollection)]
pub fn routes_to_feature_collection(response: JsValue, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let response: Value = from_js(response)?;
    let opts: RoutesOptions = parse_options(options)?;
    let fc = routes::routes_to_feature_collection(&response, &opts).map_err(JsValue::from)?;
    to_js(&fc)
}

/// Convert an isoline calculation response to a GeoJSON FeatureCollection.
#[wasm_bindgen(js_name = isolinesToFeatureCollection)]
pub fn isolines_to_feature_collection(
    response: JsValue,
    flatten_properties: Option<bool>,
    skip_errors: Option<bool>,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let response: Value = from_js(response)?;
    let on_error = if skip_errors.unwrap_or(false) {
        ErrorPolicy::Skip
    } else {
        ErrorPolicy::Strict
    };
    let fc = isolines::isolines_to_feature_collection(
        &response,
        flatten_properties.unwrap_or(true),
        on_error,
    )
    .map_err(JsValue::from)?;
    to_js(&fc)
}

/// Convert a snap-to-roads result to a GeoJSON FeatureCollection.
#[wasm_bindgen(js_name = snappedPointsToFeatureCollection)]
pub fn snapped_points_to_feature_collection(
    response: JsValue,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let response: Value = from_js(response)?;
    let opts: SnapOptions = parse_options(options)?;
    let fc = snap::snapped_points_to_feature_collection(&response, &opts)
        .map_err(JsValue::from)?;
    to_js(&fc)
}

/// Convert a geofence response to a GeoJSON FeatureCollection.
#[wasm_bindgen(js_name = geofencesToFeatureCollection)]
pub fn geofences_to_feature_collection(
    response: JsValue,
    flatten_properties: Option<bool>,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let response: Value = from_js(response)?;
    let fc = geofences::geofences_to_feature_collection(
        &response,
        flatten_properties.unwrap_or(true),
    )
    .map_err(JsValue::from)?;
    to_js(&fc)
}

/// Convert a GeoJSON FeatureCollection to batch-put geofence entries.
#[wasm_bindgen(js_name = featureCollectionToGeofenceEntries)]
pub fn feature_collection_to_geofence_entries(fc: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let fc: geojson::FeatureCollection = from_js(fc)?;
    to_js(&geofences::feature_collection_to_geofence_entries(&fc))
}

/// Flatten a nested property tree into a single-level dot-indexed map.
#[wasm_bindgen(js_name = flattenProperties)]
pub fn flatten_properties(value: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let value: Value = from_js(value)?;
    to_js(&flatten::flatten(&value, ""))
}

fn parse_options<T: Default + DeserializeOwned>(options: JsValue) -> Result<T, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(T::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}
