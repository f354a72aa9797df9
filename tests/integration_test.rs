use geojson::feature::Id;
use geojson::{FeatureCollection, Value as GeoValue};
use serde_json::Value;

use geotrace_convert_wasm::devices::device_positions_to_feature_collection;
use geotrace_convert_wasm::from_csv::csv_to_trace_points;
use geotrace_convert_wasm::from_gpx::gpx_to_trace_points;
use geotrace_convert_wasm::from_kml::kml_to_trace_points;
use geotrace_convert_wasm::from_nmea::nmea_to_trace_points;
use geotrace_convert_wasm::from_polyline::polyline_to_trace_points;
use geotrace_convert_wasm::geofences::{
    feature_collection_to_geofence_entries, geofences_to_feature_collection,
};
use geotrace_convert_wasm::isolines::isolines_to_feature_collection;
use geotrace_convert_wasm::options::{CsvOptions, ErrorPolicy, RoutesOptions, SnapOptions};
use geotrace_convert_wasm::places::places_to_feature_collection;
use geotrace_convert_wasm::routes::routes_to_feature_collection;
use geotrace_convert_wasm::snap::snapped_points_to_feature_collection;

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

fn load_json(path: &str) -> Value {
    serde_json::from_str(&load_fixture(path)).unwrap()
}

fn feature_types(fc: &FeatureCollection) -> Vec<String> {
    fc.features
        .iter()
        .map(|f| {
            f.properties.as_ref().unwrap()["FeatureType"]
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect()
}

// ---- trace formats ----

#[test]
fn test_csv_trace() {
    let points = csv_to_trace_points(&load_fixture("trace.csv"), &CsvOptions::default()).unwrap();
    assert_eq!(points.len(), 3);

    let p = &points[0];
    assert!((p.position[0] - -1.4704939).abs() < 1e-9);
    assert!((p.position[1] - 53.3737131).abs() < 1e-9);
    assert!((p.speed_kmh.unwrap() - 12.499992).abs() < 1e-9); // 3.47222 m/s
    assert_eq!(p.timestamp.as_deref(), Some("2024-05-01T09:00:00Z"));
    assert_eq!(p.heading_deg, Some(12.0));

    // Third row leaves speed and heading blank.
    assert!(points[2].speed_kmh.is_none());
    assert!(points[2].heading_deg.is_none());
}

#[test]
fn test_gpx_trace() {
    let points = gpx_to_trace_points(&load_fixture("trace.gpx")).unwrap();
    assert_eq!(points.len(), 2);

    let p = &points[0];
    assert!((p.position[0] - -1.4704939).abs() < 1e-9);
    assert!((p.position[1] - 53.3737131).abs() < 1e-9);
    assert_eq!(p.timestamp.as_deref(), Some("2024-05-01T09:00:00Z"));
    // Extension speed is meters per second.
    assert!((p.speed_kmh.unwrap() - 12.499992).abs() < 1e-9);

    assert!(points[1].speed_kmh.is_none());
}

#[test]
fn test_kml_trace() {
    let points = kml_to_trace_points(&load_fixture("trace.kml")).unwrap();
    assert_eq!(points.len(), 3);

    // Point placemark with a TimeStamp; altitude dropped.
    assert_eq!(points[0].position, [-1.4704939, 53.3737131]);
    assert_eq!(points[0].timestamp.as_deref(), Some("2024-05-01T09:00:00Z"));

    // LineString placemark contributes one point per coordinate tuple.
    assert_eq!(points[1].position, [-1.470621, 53.373845]);
    assert_eq!(points[2].position, [-1.470741, 53.37399]);
}

#[test]
fn test_nmea_trace() {
    let points = nmea_to_trace_points(&load_fixture("trace.nmea")).unwrap();
    // GGA + RMC; the GSV sentence is skipped.
    assert_eq!(points.len(), 2);

    let gga = &points[0];
    assert!((gga.position[0] - -1.4704939).abs() < 1e-7);
    assert!((gga.position[1] - 53.3737131).abs() < 1e-7);
    assert!(gga.timestamp.is_none());

    let rmc = &points[1];
    assert!((rmc.position[0] - -1.470621).abs() < 1e-7);
    assert!((rmc.position[1] - 53.373845).abs() < 1e-7);
    assert!((rmc.speed_kmh.unwrap() - 12.5).abs() < 1e-6); // 6.74946 knots
    assert_eq!(rmc.heading_deg, Some(14.5));
    assert_eq!(rmc.timestamp.as_deref(), Some("2024-05-01T09:00:05Z"));
}

#[test]
fn test_flexible_polyline_trace() {
    let points = polyline_to_trace_points("BFoz5xJ67i1B1B7PzIhaxL7Y").unwrap();
    assert_eq!(points.len(), 4);
    assert_eq!(points[0].position, [8.69821, 50.10228]);
    assert_eq!(points[3].position, [8.68752, 50.09878]);
}

// ---- API responses ----

#[test]
fn test_route_default_options() {
    let response = load_json("route_response.json");
    let fc = routes_to_feature_collection(&response, &RoutesOptions::default()).unwrap();
    assert_eq!(fc.features.len(), 1);

    let route = &fc.features[0];
    match &route.geometry.as_ref().unwrap().value {
        // Two 3-point legs sharing one coordinate stitch to 5 points.
        GeoValue::LineString(line) => {
            assert_eq!(line.len(), 5);
            assert_eq!(line[0], vec![-1.4705, 53.3737]);
            assert_eq!(line[4], vec![-1.4711, 53.3743]);
        }
        _ => panic!("expected LineString"),
    }

    let props = route.properties.as_ref().unwrap();
    assert_eq!(props["FeatureType"], "Route");
    assert_eq!(props["Summary.Distance"], 1523);
    assert_eq!(props["MajorRoadLabels.0.RoadName.Value"], "A61");
    assert!(!props.contains_key("Legs"));
}

#[test]
fn test_route_all_feature_kinds() {
    let response = load_json("route_response.json");
    let opts = RoutesOptions {
        include_legs: true,
        include_travel_step_geometry: true,
        include_travel_step_start_positions: true,
        include_span_geometry: true,
        ..RoutesOptions::default()
    };
    let fc = routes_to_feature_collection(&response, &opts).unwrap();

    let types = feature_types(&fc);
    assert_eq!(types.iter().filter(|t| *t == "Route").count(), 1);
    assert_eq!(types.iter().filter(|t| *t == "Leg").count(), 2);
    // The Arrive step's slice is a single point, so only Depart gets a line.
    assert_eq!(types.iter().filter(|t| *t == "TravelStepGeometry").count(), 1);
    assert_eq!(
        types.iter().filter(|t| *t == "TravelStepStartPosition").count(),
        2
    );
    assert_eq!(types.iter().filter(|t| *t == "Span").count(), 1);

    let span = fc
        .features
        .iter()
        .find(|f| f.properties.as_ref().unwrap()["FeatureType"] == "Span")
        .unwrap();
    let props = span.properties.as_ref().unwrap();
    assert_eq!(props["SpeedLimit.Value"], 48);
    assert!(!props.contains_key("GeometryOffset"));
}

#[test]
fn test_places_results() {
    let response = load_json("places_results.json");
    let fc = places_to_feature_collection(&response, true).unwrap();
    // The position-less suggestion is dropped.
    assert_eq!(fc.features.len(), 1);

    let f = &fc.features[0];
    assert_eq!(f.id, Some(Id::String("plc-1".to_string())));
    match &f.geometry.as_ref().unwrap().value {
        GeoValue::Point(p) => assert_eq!(*p, vec![-1.462, 53.378]),
        _ => panic!("expected Point"),
    }
    let props = f.properties.as_ref().unwrap();
    assert_eq!(props["Title"], "Sheffield Station");
    assert_eq!(props["Address.Country.Code2"], "GB");
    assert!(!props.contains_key("Position"));
}

#[test]
fn test_device_position_history() {
    let response = load_json("device_positions.json");
    let fc = device_positions_to_feature_collection(&response, true).unwrap();
    assert_eq!(fc.features.len(), 2);

    let f = &fc.features[0];
    assert_eq!(f.id, Some(Id::String("veh-01".to_string())));
    let props = f.properties.as_ref().unwrap();
    assert_eq!(props["SampleTime"], "2024-05-01T09:00:00Z");
    assert_eq!(props["Accuracy.Horizontal"], 4.5);
}

#[test]
fn test_snapped_points() {
    let response = load_json("snapped_points.json");
    let fc = snapped_points_to_feature_collection(&response, &SnapOptions::default()).unwrap();

    let types = feature_types(&fc);
    assert_eq!(
        types,
        ["SnappedGeometry", "SnappedTracePoint", "SnappedTracePoint"]
    );

    let snapped = &fc.features[1];
    match &snapped.geometry.as_ref().unwrap().value {
        GeoValue::Point(p) => assert_eq!(*p, vec![-1.4705, 53.3737]),
        _ => panic!("expected Point"),
    }
    let props = snapped.properties.as_ref().unwrap();
    assert_eq!(props["Confidence"], 0.95);
    // The original position survives as an atomic property.
    assert_eq!(props["OriginalPosition"], serde_json::json!([-1.47052, 53.37374]));
    assert!(!props.contains_key("SnappedPosition"));
}

#[test]
fn test_snapped_points_with_originals() {
    let response = load_json("snapped_points.json");
    let opts = SnapOptions {
        include_original_positions: true,
        ..SnapOptions::default()
    };
    let fc = snapped_points_to_feature_collection(&response, &opts).unwrap();
    let types = feature_types(&fc);
    assert_eq!(types.iter().filter(|t| *t == "OriginalTracePoint").count(), 2);
}

#[test]
fn test_isolines() {
    let response = load_json("isolines.json");
    let fc = isolines_to_feature_collection(&response, true, ErrorPolicy::Strict).unwrap();
    assert_eq!(fc.features.len(), 2);

    for (feature, threshold) in fc.features.iter().zip([300, 600]) {
        match &feature.geometry.as_ref().unwrap().value {
            GeoValue::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].first(), rings[0].last());
            }
            _ => panic!("expected Polygon"),
        }
        let props = feature.properties.as_ref().unwrap();
        assert_eq!(props["TimeThreshold"], threshold);
    }
}

// ---- geofences, both directions ----

#[test]
fn test_geofences_to_features() {
    let response = load_json("geofences.json");
    let fc = geofences_to_feature_collection(&response, true).unwrap();
    assert_eq!(fc.features.len(), 2);

    let polygon = &fc.features[0];
    assert_eq!(polygon.id, Some(Id::String("warehouse-perimeter".to_string())));
    match &polygon.geometry.as_ref().unwrap().value {
        GeoValue::Polygon(rings) => assert_eq!(rings[0].len(), 5),
        _ => panic!("expected Polygon"),
    }

    let circle = &fc.features[1];
    match &circle.geometry.as_ref().unwrap().value {
        // 48 segments plus the closing point.
        GeoValue::Polygon(rings) => assert_eq!(rings[0].len(), 49),
        _ => panic!("expected Polygon"),
    }
    let props = circle.properties.as_ref().unwrap();
    assert_eq!(props["radius"], 250.0);
    assert_eq!(props["Status"], "ACTIVE");
}

#[test]
fn test_geofence_round_trip() {
    let response = load_json("geofences.json");
    let fc = geofences_to_feature_collection(&response, true).unwrap();
    let entries = feature_collection_to_geofence_entries(&fc);
    assert_eq!(entries.len(), 2);

    let polygon = &entries[0];
    assert_eq!(polygon.geofence_id, "warehouse-perimeter");
    let rings = polygon.geometry.polygon.as_ref().unwrap();
    assert_eq!(rings[0].len(), 5);
    assert_eq!(rings[0][0], [-1.471, 53.3735]);
    assert!(polygon.geometry.circle.is_none());

    // The circle reconstructs exactly from the center/radius properties
    // rather than from the approximated ring.
    let circle_entry = &entries[1];
    assert_eq!(circle_entry.geofence_id, "depot-circle");
    let circle = circle_entry.geometry.circle.as_ref().unwrap();
    assert_eq!(circle.center, [-1.4705, 53.3737]);
    assert_eq!(circle.radius, 250.0);
    assert!(circle_entry.geometry.polygon.is_none());
}
