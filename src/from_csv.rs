use log::warn;

use crate::error::ConvertError;
use crate::options::CsvOptions;
use crate::types::TracePoint;

type Result<T> = std::result::Result<T, ConvertError>;

const MPS_TO_KMH: f64 = 3.6;
const MPH_TO_KMH: f64 = 1.60934;

/// Canonical trace columns. Speed may arrive in any one of three units;
/// when several are present km/h wins, then m/s, then mph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Latitude,
    Longitude,
    SpeedKmh,
    SpeedMps,
    SpeedMph,
    Timestamp,
    Heading,
}

impl Column {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "latitude" => Some(Self::Latitude),
            "longitude" => Some(Self::Longitude),
            "speed_kmh" => Some(Self::SpeedKmh),
            "speed_mps" => Some(Self::SpeedMps),
            "speed_mph" => Some(Self::SpeedMph),
            "timestamp" => Some(Self::Timestamp),
            "heading" => Some(Self::Heading),
            _ => None,
        }
    }
}

/// Convert CSV trace data to a trace point list.
///
/// The header row (or `opts.columns` for headerless input) names the
/// columns; `opts.column_mapping` aliases caller names onto the canonical
/// ones first. Rows with a non-numeric latitude or longitude are skipped
/// with a warning; a missing latitude/longitude column fails the call.
pub fn csv_to_trace_points(input: &str, opts: &CsvOptions) -> Result<Vec<TracePoint>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(opts.columns.is_none())
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input.as_bytes());

    let names: Vec<String> = match &opts.columns {
        Some(columns) => columns.clone(),
        None => reader.headers()?.iter().map(str::to_string).collect(),
    };
    let columns: Vec<Option<Column>> = names
        .iter()
        .map(|raw| {
            let name = opts.column_mapping.get(raw).map(String::as_str).unwrap_or(raw);
            Column::from_name(name)
        })
        .collect();

    let has = |c: Column| columns.contains(&Some(c));
    if !has(Column::Latitude) || !has(Column::Longitude) {
        return Err(ConvertError::MalformedInput {
            context: "CSV has no latitude/longitude columns".to_string(),
        });
    }

    let mut points = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping CSV row {row}: {e}");
                continue;
            }
        };
        match parse_row(&record, &columns) {
            Some(point) => points.push(point),
            None => warn!("skipping CSV row {row}: missing or non-numeric coordinates"),
        }
    }
    Ok(points)
}

fn parse_row(record: &csv::StringRecord, columns: &[Option<Column>]) -> Option<TracePoint> {
    let mut lat = None;
    let mut lon = None;
    let mut speed_kmh = None;
    let mut speed_mps = None;
    let mut speed_mph = None;
    let mut timestamp = None;
    let mut heading = None;

    for (i, column) in columns.iter().enumerate() {
        let Some(column) = column else { continue };
        let Some(field) = record.get(i) else { continue };
        if field.is_empty() {
            continue;
        }
        match column {
            Column::Latitude => lat = field.parse::<f64>().ok(),
            Column::Longitude => lon = field.parse::<f64>().ok(),
            Column::SpeedKmh => speed_kmh = field.parse::<f64>().ok(),
            Column::SpeedMps => speed_mps = field.parse::<f64>().ok(),
            Column::SpeedMph => speed_mph = field.parse::<f64>().ok(),
            Column::Timestamp => timestamp = Some(field.to_string()),
            Column::Heading => heading = field.parse::<f64>().ok(),
        }
    }

    let mut point = TracePoint::new(lon?, lat?);
    point.speed_kmh = speed_kmh
        .or(speed_mps.map(|v| v * MPS_TO_KMH))
        .or(speed_mph.map(|v| v * MPH_TO_KMH));
    point.timestamp = timestamp;
    point.heading_deg = heading;
    Some(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_lat_lon_columns_emit_lon_lat_position() {
        let csv = "latitude,longitude\n53.3737131,-1.4704939\n";
        let points = csv_to_trace_points(csv, &CsvOptions::default()).unwrap();
        assert_eq!(points.len(), 1);
        approx(points[0].position[0], -1.4704939);
        approx(points[0].position[1], 53.3737131);
    }

    #[test]
    fn test_speed_mps_converted() {
        let csv = "latitude,longitude,speed_mps\n1.0,2.0,3.47222\n";
        let points = csv_to_trace_points(csv, &CsvOptions::default()).unwrap();
        approx(points[0].speed_kmh.unwrap(), 12.499992);
    }

    #[test]
    fn test_speed_mph_converted() {
        let csv = "latitude,longitude,speed_mph\n1.0,2.0,7.76713\n";
        let points = csv_to_trace_points(csv, &CsvOptions::default()).unwrap();
        approx(points[0].speed_kmh.unwrap(), 12.4999529942);
    }

    #[test]
    fn test_speed_kmh_takes_precedence() {
        let csv = "latitude,longitude,speed_mps,speed_kmh\n1.0,2.0,99.0,12.5\n";
        let points = csv_to_trace_points(csv, &CsvOptions::default()).unwrap();
        approx(points[0].speed_kmh.unwrap(), 12.5);
    }

    #[test]
    fn test_column_alias_mapping() {
        let csv = "lat,lng,ts\n1.5,2.5,2024-01-01T00:00:00Z\n";
        let opts = CsvOptions {
            column_mapping: HashMap::from([
                ("lat".to_string(), "latitude".to_string()),
                ("lng".to_string(), "longitude".to_string()),
                ("ts".to_string(), "timestamp".to_string()),
            ]),
            columns: None,
        };
        let points = csv_to_trace_points(csv, &opts).unwrap();
        approx(points[0].position[0], 2.5);
        assert_eq!(points[0].timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_headerless_with_supplied_columns() {
        let csv = "1.0,2.0,45.0\n3.0,4.0,90.0\n";
        let opts = CsvOptions {
            column_mapping: HashMap::new(),
            columns: Some(vec![
                "latitude".to_string(),
                "longitude".to_string(),
                "heading".to_string(),
            ]),
        };
        let points = csv_to_trace_points(csv, &opts).unwrap();
        assert_eq!(points.len(), 2);
        approx(points[1].heading_deg.unwrap(), 90.0);
    }

    #[test]
    fn test_bad_row_skipped() {
        let csv = "latitude,longitude\n1.0,2.0\nnot-a-number,2.0\n3.0,4.0\n";
        let points = csv_to_trace_points(csv, &CsvOptions::default()).unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_missing_coordinate_columns_fail() {
        let csv = "speed_kmh,timestamp\n12.5,t\n";
        assert!(matches!(
            csv_to_trace_points(csv, &CsvOptions::default()),
            Err(ConvertError::MalformedInput { .. })
        ));
    }
}
