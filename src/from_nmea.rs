use chrono::{NaiveDate, NaiveTime};
use log::{debug, warn};

use crate::error::ConvertError;
use crate::types::TracePoint;

type Result<T> = std::result::Result<T, ConvertError>;

const KNOTS_TO_KMH: f64 = 1.852;

/// Two-digit years below this pivot land in the 2000s, the rest in the
/// 1900s.
const PIVOT_YEAR: u32 = 80;

/// Parse NMEA 0183 text into trace points.
///
/// `$GPGGA` sentences contribute position only; `$GPRMC` sentences add an
/// ISO 8601 timestamp (UTC date + time), speed (knots converted to km/h)
/// and heading. Other sentence types are skipped; malformed sentences are
/// skipped with a warning. Checksums are not validated.
pub fn nmea_to_trace_points(input: &str) -> Result<Vec<TracePoint>> {
    let mut points = Vec::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // Drop the checksum suffix before splitting fields.
        let body = line.split('*').next().unwrap_or(line);
        let fields: Vec<&str> = body.split(',').collect();

        match fields[0] {
            "$GPGGA" => match parse_gga(&fields) {
                Some(point) => points.push(point),
                None => warn!("skipping malformed GGA sentence: {line}"),
            },
            "$GPRMC" => match parse_rmc(&fields) {
                Some(point) => points.push(point),
                None => warn!("skipping malformed RMC sentence: {line}"),
            },
            other => debug!("skipping unsupported NMEA sentence {other}"),
        }
    }

    Ok(points)
}

/// `$GPGGA,hhmmss,llll.ll,a,yyyyy.yy,a,...` — position fix, no date.
fn parse_gga(fields: &[&str]) -> Option<TracePoint> {
    if fields.len() < 6 {
        return None;
    }
    let lat = parse_coordinate(fields[2], fields[3])?;
    let lon = parse_coordinate(fields[4], fields[5])?;
    Some(TracePoint::new(lon, lat))
}

/// `$GPRMC,hhmmss,A,llll.ll,a,yyyyy.yy,a,speed,course,ddmmyy,...`
fn parse_rmc(fields: &[&str]) -> Option<TracePoint> {
    if fields.len() < 10 {
        return None;
    }
    let lat = parse_coordinate(fields[3], fields[4])?;
    let lon = parse_coordinate(fields[5], fields[6])?;

    let mut point = TracePoint::new(lon, lat);
    if !fields[7].is_empty() {
        point.speed_kmh = fields[7].parse::<f64>().ok().map(|kn| kn * KNOTS_TO_KMH);
    }
    if !fields[8].is_empty() {
        point.heading_deg = fields[8].parse::<f64>().ok();
    }
    point.timestamp = parse_utc_timestamp(fields[9], fields[1]);
    Some(point)
}

/// Degrees + decimal minutes (`ddmm.mmmm` / `dddmm.mmmm`) with a
/// hemisphere letter, to signed decimal degrees.
fn parse_coordinate(value: &str, hemisphere: &str) -> Option<f64> {
    let raw = value.parse::<f64>().ok()?;
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;
    match hemisphere {
        "N" | "E" => Some(decimal),
        "S" | "W" => Some(-decimal),
        _ => None,
    }
}

/// `ddmmyy` + `hhmmss[.sss]` to an ISO 8601 UTC timestamp.
fn parse_utc_timestamp(date: &str, time: &str) -> Option<String> {
    // Length checks alone would let multibyte garbage panic the slices.
    if date.len() != 6 || time.len() < 6 || !date.is_ascii() || !time.is_ascii() {
        return None;
    }
    let day: u32 = date[0..2].parse().ok()?;
    let month: u32 = date[2..4].parse().ok()?;
    let two_digit_year: u32 = date[4..6].parse().ok()?;
    let year = if two_digit_year < PIVOT_YEAR {
        2000 + two_digit_year
    } else {
        1900 + two_digit_year
    };

    let hour: u32 = time[0..2].parse().ok()?;
    let minute: u32 = time[2..4].parse().ok()?;
    let second: f64 = time[4..].parse().ok()?;
    let millis = (second.fract() * 1000.0).round() as u32;

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;
    let time = NaiveTime::from_hms_milli_opt(hour, minute, second.trunc() as u32, millis)?;
    Some(format!("{}Z", date.and_time(time).format("%Y-%m-%dT%H:%M:%S")))
}
