use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ConvertError;
use crate::types::TracePoint;

type Result<T> = std::result::Result<T, ConvertError>;

const MPS_TO_KMH: f64 = 3.6;

/// Parse a GPX document into trace points.
///
/// Track points (`<trkpt>` under `<trk><trkseg>`) carry the position; an
/// optional `<time>` child passes through verbatim and an optional
/// `<extensions>` speed (meters per second, any nesting depth) converts to
/// km/h. Points with missing or unparseable lat/lon are skipped.
pub fn gpx_to_trace_points(xml: &str) -> Result<Vec<TracePoint>> {
    let mut reader = Reader::from_str(xml);
    let mut points = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"trkseg" => {
                parse_segment(&mut reader, &mut points)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ConvertError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(points)
}

fn parse_segment(reader: &mut Reader<&[u8]>, points: &mut Vec<TracePoint>) -> Result<()> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    if let Some(pt) = parse_trkpt(&e, reader)? {
                        points.push(pt);
                    }
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    match parse_lat_lon(&e) {
                        Some((lat, lon)) => points.push(TracePoint::new(lon, lat)),
                        None => warn!("skipping trkpt with missing or invalid lat/lon"),
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ConvertError::XmlParse(e)),
            _ => {}
        }
    }
    Ok(())
}

/// Parse a `<trkpt>` and its children. Called after its `Event::Start`.
fn parse_trkpt(start: &BytesStart<'_>, reader: &mut Reader<&[u8]>) -> Result<Option<TracePoint>> {
    let Some((lat, lon)) = parse_lat_lon(start) else {
        warn!("skipping trkpt with missing or invalid lat/lon");
        reader.read_to_end(start.name())?;
        return Ok(None);
    };

    let mut point = TracePoint::new(lon, lat);
    let end_name = start.name().0.to_vec();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"time" => {
                    point.timestamp = Some(read_text_owned(reader, &e)?);
                }
                b"extensions" => {
                    if let Some(mps) = parse_extensions_speed(reader)? {
                        point.speed_kmh = Some(mps * MPS_TO_KMH);
                    }
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ConvertError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(Some(point))
}

/// Scan an `<extensions>` subtree for a `<speed>` element at any depth.
fn parse_extensions_speed(reader: &mut Reader<&[u8]>) -> Result<Option<f64>> {
    let mut speed = None;
    let mut depth = 1usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"speed" {
                    let text = read_text_owned(reader, &e)?;
                    speed = speed.or_else(|| text.trim().parse::<f64>().ok());
                } else {
                    depth += 1;
                }
            }
            Ok(Event::End(e)) => {
                depth -= 1;
                if depth == 0 || e.local_name().as_ref() == b"extensions" {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ConvertError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(speed)
}

/// Parse lat/lon attributes from a point element's start tag.
fn parse_lat_lon(e: &BytesStart<'_>) -> Option<(f64, f64)> {
    let mut lat = None;
    let mut lon = None;

    for attr in e.attributes().flatten() {
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lat" => lat = val.parse::<f64>().ok(),
            b"lon" => lon = val.parse::<f64>().ok(),
            _ => {}
        }
    }

    Some((lat?, lon?))
}

/// Read text content of an element as an owned String, handling CDATA and
/// entity references.
pub(crate) fn read_text_owned(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    match std::str::from_utf8(e.as_ref()).unwrap_or_default() {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ConvertError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_points_with_time() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <trkseg>
      <trkpt lat="53.3737131" lon="-1.4704939"><time>2024-05-01T09:00:00Z</time></trkpt>
      <trkpt lat="53.3738000" lon="-1.4705500"><time>2024-05-01T09:00:05Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;
        let points = gpx_to_trace_points(xml).unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[0].position[0] - (-1.4704939)).abs() < 1e-10);
        assert!((points[0].position[1] - 53.3737131).abs() < 1e-10);
        assert_eq!(points[0].timestamp.as_deref(), Some("2024-05-01T09:00:00Z"));
    }

    #[test]
    fn test_extension_speed_converted_to_kmh() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk><trkseg>
    <trkpt lat="1.0" lon="2.0">
      <extensions>
        <gpxtpx:TrackPointExtension xmlns:gpxtpx="http://www.garmin.com/xmlschemas/TrackPointExtension/v1">
          <gpxtpx:speed>3.47222</gpxtpx:speed>
        </gpxtpx:TrackPointExtension>
      </extensions>
    </trkpt>
  </trkseg></trk>
</gpx>"#;
        let points = gpx_to_trace_points(xml).unwrap();
        assert!((points[0].speed_kmh.unwrap() - 12.499992).abs() < 1e-9);
    }

    #[test]
    fn test_waypoints_and_routes_ignored() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <wpt lat="9.0" lon="9.0"/>
  <rte><rtept lat="8.0" lon="8.0"/></rte>
  <trk><trkseg><trkpt lat="1.0" lon="2.0"/></trkseg></trk>
</gpx>"#;
        let points = gpx_to_trace_points(xml).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].position, [2.0, 1.0]);
    }

    #[test]
    fn test_bad_trkpt_skipped() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk><trkseg>
    <trkpt lat="1.0" lon="2.0"/>
    <trkpt lat="oops" lon="2.0"><time>t</time></trkpt>
    <trkpt lat="3.0" lon="4.0"/>
  </trkseg></trk>
</gpx>"#;
        let points = gpx_to_trace_points(xml).unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_invalid_xml_fails() {
        assert!(gpx_to_trace_points("<gpx><trk><trkseg></trk>").is_err());
    }

    #[test]
    fn test_multiple_segments_concatenated() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <trkseg><trkpt lat="1.0" lon="1.0"/></trkseg>
    <trkseg><trkpt lat="2.0" lon="2.0"/></trkseg>
  </trk>
</gpx>"#;
        let points = gpx_to_trace_points(xml).unwrap();
        assert_eq!(points.len(), 2);
    }
}
