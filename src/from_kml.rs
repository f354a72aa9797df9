use log::warn;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ConvertError;
use crate::from_gpx::read_text_owned;
use crate::types::TracePoint;

type Result<T> = std::result::Result<T, ConvertError>;

/// Parse a KML document into trace points.
///
/// Every `<Placemark>` contributes its `<Point>` or `<LineString>`
/// coordinates (comma-separated `lon,lat[,alt]` groups, altitude ignored);
/// an optional `<TimeStamp><when>` applies to all points of the placemark.
/// Placemarks with other geometry kinds are skipped.
pub fn kml_to_trace_points(xml: &str) -> Result<Vec<TracePoint>> {
    let mut reader = Reader::from_str(xml);
    let mut points = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"Placemark" => {
                parse_placemark(&mut reader, &mut points)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ConvertError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(points)
}

fn parse_placemark(reader: &mut Reader<&[u8]>, points: &mut Vec<TracePoint>) -> Result<()> {
    let mut coordinates: Option<String> = None;
    let mut when: Option<String> = None;
    let mut has_geometry = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"Point" | b"LineString" => {
                    has_geometry = true;
                    coordinates = parse_geometry_coordinates(reader, e.local_name().as_ref())?;
                }
                b"TimeStamp" => {
                    when = parse_timestamp_when(reader)?;
                }
                b"name" | b"description" | b"ExtendedData" | b"Style" | b"styleUrl" => {
                    reader.read_to_end(e.name())?;
                }
                other => {
                    // Polygon, MultiGeometry and friends are not trace data.
                    warn!(
                        "skipping unsupported Placemark child <{}>",
                        String::from_utf8_lossy(other)
                    );
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"Placemark" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ConvertError::XmlParse(e)),
            _ => {}
        }
    }

    if !has_geometry {
        return Ok(());
    }
    let Some(coordinates) = coordinates else {
        warn!("skipping Placemark geometry without <coordinates>");
        return Ok(());
    };

    for tuple in coordinates.split_whitespace() {
        match parse_coordinate_tuple(tuple) {
            Some((lon, lat)) => {
                let mut point = TracePoint::new(lon, lat);
                point.timestamp = when.clone();
                points.push(point);
            }
            None => warn!("skipping malformed KML coordinate tuple '{tuple}'"),
        }
    }
    Ok(())
}

/// Read the `<coordinates>` text inside a `<Point>` or `<LineString>`.
fn parse_geometry_coordinates(
    reader: &mut Reader<&[u8]>,
    end_local: &[u8],
) -> Result<Option<String>> {
    let mut coordinates = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"coordinates" {
                    coordinates = Some(read_text_owned(reader, &e)?);
                } else {
                    reader.read_to_end(e.name())?;
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == end_local => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ConvertError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(coordinates)
}

fn parse_timestamp_when(reader: &mut Reader<&[u8]>) -> Result<Option<String>> {
    let mut when = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"when" {
                    when = Some(read_text_owned(reader, &e)?.trim().to_string());
                } else {
                    reader.read_to_end(e.name())?;
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"TimeStamp" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(ConvertError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(when)
}

/// `lon,lat[,alt]` with the altitude ignored.
fn parse_coordinate_tuple(tuple: &str) -> Option<(f64, f64)> {
    let mut parts = tuple.split(',');
    let lon = parts.next()?.trim().parse::<f64>().ok()?;
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    Some((lon, lat))
}
