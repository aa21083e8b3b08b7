//! Track point extraction from GPX files.
//!
//! Only `trkpt` elements are read; everything else in the document
//! (waypoints, route points, extensions, elevation) is ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::domain::Coordinate;
use crate::fetcher::file_exists_with_size;

#[derive(Debug, thiserror::Error)]
pub enum GpxError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("Document ended with {open} unclosed element(s)")]
    Truncated { open: usize },
}

/// Read the track points of a GPX file on disk.
///
/// An absent or empty file gives an empty track. Parse failures are logged
/// and also give an empty track.
pub fn read_track_points(path: &Path) -> Vec<Coordinate> {
    if !file_exists_with_size(path, 1) {
        return Vec::new();
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::error!("Error opening GPX {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match parse_track_points(BufReader::new(file)) {
        Ok(points) => points,
        Err(e) => {
            tracing::error!("Error parsing GPX {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Stream `trkpt` coordinates out of a GPX document, in document order.
///
/// Points with a missing or non-numeric `lat`/`lon` are skipped. A document
/// that ends before all its elements are closed is an error.
pub fn parse_track_points<R: BufRead>(input: R) -> Result<Vec<Coordinate>, GpxError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut points = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => {
                depth += 1;
                if let Some(point) = track_point(&element)? {
                    points.push(point);
                }
            }
            Event::Empty(element) => {
                if let Some(point) = track_point(&element)? {
                    points.push(point);
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof if depth > 0 => return Err(GpxError::Truncated { open: depth }),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(points)
}

/// Coordinate of a `trkpt` element; `None` for other elements and bad points.
fn track_point(element: &BytesStart<'_>) -> Result<Option<Coordinate>, GpxError> {
    if element.local_name().as_ref() != b"trkpt" {
        return Ok(None);
    }

    let mut lat = None;
    let mut lon = None;

    for attr in element.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"lat" => lat = parse_degrees(&attr.value),
            b"lon" => lon = parse_degrees(&attr.value),
            _ => {}
        }
    }

    Ok(lat.zip(lon).map(|(lat, lon)| Coordinate::new(lat, lon)))
}

fn parse_degrees(raw: &[u8]) -> Option<f64> {
    std::str::from_utf8(raw)
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
