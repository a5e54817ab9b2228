//! KML reader.
//!
//! Extracts `Point` and `LineString` geometries; polygons, ground overlays,
//! styling and the rest of the KML zoo are ignored. Coordinate tuples are
//! `lon,lat[,alt]`, whitespace-separated.

use std::path::Path;

use super::ImportBatch;
use crate::error::IngestError;
use crate::geo::RawRecord;

/// Reads KML from raw bytes.
pub fn from_slice(bytes: &[u8], path: &Path) -> Result<ImportBatch, IngestError> {
    let text = std::str::from_utf8(bytes).map_err(|e| IngestError::Malformed {
        format: "KML",
        path: path.to_path_buf(),
        message: format!("not valid UTF-8: {e}"),
    })?;
    let document = roxmltree::Document::parse(text).map_err(|e| IngestError::Malformed {
        format: "KML",
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut batch = ImportBatch::default();
    let geometries = document
        .descendants()
        .filter(|node| matches!(node.tag_name().name(), "Point" | "LineString"));

    for geometry in geometries {
        let coordinates = geometry
            .children()
            .find(|child| child.tag_name().name() == "coordinates")
            .and_then(|node| node.text());
        let Some(coordinates) = coordinates else {
            batch.skipped_rows += 1;
            continue;
        };

        for tuple in coordinates.split_whitespace() {
            match parse_tuple(tuple) {
                Some((lng, lat)) => batch.records.push(RawRecord::Geographic {
                    lat,
                    lng,
                    timestamp: None,
                }),
                None => batch.skipped_rows += 1,
            }
        }
    }

    Ok(batch)
}

/// Parses one `lon,lat[,alt]` tuple.
fn parse_tuple(tuple: &str) -> Option<(f64, f64)> {
    let mut parts = tuple.split(',');
    let lng = parts.next()?.trim().parse::<f64>().ok()?;
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    Some((lng, lat))
}
