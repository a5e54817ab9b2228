//! GPX track reader.
//!
//! Extracts track points, route points, and waypoints; everything else in
//! the file (metadata, extensions, elevation) is ignored. A `<time>` child,
//! when present and RFC 3339, is carried along as a unix timestamp.

use std::path::Path;

use super::ImportBatch;
use crate::error::IngestError;
use crate::geo::RawRecord;

/// Reads GPX from raw bytes.
pub fn from_slice(bytes: &[u8], path: &Path) -> Result<ImportBatch, IngestError> {
    let text = std::str::from_utf8(bytes).map_err(|e| IngestError::Malformed {
        format: "GPX",
        path: path.to_path_buf(),
        message: format!("not valid UTF-8: {e}"),
    })?;
    let document = roxmltree::Document::parse(text).map_err(|e| IngestError::Malformed {
        format: "GPX",
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut batch = ImportBatch::default();
    // Tag names are compared without their namespace; GPX 1.0 and 1.1 use
    // different namespace URIs for the same elements.
    let points = document
        .descendants()
        .filter(|node| matches!(node.tag_name().name(), "trkpt" | "rtept" | "wpt"));

    for node in points {
        let lat = node.attribute("lat").and_then(|v| v.trim().parse::<f64>().ok());
        let lon = node.attribute("lon").and_then(|v| v.trim().parse::<f64>().ok());
        let (Some(lat), Some(lng)) = (lat, lon) else {
            batch.skipped_rows += 1;
            continue;
        };

        let timestamp = node
            .children()
            .find(|child| child.tag_name().name() == "time")
            .and_then(|time| time.text())
            .and_then(parse_time);

        batch.records.push(RawRecord::Geographic {
            lat,
            lng,
            timestamp,
        });
    }

    Ok(batch)
}

fn parse_time(text: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|time| time.timestamp())
}
