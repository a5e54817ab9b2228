//! Survey-file ingestion.
//!
//! Four input formats are supported, selected by file extension: delimited
//! text (the wild west of survey exports), GPX, KML, and GeoJSON. Every
//! reader normalizes to [`RawRecord`]s; whether those are geographic or
//! projected is for CRS resolution to sort out.
//!
//! Readers are forgiving per row and strict per file: a row that yields no
//! coordinate pair is skipped and counted, but a file that yields nothing at
//! all is an error.

pub mod io_delimited;
pub mod io_geojson;
pub mod io_gpx;
pub mod io_kml;

use std::fmt;
use std::path::Path;

use log::warn;

use crate::error::IngestError;
use crate::geo::RawRecord;

/// Hard cap on records retained per import.
///
/// Bounds downstream cost (resolution runs every candidate over the full
/// set). Imports over the cap are truncated, not rejected; the cut is
/// surfaced via [`ImportBatch::truncated`].
pub const MAX_IMPORT_RECORDS: usize = 20_000;

/// Input formats, selected by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Delimited,
    Gpx,
    Kml,
    GeoJson,
}

impl Format {
    /// Picks the format for a path by its extension.
    pub fn from_path(path: &Path) -> Result<Format, IngestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Format::from_extension(&extension)
            .ok_or_else(|| IngestError::UnsupportedFormat(format!("'{}'", path.display())))
    }

    /// Maps a lowercase extension to a format.
    pub fn from_extension(extension: &str) -> Option<Format> {
        match extension {
            "csv" | "txt" => Some(Format::Delimited),
            "gpx" => Some(Format::Gpx),
            "kml" => Some(Format::Kml),
            "geojson" | "json" => Some(Format::GeoJson),
            _ => None,
        }
    }

    /// Short format name for messages and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Delimited => "delimited text",
            Format::Gpx => "GPX",
            Format::Kml => "KML",
            Format::GeoJson => "GeoJSON",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one import: surviving records plus what was lost on the way.
#[derive(Clone, Debug, Default)]
pub struct ImportBatch {
    pub records: Vec<RawRecord>,
    /// Rows/elements that yielded no coordinate pair and were skipped.
    pub skipped_rows: usize,
    /// True when the input held more than [`MAX_IMPORT_RECORDS`] records.
    pub truncated: bool,
}

/// Parses raw file bytes in the given format.
///
/// # Errors
/// [`IngestError`] if the file is structurally unreadable or no record
/// survives; individual bad rows only increment
/// [`ImportBatch::skipped_rows`].
pub fn parse(bytes: &[u8], format: Format) -> Result<ImportBatch, IngestError> {
    parse_with_path(bytes, format, Path::new("<bytes>"))
}

/// Reads and parses a file, picking the format from its extension.
pub fn parse_file(path: &Path) -> Result<ImportBatch, IngestError> {
    let format = Format::from_path(path)?;
    let bytes = std::fs::read(path)?;
    parse_with_path(&bytes, format, path)
}

/// [`parse`] with a path threaded through for error context.
pub fn parse_with_path(
    bytes: &[u8],
    format: Format,
    path: &Path,
) -> Result<ImportBatch, IngestError> {
    let mut batch = match format {
        Format::Delimited => io_delimited::from_slice(bytes, path)?,
        Format::Gpx => io_gpx::from_slice(bytes, path)?,
        Format::Kml => io_kml::from_slice(bytes, path)?,
        Format::GeoJson => io_geojson::from_slice(bytes, path)?,
    };

    if batch.records.is_empty() {
        return Err(IngestError::Empty {
            path: path.to_path_buf(),
        });
    }

    if batch.records.len() > MAX_IMPORT_RECORDS {
        warn!(
            "import of {} records from {} truncated to {MAX_IMPORT_RECORDS}",
            batch.records.len(),
            path.display()
        );
        batch.records.truncate(MAX_IMPORT_RECORDS);
        batch.truncated = true;
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    #[test]
    fn extension_dispatch() {
        assert_eq!(
            Format::from_path(Path::new("site/punkte.CSV")).unwrap(),
            Format::Delimited
        );
        assert_eq!(
            Format::from_path(Path::new("track.gpx")).unwrap(),
            Format::Gpx
        );
        assert_eq!(
            Format::from_path(Path::new("trasse.kml")).unwrap(),
            Format::Kml
        );
        assert_eq!(
            Format::from_path(Path::new("export.geojson")).unwrap(),
            Format::GeoJson
        );
        assert!(Format::from_path(Path::new("plan.dwg")).is_err());
        assert!(Format::from_path(Path::new("noextension")).is_err());
    }

    #[test]
    fn oversized_import_is_truncated_observably() {
        let mut csv = String::from("Rechtswert;Hochwert\n");
        for i in 0..25_000 {
            writeln!(csv, "{};{}", 691_000.0 + i as f64 * 0.01, 5_334_000.0).unwrap();
        }
        let batch = parse(csv.as_bytes(), Format::Delimited).unwrap();
        assert_eq!(batch.records.len(), MAX_IMPORT_RECORDS);
        assert!(batch.truncated);
    }

    #[test]
    fn under_cap_import_is_not_flagged() {
        let csv = "Rechtswert;Hochwert\n691608;5334760\n";
        let batch = parse(csv.as_bytes(), Format::Delimited).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert!(!batch.truncated);
    }

    #[test]
    fn empty_file_is_an_error() {
        let result = parse(b"just some prose, no numbers", Format::Delimited);
        assert!(matches!(result, Err(IngestError::Empty { .. })));
    }
}
