//! Delimited survey text reader.
//!
//! Survey exports have no fixed schema. Column headers, when present at
//! all, come in arbitrary order and language ("Breite", "Rechtswert",
//! "Y_WGS", ...); the delimiter is a semicolon or a comma; decimal commas
//! show up in German exports. This reader sniffs all of that:
//!
//! - A first row containing a non-numeric token is treated as a header and
//!   matched against the alias tables below.
//! - Without a usable header, rows fall back to positional interpretation:
//!   at least three numeric tokens are `[id, easting, northing, ...]`,
//!   exactly two are `[easting, northing]`.
//! - Rows that yield no coordinate pair are skipped and counted, not fatal.

use std::path::Path;

use super::ImportBatch;
use crate::error::IngestError;
use crate::geo::RawRecord;

const LATITUDE_ALIASES: &[&str] = &["lat", "latitude", "breite", "y", "y_wgs", "y_wgs84"];
const LONGITUDE_ALIASES: &[&str] = &[
    "lon", "lng", "longitude", "laenge", "länge", "x", "x_wgs", "x_wgs84",
];
const EASTING_ALIASES: &[&str] = &["easting", "rechtswert", "rw", "east", "e"];
const NORTHING_ALIASES: &[&str] = &["northing", "hochwert", "hw", "north", "n"];

/// Column indices discovered from a header row.
#[derive(Clone, Copy, Debug, Default)]
struct HeaderMap {
    lat: Option<usize>,
    lng: Option<usize>,
    easting: Option<usize>,
    northing: Option<usize>,
}

impl HeaderMap {
    fn from_row(fields: &csv::StringRecord) -> Self {
        let mut map = HeaderMap::default();
        for (idx, field) in fields.iter().enumerate() {
            let name = field.trim().to_lowercase();
            let slot = if LATITUDE_ALIASES.contains(&name.as_str()) {
                &mut map.lat
            } else if LONGITUDE_ALIASES.contains(&name.as_str()) {
                &mut map.lng
            } else if EASTING_ALIASES.contains(&name.as_str()) {
                &mut map.easting
            } else if NORTHING_ALIASES.contains(&name.as_str()) {
                &mut map.northing
            } else {
                continue;
            };
            // First matching column wins.
            slot.get_or_insert(idx);
        }
        map
    }

    /// A header is only usable if it names a complete coordinate pair.
    fn is_usable(&self) -> bool {
        (self.lat.is_some() && self.lng.is_some())
            || (self.easting.is_some() && self.northing.is_some())
    }

    fn record_from(&self, fields: &csv::StringRecord) -> Option<RawRecord> {
        let number_at = |idx: Option<usize>| idx.and_then(|i| parse_number(fields.get(i)?));
        if let (Some(lat), Some(lng)) = (number_at(self.lat), number_at(self.lng)) {
            return Some(RawRecord::Geographic {
                lat,
                lng,
                timestamp: None,
            });
        }
        if let (Some(easting), Some(northing)) =
            (number_at(self.easting), number_at(self.northing))
        {
            return Some(RawRecord::Projected { easting, northing });
        }
        None
    }
}

/// Reads delimited survey text from raw bytes.
pub fn from_slice(bytes: &[u8], path: &Path) -> Result<ImportBatch, IngestError> {
    let text = std::str::from_utf8(bytes).map_err(|e| IngestError::Malformed {
        format: "delimited text",
        path: path.to_path_buf(),
        message: format!("not valid UTF-8: {e}"),
    })?;

    let delimiter = sniff_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut batch = ImportBatch::default();
    let mut header: Option<HeaderMap> = None;
    let mut first_row = true;

    for row in reader.records() {
        let row = row.map_err(|e| IngestError::Malformed {
            format: "delimited text",
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if row.iter().all(|field| field.is_empty()) {
            continue;
        }

        if first_row {
            first_row = false;
            // Any non-numeric token marks a header row.
            if row.iter().any(|f| !f.is_empty() && parse_number(f).is_none()) {
                let map = HeaderMap::from_row(&row);
                if map.is_usable() {
                    header = Some(map);
                } else {
                    batch.skipped_rows += 1;
                }
                continue;
            }
        }

        let record = match header {
            Some(map) => map.record_from(&row),
            None => positional_record(&row),
        };
        match record {
            Some(record) => batch.records.push(record),
            None => batch.skipped_rows += 1,
        }
    }

    Ok(batch)
}

/// Positional fallback for headerless rows.
fn positional_record(fields: &csv::StringRecord) -> Option<RawRecord> {
    let numbers: Vec<f64> = fields.iter().filter_map(parse_number).collect();
    match numbers.len() {
        0 | 1 => None,
        2 => Some(RawRecord::Projected {
            easting: numbers[0],
            northing: numbers[1],
        }),
        // Point id first, as in "17;691608.2;5334760.9;comment".
        _ => Some(RawRecord::Projected {
            easting: numbers[1],
            northing: numbers[2],
        }),
    }
}

/// Accepts both decimal points and German decimal commas.
fn parse_number(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    field
        .parse::<f64>()
        .or_else(|_| field.replace(',', ".").parse::<f64>())
        .ok()
}

/// Picks the delimiter from the first non-empty line.
fn sniff_delimiter(text: &str) -> u8 {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if line.contains(';') {
        b';'
    } else if line.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ImportBatch {
        from_slice(text.as_bytes(), Path::new("<test>")).unwrap()
    }

    #[test]
    fn header_aliases_yield_identical_records() {
        let english = "Latitude,Longitude\n48.14,11.58\n";
        let german = "Breite;Länge\n48.14;11.58\n";
        let terse = "Y_WGS,X_WGS\n48.14,11.58\n";
        let a = parse(english).records;
        let b = parse(german).records;
        let c = parse(terse).records;
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(
            a,
            vec![RawRecord::Geographic {
                lat: 48.14,
                lng: 11.58,
                timestamp: None
            }]
        );
    }

    #[test]
    fn header_columns_in_arbitrary_order() {
        let batch = parse("Bezeichnung;Hochwert;Rechtswert\nP1;5334760.9;691608.2\n");
        assert_eq!(
            batch.records,
            vec![RawRecord::Projected {
                easting: 691608.2,
                northing: 5334760.9
            }]
        );
    }

    #[test]
    fn headerless_two_token_rows() {
        let batch = parse("691608.2;5334760.9\n691610.0;5334762.0\n");
        assert_eq!(batch.records.len(), 2);
        assert_eq!(
            batch.records[0],
            RawRecord::Projected {
                easting: 691608.2,
                northing: 5334760.9
            }
        );
    }

    #[test]
    fn headerless_rows_with_leading_point_id() {
        let batch = parse("1;691608.2;5334760.9;Schacht\n2;691610.0;5334762.0;Bord\n");
        assert_eq!(batch.records.len(), 2);
        assert_eq!(
            batch.records[1],
            RawRecord::Projected {
                easting: 691610.0,
                northing: 5334762.0
            }
        );
    }

    #[test]
    fn german_decimal_commas_parse() {
        let batch = parse("Rechtswert;Hochwert\n691608,2;5334760,9\n");
        assert_eq!(
            batch.records,
            vec![RawRecord::Projected {
                easting: 691608.2,
                northing: 5334760.9
            }]
        );
    }

    #[test]
    fn useless_rows_are_skipped_not_fatal() {
        let batch = parse("691608.2;5334760.9\nkein punkt\n;;\n691610.0;5334762.0\n");
        assert_eq!(batch.records.len(), 2);
        // The prose row counts; the all-empty row does not.
        assert_eq!(batch.skipped_rows, 1);
    }

    #[test]
    fn unusable_header_falls_back_to_positional_rows() {
        let batch = parse("Punktnummer;Bemerkung\n1;691608.2;5334760.9\n");
        assert_eq!(batch.skipped_rows, 1);
        assert_eq!(
            batch.records,
            vec![RawRecord::Projected {
                easting: 691608.2,
                northing: 5334760.9
            }]
        );
    }

    #[test]
    fn rejects_non_utf8_input() {
        let result = from_slice(&[0xff, 0xfe, 0x00], Path::new("<test>"));
        assert!(matches!(result, Err(IngestError::Malformed { .. })));
    }
}
