//! GeoJSON reader.
//!
//! Accepts a FeatureCollection, a single Feature, or a bare geometry, and
//! extracts `Point` and `LineString` coordinates. GeoJSON positions are
//! `[lng, lat]` (RFC 7946); this reader maps them to the engine's
//! `{lat, lng}` orientation — the axis-order swap is a contract point and
//! is pinned down by tests.

use std::path::Path;

use serde::Deserialize;

use super::ImportBatch;
use crate::error::IngestError;
use crate::geo::RawRecord;

// ============================================================================
// GeoJSON schema types (internal to this module)
// ============================================================================

/// A GeoJSON position: at least `[lng, lat]`, optionally with altitude.
type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    Collection(FeatureCollection),
    Single(Feature),
    Bare(Geometry),
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

/// Marker for the mandatory `"type": "Feature"` member. Without it a bare
/// geometry object would satisfy [`Feature`] too (its `geometry` member is
/// optional) and the untagged [`Document`] dispatch would misfire.
#[derive(Debug, Deserialize)]
enum FeatureKind {
    Feature,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(rename = "type")]
    _kind: FeatureKind,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    /// Any other geometry type; accepted and ignored.
    #[serde(untagged)]
    Unsupported(serde_json::Value),
}

// ============================================================================
// Public API
// ============================================================================

/// Reads GeoJSON from raw bytes.
pub fn from_slice(bytes: &[u8], path: &Path) -> Result<ImportBatch, IngestError> {
    let document: Document =
        serde_json::from_slice(bytes).map_err(|e| IngestError::Malformed {
            format: "GeoJSON",
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut batch = ImportBatch::default();
    match document {
        Document::Collection(collection) => {
            for feature in collection.features {
                collect_feature(feature, &mut batch);
            }
        }
        Document::Single(feature) => collect_feature(feature, &mut batch),
        Document::Bare(geometry) => collect_geometry(geometry, &mut batch),
    }

    Ok(batch)
}

fn collect_feature(feature: Feature, batch: &mut ImportBatch) {
    match feature.geometry {
        Some(geometry) => collect_geometry(geometry, batch),
        None => batch.skipped_rows += 1,
    }
}

fn collect_geometry(geometry: Geometry, batch: &mut ImportBatch) {
    match geometry {
        Geometry::Point { coordinates } => push_position(&coordinates, batch),
        Geometry::LineString { coordinates } => {
            for position in &coordinates {
                push_position(position, batch);
            }
        }
        Geometry::Unsupported(_) => batch.skipped_rows += 1,
    }
}

fn push_position(position: &Position, batch: &mut ImportBatch) {
    if position.len() < 2 || !position[0].is_finite() || !position[1].is_finite() {
        batch.skipped_rows += 1;
        return;
    }
    batch.records.push(RawRecord::Geographic {
        lat: position[1],
        lng: position[0],
        timestamp: None,
    });
}
