//! Renderer-agnostic report manifests.
//!
//! A [`ReportManifest`] is everything the external document generator needs
//! to print an assignment: metadata, the point table, the computed path
//! length. It carries no rendering instructions and is never persisted —
//! always regenerated from the saved [`Assignment`].

use serde::{Deserialize, Serialize};

use crate::geo::{path_length_m, GeoPoint};
use crate::store::Assignment;

/// Cap on the point table embedded in a document.
///
/// A 20,000-row table is useless on paper; [`ReportManifest::point_count`]
/// still reports the true total.
pub const MAX_MANIFEST_ROWS: usize = 5_000;

/// Project metadata as handed over by the surrounding suite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub title: String,
    pub code: String,
}

/// A bill-of-quantities position. The label is opaque to the engine and is
/// passed through verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LvPosition {
    pub id: String,
    pub label: String,
}

/// Structured, read-only description of one assignment for printing.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportManifest {
    pub project_title: String,
    pub project_code: String,
    pub lv_position_label: String,
    /// True number of points in the assignment, not capped by the table.
    pub point_count: usize,
    /// Path length in meters, computed fresh from the points.
    pub path_length_m: f64,
    /// Unix timestamp of the assignment's save.
    pub created_at: i64,
    /// Point table for the document, at most [`MAX_MANIFEST_ROWS`] rows.
    pub points: Vec<GeoPoint>,
    /// True when the table above was cut off at the row cap.
    pub table_truncated: bool,
}

/// Builds the manifest for one assignment.
///
/// Pure and deterministic. The path length is always recomputed from the
/// full point sequence — a stale cached value on the caller's side cannot
/// leak into a printed document.
pub fn build_manifest(
    assignment: &Assignment,
    project: &ProjectMeta,
    lv: &LvPosition,
) -> ReportManifest {
    let table: Vec<GeoPoint> = assignment
        .points
        .iter()
        .take(MAX_MANIFEST_ROWS)
        .copied()
        .collect();
    ReportManifest {
        project_title: project.title.clone(),
        project_code: project.code.clone(),
        lv_position_label: lv.label.clone(),
        point_count: assignment.points.len(),
        path_length_m: path_length_m(&assignment.points),
        created_at: assignment.created_at,
        table_truncated: table.len() < assignment.points.len(),
        points: table,
    }
}
