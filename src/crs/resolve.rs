//! CRS detection over raw survey records.
//!
//! Detection is a heuristic: take a small sample, score every candidate by
//! how many sample records it places inside the plausible window, then walk
//! the candidates in score order over the full set and accept the first one
//! that explains enough of it. Noisy field data never agrees 100%, so
//! "enough" is [`ACCEPT_RATIO`] rather than all-or-nothing, and a best
//! partial match beats rejecting an entire import.

use std::cmp::Reverse;

use log::{debug, warn};
use serde::Serialize;

use super::{CrsId, Projector};
use crate::error::CrsResolutionError;
use crate::geo::{GeoPoint, RawRecord};

/// Number of leading records sampled for candidate scoring.
pub const SCORE_SAMPLE_LEN: usize = 10;

/// Share of the full record set a candidate must place inside the plausible
/// window to be accepted. Tunable; 0.6 tolerates noisy survey data without
/// accepting garbage.
pub const ACCEPT_RATIO: f64 = 0.6;

/// How trustworthy a resolution is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// The accepted candidate explained at least [`ACCEPT_RATIO`] of the set.
    Full,
    /// Best partial match only; some records did not fit any candidate.
    Partial,
}

/// Outcome of a successful detection run.
#[derive(Clone, Debug)]
pub struct CrsResolution {
    /// The system the records are taken to be in.
    pub crs: CrsId,
    /// Records reprojected to geographic coordinates, implausible ones dropped.
    pub points: Vec<GeoPoint>,
    pub confidence: Confidence,
    /// Accepted count per candidate tried on the full set.
    pub diagnostics: Vec<(CrsId, usize)>,
}

/// Determines which candidate system plausibly produced `records` and
/// reprojects them to geographic coordinates.
///
/// `preferred` is the caller's expectation (typically remembered per
/// project); it breaks ties between candidates that score equally and is
/// always tried even if the sample scores it at zero.
///
/// # Errors
/// [`CrsResolutionError`] when no candidate places a single record inside
/// the plausible window; the error carries the per-candidate counts.
pub fn resolve(
    records: &[RawRecord],
    preferred: CrsId,
) -> Result<CrsResolution, CrsResolutionError> {
    if records.is_empty() {
        return Err(CrsResolutionError {
            diagnostics: Vec::new(),
        });
    }

    // Records with known orientation never need scoring.
    if records.iter().all(RawRecord::is_geographic) {
        return resolve_geographic(records);
    }

    let threshold = accept_threshold(records.len());
    let mut diagnostics = Vec::new();
    let mut best: Option<(CrsId, Vec<GeoPoint>)> = None;

    for crs in detection_order(records, preferred) {
        let accepted = apply(crs, records);
        debug!(
            "candidate {crs}: {} of {} records plausible",
            accepted.len(),
            records.len()
        );
        diagnostics.push((crs, accepted.len()));

        if accepted.len() >= threshold {
            if accepted.len() < records.len() {
                warn!(
                    "{crs} accepted with {} of {} records; rest dropped as implausible",
                    accepted.len(),
                    records.len()
                );
            }
            return Ok(CrsResolution {
                crs,
                points: accepted,
                confidence: Confidence::Full,
                diagnostics,
            });
        }

        let beats_best = best
            .as_ref()
            .map_or(accepted.len() > 0, |(_, b)| accepted.len() > b.len());
        if beats_best {
            best = Some((crs, accepted));
        }
    }

    // No candidate reached the threshold: losing some off-window points is
    // preferred to rejecting the whole import.
    if let Some((crs, points)) = best {
        warn!(
            "no candidate reached {} of {} records; falling back to {crs} with {}",
            threshold,
            records.len(),
            points.len()
        );
        return Ok(CrsResolution {
            crs,
            points,
            confidence: Confidence::Partial,
            diagnostics,
        });
    }

    Err(CrsResolutionError { diagnostics })
}

/// Pass-through for batches that are entirely geographic already.
fn resolve_geographic(records: &[RawRecord]) -> Result<CrsResolution, CrsResolutionError> {
    let accepted = apply(CrsId::Wgs84, records);
    let diagnostics = vec![(CrsId::Wgs84, accepted.len())];
    if accepted.is_empty() {
        return Err(CrsResolutionError { diagnostics });
    }

    let confidence = if accepted.len() >= accept_threshold(records.len()) {
        Confidence::Full
    } else {
        warn!(
            "geographic input only {} of {} records inside the plausible window",
            accepted.len(),
            records.len()
        );
        Confidence::Partial
    };
    Ok(CrsResolution {
        crs: CrsId::Wgs84,
        points: accepted,
        confidence,
        diagnostics,
    })
}

/// Minimum accepted count for a candidate to win outright.
fn accept_threshold(total: usize) -> usize {
    (ACCEPT_RATIO * total as f64).ceil() as usize
}

/// Candidate order for the full-set pass: sample scores descending (the
/// preferred system wins ties), then the preferred system, then the whole
/// table as a final fallback, deduplicated.
fn detection_order(records: &[RawRecord], preferred: CrsId) -> Vec<CrsId> {
    let sample = &records[..records.len().min(SCORE_SAMPLE_LEN)];
    let mut scored: Vec<(CrsId, usize)> = CrsId::ALL
        .iter()
        .map(|&crs| (crs, apply(crs, sample).len()))
        .collect();
    scored.sort_by_key(|&(crs, score)| (Reverse(score), crs != preferred));
    debug!("sample scores: {scored:?}");

    let mut order: Vec<CrsId> = scored
        .iter()
        .filter(|&&(_, score)| score > 0)
        .map(|&(crs, _)| crs)
        .collect();
    order.push(preferred);
    order.extend(CrsId::ALL);

    let mut seen: Vec<CrsId> = Vec::with_capacity(CrsId::ALL.len());
    order.retain(|&crs| {
        if seen.contains(&crs) {
            false
        } else {
            seen.push(crs);
            true
        }
    });
    order
}

/// Interprets every record under `crs` and keeps the plausible results.
///
/// Geographic records pass through unchanged; projected records must lie in
/// the candidate's value domain and reproject to a finite, in-window point.
/// A record failing any of that is dropped for this candidate only.
fn apply(crs: CrsId, records: &[RawRecord]) -> Vec<GeoPoint> {
    let Ok(projector) = Projector::new(crs) else {
        return Vec::new();
    };
    let candidate = crs.candidate();

    records
        .iter()
        .filter_map(|record| {
            let point = match *record {
                RawRecord::Geographic {
                    lat,
                    lng,
                    timestamp,
                } => GeoPoint {
                    lat,
                    lng,
                    timestamp,
                },
                RawRecord::Projected { easting, northing } => {
                    if !candidate.in_domain(easting, northing) {
                        return None;
                    }
                    projector.project(easting, northing).ok()?
                }
            };
            point.is_plausible().then_some(point)
        })
        .collect()
}
