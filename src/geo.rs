//! Canonical geographic model and path geometry.
//!
//! Every coordinate that leaves CRS resolution is a [`GeoPoint`]: geographic
//! latitude/longitude on the WGS84 ellipsoid. Raw file contents, before the
//! reference system is known, are [`RawRecord`]s.
//!
//! The engine serves construction sites in a fixed geographic region, so in
//! addition to the hard −90..90 / −180..180 ranges there is a plausibility
//! window ([`CENTRAL_EUROPE`]). A resolved point outside that window is a
//! detection failure, never a value to keep.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// The geographic window this engine considers plausible for survey data.
///
/// Survey files come from sites in Germany and neighboring countries; a
/// resolved coordinate outside this window means the reference system guess
/// was wrong, not that someone measured a point in the Atlantic.
pub const CENTRAL_EUROPE: GeoBounds = GeoBounds {
    min_lat: 35.0,
    max_lat: 65.0,
    min_lng: -10.0,
    max_lng: 30.0,
};

/// An axis-aligned latitude/longitude window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    /// Returns true if the pair lies inside the window (bounds inclusive).
    #[inline]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

/// A canonical geographic point.
///
/// Latitude/longitude in degrees on WGS84, with an optional unix timestamp
/// carried over from track formats that record one (GPX `<time>`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl GeoPoint {
    /// Creates a point without a timestamp.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            timestamp: None,
        }
    }

    /// Attaches a unix timestamp (seconds).
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// True when the point is finite, within hard geographic ranges, and
    /// inside the [`CENTRAL_EUROPE`] window.
    pub fn is_plausible(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
            && CENTRAL_EUROPE.contains(self.lat, self.lng)
    }
}

/// One coordinate pair as it came out of a survey file.
///
/// Readers either know the orientation (GPX/KML/GeoJSON are geographic by
/// definition) or they do not (delimited text), in which case the pair is
/// `Projected` and CRS resolution decides what it means. Raw records are
/// never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RawRecord {
    /// Latitude/longitude in degrees, orientation known.
    Geographic {
        lat: f64,
        lng: f64,
        timestamp: Option<i64>,
    },
    /// Easting/northing in an unknown reference system.
    Projected { easting: f64, northing: f64 },
}

impl RawRecord {
    /// True for records whose orientation is already geographic.
    pub fn is_geographic(&self) -> bool {
        matches!(self, RawRecord::Geographic { .. })
    }
}

/// Great-circle distance between two points in meters (haversine).
pub fn haversine_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Cumulative great-circle length of a point sequence in meters.
///
/// Zero or one point yields 0. The result is invariant under reversing the
/// sequence, since the pairwise distance is symmetric.
pub fn path_length_m(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_m(&pair[0], &pair[1]))
        .sum()
}
