//! Coordinate reference systems and CRS detection.
//!
//! Survey files rarely say which reference system their easting/northing
//! columns are in. This module holds the fixed set of systems German site
//! surveys actually come in ([`CANDIDATES`]), a proj4rs-backed
//! [`Projector`], and the sampling/scoring resolver ([`resolve`]) that
//! decides which candidate plausibly produced a batch of raw records.
//!
//! Adding a region means adding a row to the candidate table; the resolver
//! logic never changes.

mod proj;
mod resolve;

pub use proj::{reproject, Projector};
pub use resolve::{resolve, Confidence, CrsResolution, ACCEPT_RATIO, SCORE_SAMPLE_LEN};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::CENTRAL_EUROPE;

/// Identifier of a supported reference system.
///
/// `Wgs84` is the geographic pass-through: easting is taken as longitude and
/// northing as latitude (the Rechtswert/Hochwert convention carried over to
/// decimal degrees). The remaining candidates are the projected systems in
/// use on German construction sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrsId {
    Wgs84,
    Etrs89Utm32,
    Etrs89Utm33,
    DhdnGk2,
    DhdnGk3,
    DhdnGk4,
}

/// Projection parameters and the value domain of one candidate system.
///
/// `easting_range`/`northing_range` bound the coordinate values a file in
/// this system can plausibly contain (Gauss-Krüger eastings carry the zone
/// digit, UTM eastings stay below a megameter). A pair outside the domain is
/// never fed to the projection.
#[derive(Clone, Copy, Debug)]
pub struct CrsCandidate {
    pub id: CrsId,
    pub epsg: u32,
    pub label: &'static str,
    pub proj4: &'static str,
    pub easting_range: (f64, f64),
    pub northing_range: (f64, f64),
}

impl CrsCandidate {
    /// True if the pair lies inside this system's value domain.
    #[inline]
    pub fn in_domain(&self, easting: f64, northing: f64) -> bool {
        easting >= self.easting_range.0
            && easting <= self.easting_range.1
            && northing >= self.northing_range.0
            && northing <= self.northing_range.1
    }
}

/// The fixed candidate table, in default detection order.
pub const CANDIDATES: [CrsCandidate; 6] = [
    CrsCandidate {
        id: CrsId::Wgs84,
        epsg: 4326,
        label: "WGS84 geographic",
        proj4: "+proj=longlat +datum=WGS84 +no_defs",
        // Decimal degrees: the domain is the plausibility window itself,
        // in easting=longitude / northing=latitude orientation.
        easting_range: (CENTRAL_EUROPE.min_lng, CENTRAL_EUROPE.max_lng),
        northing_range: (CENTRAL_EUROPE.min_lat, CENTRAL_EUROPE.max_lat),
    },
    CrsCandidate {
        id: CrsId::Etrs89Utm32,
        epsg: 25832,
        label: "ETRS89 / UTM zone 32N",
        proj4: "+proj=utm +zone=32 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
        easting_range: (100_000.0, 1_000_000.0),
        northing_range: (3_800_000.0, 7_300_000.0),
    },
    CrsCandidate {
        id: CrsId::Etrs89Utm33,
        epsg: 25833,
        label: "ETRS89 / UTM zone 33N",
        proj4: "+proj=utm +zone=33 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
        easting_range: (100_000.0, 1_000_000.0),
        northing_range: (3_800_000.0, 7_300_000.0),
    },
    CrsCandidate {
        id: CrsId::DhdnGk2,
        epsg: 31466,
        label: "DHDN / Gauss-Krüger zone 2",
        proj4: "+proj=tmerc +lat_0=0 +lon_0=6 +k=1 +x_0=2500000 +y_0=0 +ellps=bessel \
                +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs",
        easting_range: (2_250_000.0, 2_750_000.0),
        northing_range: (5_100_000.0, 6_200_000.0),
    },
    CrsCandidate {
        id: CrsId::DhdnGk3,
        epsg: 31467,
        label: "DHDN / Gauss-Krüger zone 3",
        proj4: "+proj=tmerc +lat_0=0 +lon_0=9 +k=1 +x_0=3500000 +y_0=0 +ellps=bessel \
                +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs",
        easting_range: (3_250_000.0, 3_750_000.0),
        northing_range: (5_100_000.0, 6_200_000.0),
    },
    CrsCandidate {
        id: CrsId::DhdnGk4,
        epsg: 31468,
        label: "DHDN / Gauss-Krüger zone 4",
        proj4: "+proj=tmerc +lat_0=0 +lon_0=12 +k=1 +x_0=4500000 +y_0=0 +ellps=bessel \
                +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs",
        easting_range: (4_250_000.0, 4_750_000.0),
        northing_range: (5_100_000.0, 6_200_000.0),
    },
];

impl CrsId {
    /// All supported systems, in default detection order.
    pub const ALL: [CrsId; 6] = [
        CrsId::Wgs84,
        CrsId::Etrs89Utm32,
        CrsId::Etrs89Utm33,
        CrsId::DhdnGk2,
        CrsId::DhdnGk3,
        CrsId::DhdnGk4,
    ];

    /// The candidate table row for this system.
    pub fn candidate(&self) -> &'static CrsCandidate {
        let idx = CrsId::ALL.iter().position(|c| c == self).unwrap_or(0);
        &CANDIDATES[idx]
    }

    /// EPSG code of this system.
    pub fn epsg(&self) -> u32 {
        self.candidate().epsg
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        self.candidate().label
    }

    /// True for the geographic pass-through.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsId::Wgs84)
    }

    /// Looks a system up by EPSG code.
    pub fn from_epsg(epsg: u32) -> Option<CrsId> {
        CANDIDATES.iter().find(|c| c.epsg == epsg).map(|c| c.id)
    }
}

impl fmt::Display for CrsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// The given string names no supported reference system.
#[derive(Debug, Error)]
#[error("unknown reference system '{0}' (supported EPSG codes: 4326, 25832, 25833, 31466, 31467, 31468)")]
pub struct ParseCrsError(pub String);

impl FromStr for CrsId {
    type Err = ParseCrsError;

    /// Parses an EPSG code, with or without an `epsg:` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s
            .trim()
            .to_ascii_lowercase()
            .trim_start_matches("epsg:")
            .to_string();
        code.parse::<u32>()
            .ok()
            .and_then(CrsId::from_epsg)
            .ok_or_else(|| ParseCrsError(s.to_string()))
    }
}
