//! proj4rs-backed reprojection between candidate systems and WGS84.
//!
//! Transforms run through PROJ.4 parameter strings from the candidate table;
//! geographic coordinates cross the proj4rs boundary in radians.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::CrsId;
use crate::error::GeometryError;
use crate::geo::GeoPoint;

const GEOGRAPHIC_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Converts easting/northing pairs of one candidate system to geographic
/// coordinates (and back).
///
/// Building the underlying projections is not free, so a `Projector` is
/// created once per batch and reused for every record.
pub struct Projector {
    crs: CrsId,
    source: Proj,
    geographic: Proj,
}

impl Projector {
    /// Builds the projection pair for `crs`.
    pub fn new(crs: CrsId) -> Result<Self, GeometryError> {
        let build = |proj4: &str| {
            Proj::from_proj_string(proj4).map_err(|e| GeometryError::InvalidParameters {
                crs,
                message: e.to_string(),
            })
        };
        Ok(Self {
            crs,
            source: build(crs.candidate().proj4)?,
            geographic: build(GEOGRAPHIC_PROJ4)?,
        })
    }

    /// The system this projector converts from.
    pub fn crs(&self) -> CrsId {
        self.crs
    }

    /// Reprojects one easting/northing pair to a geographic point.
    ///
    /// Non-finite results are rejected, never clamped. For the geographic
    /// pass-through, easting is longitude and northing is latitude.
    pub fn project(&self, easting: f64, northing: f64) -> Result<GeoPoint, GeometryError> {
        if self.crs.is_geographic() {
            return finite_point(northing, easting, easting, northing, self.crs);
        }

        let mut point = (easting, northing, 0.0);
        transform(&self.source, &self.geographic, &mut point).map_err(|e| {
            GeometryError::Transform {
                easting,
                northing,
                crs: self.crs,
                message: e.to_string(),
            }
        })?;
        finite_point(
            point.1.to_degrees(),
            point.0.to_degrees(),
            easting,
            northing,
            self.crs,
        )
    }

    /// Inverse of [`Projector::project`].
    ///
    /// Mostly useful to derive projected fixtures from known geographic
    /// points; the import pipeline itself only ever projects towards WGS84.
    pub fn unproject(&self, point: &GeoPoint) -> Result<(f64, f64), GeometryError> {
        if self.crs.is_geographic() {
            return Ok((point.lng, point.lat));
        }

        let mut coord = (point.lng.to_radians(), point.lat.to_radians(), 0.0);
        transform(&self.geographic, &self.source, &mut coord).map_err(|e| {
            GeometryError::Transform {
                easting: point.lng,
                northing: point.lat,
                crs: self.crs,
                message: e.to_string(),
            }
        })?;
        if !coord.0.is_finite() || !coord.1.is_finite() {
            return Err(GeometryError::NonFinite {
                easting: point.lng,
                northing: point.lat,
                crs: self.crs,
            });
        }
        Ok((coord.0, coord.1))
    }
}

fn finite_point(
    lat: f64,
    lng: f64,
    easting: f64,
    northing: f64,
    crs: CrsId,
) -> Result<GeoPoint, GeometryError> {
    if !lat.is_finite() || !lng.is_finite() {
        return Err(GeometryError::NonFinite {
            easting,
            northing,
            crs,
        });
    }
    Ok(GeoPoint::new(lat, lng))
}

/// One-off reprojection of a single pair.
///
/// Builds a throwaway [`Projector`]; prefer holding one for batches.
pub fn reproject(easting: f64, northing: f64, crs: CrsId) -> Result<GeoPoint, GeometryError> {
    Projector::new(crs)?.project(easting, northing)
}
