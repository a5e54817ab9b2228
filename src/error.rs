use std::path::PathBuf;
use thiserror::Error;

use crate::crs::CrsId;

/// Errors raised while turning file bytes into raw coordinate records.
///
/// Individual bad rows are skipped and counted, never fatal; these variants
/// cover the cases where the file as a whole cannot be used.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse {format} from {path}: {message}")]
    Malformed {
        format: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("No coordinate records survived parsing {path}")]
    Empty { path: PathBuf },
}

/// No candidate reference system produced plausible coordinates.
///
/// Carries the per-candidate accepted counts so callers can show the user
/// what was tried.
#[derive(Debug, Error)]
#[error("no reference system produced plausible coordinates ({} candidate(s) tried)", .diagnostics.len())]
pub struct CrsResolutionError {
    pub diagnostics: Vec<(CrsId, usize)>,
}

/// Errors from reprojecting a single coordinate pair.
///
/// During batch resolution these drop the offending record, not the batch.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("invalid projection parameters for {crs}: {message}")]
    InvalidParameters { crs: CrsId, message: String },

    #[error("projection failed for ({easting}, {northing}) in {crs}: {message}")]
    Transform {
        easting: f64,
        northing: f64,
        crs: CrsId,
        message: String,
    },

    #[error("non-finite result reprojecting ({easting}, {northing}) in {crs}")]
    NonFinite {
        easting: f64,
        northing: f64,
        crs: CrsId,
    },
}

/// A draft was asked to do something its state does not allow.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("cannot save an assignment without points")]
    EmptyDraft,

    #[error("cannot save an assignment without a bill-of-quantities position")]
    MissingLvPosition,

    #[error("draft already holds the maximum of {max} points")]
    DraftFull { max: usize },
}

/// Transport or local-storage failure.
///
/// The store surfaces these without retrying and without discarding the
/// local draft; retry policy belongs to the transport client.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("draft storage error at {path}: {source}")]
    DraftStorage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("draft encoding error: {0}")]
    DraftEncoding(#[from] serde_json::Error),
}

/// The main error type for aufmass operations.
#[derive(Debug, Error)]
pub enum AufmassError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    CrsResolution(#[from] CrsResolutionError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
