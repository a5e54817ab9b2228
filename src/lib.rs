//! Aufmass: the geospatial point-assignment engine of a construction-site
//! management suite.
//!
//! Field surveys arrive as coordinate files in whatever format the rover or
//! office software produced. Aufmass ingests them, works out which
//! reference system the raw numbers are in, reprojects everything to
//! geographic coordinates, computes path geometry, and manages the
//! resulting point assignments bound to bill-of-quantities positions.
//!
//! # Modules
//!
//! - [`ingest`]: file readers (delimited text, GPX, KML, GeoJSON)
//! - [`crs`]: reference-system candidates, reprojection, CRS detection
//! - [`geo`]: canonical point model and great-circle geometry
//! - [`store`]: draft lifecycle and assignment persistence
//! - [`report`]: manifests for the external document renderer
//! - [`error`]: error types for aufmass operations

pub mod crs;
pub mod error;
pub mod geo;
pub mod ingest;
pub mod report;
pub mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::crs::{CrsId, CrsResolution};
use crate::ingest::{Format, ImportBatch};
pub use error::AufmassError;

/// The aufmass CLI application.
#[derive(Parser)]
#[command(name = "aufmass")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Parse a survey file, detect its reference system, and summarize.
    Import(ImportArgs),
}

/// Arguments for the import subcommand.
#[derive(clap::Args)]
struct ImportArgs {
    /// Survey file to import (csv/txt, gpx, kml, geojson).
    input: PathBuf,

    /// Input format; inferred from the file extension when omitted.
    #[arg(long)]
    format: Option<String>,

    /// Reference system to prefer when detection is ambiguous (EPSG code).
    #[arg(long, default_value = "25832")]
    crs: String,

    /// Output format for the summary ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the aufmass CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), AufmassError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Import(args)) => run_import(args),
        None => {
            println!("aufmass {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Geospatial point assignment for construction-site surveys.");
            println!();
            println!("Run 'aufmass --help' for usage information.");
            Ok(())
        }
    }
}

/// JSON shape of the import summary.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportSummary {
    format: &'static str,
    records: usize,
    skipped_rows: usize,
    truncated: bool,
    crs: String,
    crs_label: &'static str,
    confidence: crs::Confidence,
    accepted_points: usize,
    path_length_m: f64,
    diagnostics: Vec<(String, usize)>,
}

/// Execute the import subcommand.
fn run_import(args: ImportArgs) -> Result<(), AufmassError> {
    let format = match args.format.as_deref() {
        Some(name) => Format::from_extension(&name.to_ascii_lowercase()).ok_or_else(|| {
            error::IngestError::UnsupportedFormat(format!(
                "'{}' (supported: csv, txt, gpx, kml, geojson)",
                name
            ))
        })?,
        None => Format::from_path(&args.input)?,
    };

    let preferred: CrsId = args
        .crs
        .parse()
        .map_err(|e: crs::ParseCrsError| AufmassError::InvalidArgument(e.to_string()))?;

    let bytes = std::fs::read(&args.input)?;
    let batch = ingest::parse_with_path(&bytes, format, &args.input)?;
    let resolution = crs::resolve(&batch.records, preferred)?;
    let length = geo::path_length_m(&resolution.points);

    match args.output.as_str() {
        "json" => print_json_summary(format, &batch, &resolution, length),
        _ => print_text_summary(format, &batch, &resolution, length, &args.input),
    }

    Ok(())
}

fn print_text_summary(
    format: Format,
    batch: &ImportBatch,
    resolution: &CrsResolution,
    length: f64,
    input: &std::path::Path,
) {
    println!(
        "{}: {} record(s) from {}",
        format,
        batch.records.len(),
        input.display()
    );
    if batch.skipped_rows > 0 {
        println!("  {} row(s) skipped", batch.skipped_rows);
    }
    if batch.truncated {
        println!(
            "  input truncated to {} record(s)",
            ingest::MAX_IMPORT_RECORDS
        );
    }
    let confidence = match resolution.confidence {
        crs::Confidence::Full => "full",
        crs::Confidence::Partial => "partial",
    };
    println!(
        "reference system: {} ({}), {} confidence",
        resolution.crs,
        resolution.crs.label(),
        confidence
    );
    println!("accepted points: {}", resolution.points.len());
    println!("path length: {:.1} m", length);
    if resolution.confidence == crs::Confidence::Partial {
        println!("candidate counts:");
        for (crs, count) in &resolution.diagnostics {
            println!("  {}: {}", crs, count);
        }
    }
}

fn print_json_summary(
    format: Format,
    batch: &ImportBatch,
    resolution: &CrsResolution,
    length: f64,
) {
    let summary = ImportSummary {
        format: format.name(),
        records: batch.records.len(),
        skipped_rows: batch.skipped_rows,
        truncated: batch.truncated,
        crs: resolution.crs.to_string(),
        crs_label: resolution.crs.label(),
        confidence: resolution.confidence,
        accepted_points: resolution.points.len(),
        path_length_m: length,
        diagnostics: resolution
            .diagnostics
            .iter()
            .map(|(crs, count)| (crs.to_string(), *count))
            .collect(),
    };
    // Serialization of this summary cannot fail.
    println!("{}", serde_json::to_string_pretty(&summary).unwrap());
}
