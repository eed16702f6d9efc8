//! Error types for shapemerge using snafu.
//!
//! This module defines structured error types with context selectors for
//! all error conditions in the codebase. Only the conditions surfaced
//! through [`MergeError`] abort a run; everything else is logged and
//! accumulated as a per-file warning.

use snafu::prelude::*;
use std::path::PathBuf;

// ============ Config Errors ============

/// Errors that can occur while building the run configuration.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// The input glob pattern could not be parsed.
    #[snafu(display("Invalid input pattern {pattern:?}"))]
    BadPattern {
        pattern: String,
        source: glob::PatternError,
    },

    /// The input glob matched nothing.
    #[snafu(display("No matches for input pattern {pattern:?}"))]
    NoInputFiles { pattern: String },

    /// Output path is empty.
    #[snafu(display("Output location cannot be empty"))]
    EmptyOutputPath,

    /// The requested output geometry type is not a known shape type.
    #[snafu(display("Unknown geometry type {name:?}"))]
    UnknownGeometryType { name: String },
}

// ============ Schema Errors ============

/// Errors raised while unifying input schemas.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SchemaError {
    /// Every input was unreadable or carried no attribute fields.
    #[snafu(display("No readable input contributed any attribute field"))]
    EmptySchema,
}

// ============ Source Errors ============

/// Errors reading an input shapefile. Always recoverable at the run
/// level: the offending file is skipped.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    /// The sidecar attribute table could not be opened.
    #[snafu(display("Failed to open attribute table {}", path.display()))]
    OpenTable {
        path: PathBuf,
        source: shapefile::dbase::Error,
    },

    /// The shapefile could not be opened for record streaming.
    #[snafu(display("Failed to open shapefile {}", path.display()))]
    OpenShapefile {
        path: PathBuf,
        source: shapefile::Error,
    },
}

// ============ Sink Errors ============

/// Errors on the output side. Creation and schema application are fatal;
/// per-row write failures are abandoned rows, not run failures.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// The output shapefile could not be created.
    #[snafu(display("Failed to create output shapefile {}", path.display()))]
    CreateShapefile {
        path: PathBuf,
        source: shapefile::Error,
    },

    /// The output table could not be created.
    #[snafu(display("Failed to create output table {}", path.display()))]
    CreateTable { path: PathBuf, source: csv::Error },

    /// A canonical field name was rejected by the output table format.
    #[snafu(display("Field name {name:?} rejected by the output table: {message}"))]
    InvalidField { name: String, message: String },

    /// The output geometry type cannot be the null shape.
    #[snafu(display("Output geometry type cannot be the null shape"))]
    NullShapeOutput,

    /// An input geometry is incompatible with the configured output type.
    #[snafu(display("Geometry incompatible with the output type"))]
    ShapeConversion { source: shapefile::Error },

    /// Writing one geometry + attribute row failed.
    #[snafu(display("Failed to write geometry and attributes"))]
    WriteShape { source: shapefile::Error },

    /// Failed to write the table header row.
    #[snafu(display("Failed to write table header"))]
    WriteHeader { source: csv::Error },

    /// Writing one table row failed.
    #[snafu(display("Failed to write table row"))]
    WriteRow { source: csv::Error },

    /// The output table could not be flushed on close.
    #[snafu(display("Failed to flush output table"))]
    Flush { source: std::io::Error },

    /// Another worker panicked while holding the writer lock.
    #[snafu(display("Output writer lock was poisoned"))]
    LockPoisoned,
}

// ============ Top-level Error ============

/// Fatal error for a whole merge run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MergeError {
    /// Invalid run configuration.
    #[snafu(context(false))]
    #[snafu(display("Invalid configuration"))]
    Config { source: ConfigError },

    /// Schema unification failed.
    #[snafu(display("Schema unification failed"))]
    Schema { source: SchemaError },

    /// The output sink could not be created or initialized.
    #[snafu(display("Output sink failed"))]
    Sink { source: SinkError },
}
