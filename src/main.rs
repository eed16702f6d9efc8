//! shapemerge: a standalone tool that merges many shapefiles into one
//! shapefile or one flattened CSV attribute table.
//!
//! Attribute schemas that differ across inputs are unified into one
//! canonical column set; columns a file does not carry are filled with
//! empty values so the output never has gaps.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shapemerge::config::{self, Config, MergeMode};
use shapemerge::error::MergeError;
use shapemerge::pipeline;

/// What to produce from the merged inputs.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Merge geometry and attributes into one output shapefile.
    Merge,
    /// Flatten attributes into a CSV table with a provenance column.
    ExtractAttrs,
}

impl From<Mode> for MergeMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Merge => MergeMode::Merge,
            Mode::ExtractAttrs => MergeMode::ExtractAttrs,
        }
    }
}

/// Merge many shapefiles into one dataset.
#[derive(Parser, Debug)]
#[command(name = "shapemerge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output to produce.
    #[arg(value_enum)]
    mode: Mode,

    /// Input file glob for shapefiles, e.g. "tiles/*.shp".
    #[arg(short, long)]
    input: String,

    /// Output file location.
    #[arg(short, long)]
    output: PathBuf,

    /// Output geometry type (merge mode only).
    #[arg(short = 't', long, default_value = "polygon")]
    geometry_type: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), MergeError> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let shape_type = config::parse_shape_type(&args.geometry_type)?;
    let inputs = config::expand_inputs(&args.input)?;
    info!(
        "Merging {} input files into {}",
        inputs.len(),
        args.output.display()
    );

    let config = Config::new(args.mode.into(), inputs, args.output, shape_type)?;
    let report = pipeline::run(config).await?;

    for warning in &report.warnings {
        info!("warning: {}: {}", warning.path.display(), warning.message);
    }
    info!(
        "Done: {} rows from {} files ({} skipped)",
        report.rows_emitted, report.files_merged, report.files_skipped
    );
    Ok(())
}
