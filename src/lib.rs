//! shapemerge: merge many shapefiles into one dataset.
//!
//! Takes a set of input shapefiles with similar but not identical
//! attribute schemas and merges them into either one combined output
//! shapefile or one flattened CSV attribute table with a provenance
//! column naming each row's source file.
//!
//! Field names are unified under the attribute format's 10-character
//! name limit: names that agree after truncation become one output
//! column. Columns a file does not carry are filled with an empty-string
//! (or typed null) sentinel so downstream imports never see a gap.
//!
//! # Example
//!
//! ```ignore
//! use shapemerge::{Config, MergeMode, ShapeType, run};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), shapemerge::MergeError> {
//!     let inputs = shapemerge::config::expand_inputs("tiles/*.shp")?;
//!     let config = Config::new(MergeMode::Merge, inputs, "merged.shp".into(), ShapeType::Polygon)?;
//!     let report = run(config).await?;
//!     println!("Merged {} rows", report.rows_emitted);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod source;

// Re-export main types
pub use config::{Config, MergeMode};
pub use error::MergeError;
pub use pipeline::{run, MergeReport};
pub use shapefile::ShapeType;
