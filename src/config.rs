//! Run configuration and input expansion.
//!
//! The CLI layer parses flags, expands the input glob, and builds a
//! validated [`Config`] that the pipeline consumes. Everything past this
//! point works on concrete file paths.

use glob::glob;
use shapefile::ShapeType;
use snafu::prelude::*;
use std::path::PathBuf;

use crate::error::{
    BadPatternSnafu, ConfigError, EmptyOutputPathSnafu, NoInputFilesSnafu, UnknownGeometryTypeSnafu,
};

/// Output to produce from the merged inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// One combined geometry + attribute shapefile.
    Merge,
    /// One flattened CSV attribute table with a provenance column.
    ExtractAttrs,
}

/// Validated configuration for one merge run.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: MergeMode,
    /// Input shapefiles, in discovery order. The order matters: canonical
    /// column order follows it.
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    /// Geometry type tag for the output shapefile. Passed through to sink
    /// creation unmodified; ignored in extract-attrs mode.
    pub shape_type: ShapeType,
}

impl Config {
    pub fn new(
        mode: MergeMode,
        inputs: Vec<PathBuf>,
        output: PathBuf,
        shape_type: ShapeType,
    ) -> Result<Self, ConfigError> {
        ensure!(!output.as_os_str().is_empty(), EmptyOutputPathSnafu);
        Ok(Self {
            mode,
            inputs,
            output,
            shape_type,
        })
    }
}

/// Expand an input glob into the ordered list of matching paths.
///
/// Matches come back in the glob crate's sorted order, which keeps the
/// schema pass deterministic for a given set of inputs. Zero matches is a
/// configuration error, not an empty run.
pub fn expand_inputs(pattern: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let paths: Vec<PathBuf> = glob(pattern)
        .context(BadPatternSnafu { pattern })?
        .filter_map(Result::ok)
        .collect();
    ensure!(!paths.is_empty(), NoInputFilesSnafu { pattern });
    Ok(paths)
}

/// Parse a geometry type name into the shapefile type tag.
///
/// Whether the input geometries are actually compatible with the chosen
/// type is the caller's responsibility; an incompatible shape surfaces
/// later as an abandoned row.
pub fn parse_shape_type(name: &str) -> Result<ShapeType, ConfigError> {
    let shape_type = match name.to_ascii_lowercase().as_str() {
        "point" => ShapeType::Point,
        "pointm" => ShapeType::PointM,
        "pointz" => ShapeType::PointZ,
        "polyline" => ShapeType::Polyline,
        "polylinem" => ShapeType::PolylineM,
        "polylinez" => ShapeType::PolylineZ,
        "polygon" => ShapeType::Polygon,
        "polygonm" => ShapeType::PolygonM,
        "polygonz" => ShapeType::PolygonZ,
        "multipoint" => ShapeType::Multipoint,
        "multipointm" => ShapeType::MultipointM,
        "multipointz" => ShapeType::MultipointZ,
        "multipatch" => ShapeType::Multipatch,
        _ => return UnknownGeometryTypeSnafu { name }.fail(),
    };
    Ok(shape_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shape_type_names() {
        assert_eq!(parse_shape_type("polygon").unwrap(), ShapeType::Polygon);
        assert_eq!(parse_shape_type("POINT").unwrap(), ShapeType::Point);
        assert_eq!(
            parse_shape_type("polylinez").unwrap(),
            ShapeType::PolylineZ
        );
    }

    #[test]
    fn test_parse_shape_type_rejects_unknown() {
        let err = parse_shape_type("hexagon").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownGeometryType { .. }));
    }

    #[test]
    fn test_expand_inputs_requires_a_match() {
        let dir = tempfile::TempDir::new().unwrap();
        let pattern = format!("{}/*.shp", dir.path().display());
        let err = expand_inputs(&pattern).unwrap_err();
        assert!(matches!(err, ConfigError::NoInputFiles { .. }));
    }

    #[test]
    fn test_expand_inputs_returns_sorted_matches() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.shp"), b"").unwrap();
        std::fs::write(dir.path().join("a.shp"), b"").unwrap();
        let pattern = format!("{}/*.shp", dir.path().display());
        let paths = expand_inputs(&pattern).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("a.shp"));
        assert!(paths[1].ends_with("b.shp"));
    }

    #[test]
    fn test_config_rejects_empty_output() {
        let err = Config::new(
            MergeMode::Merge,
            vec![PathBuf::from("a.shp")],
            PathBuf::new(),
            ShapeType::Polygon,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyOutputPath));
    }
}
