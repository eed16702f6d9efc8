//! Input shapefile access.
//!
//! Pass 1 opens only the sidecar `.dbf` to read a file's attribute
//! schema; pass 2 opens the full shapefile and streams shapes with their
//! records. A file that fails either open is skipped with a warning and
//! never aborts the run.

use snafu::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use shapefile::dbase;

use crate::error::{OpenShapefileSnafu, OpenTableSnafu, SourceError};
use crate::schema::{FieldDescriptor, LocalField};

/// Read one input's local attribute schema, in declared column order.
pub fn read_local_schema(path: &Path) -> Result<Vec<LocalField>, SourceError> {
    let table_path = path.with_extension("dbf");
    let reader = dbase::Reader::from_path(&table_path).context(OpenTableSnafu {
        path: table_path.clone(),
    })?;
    Ok(reader
        .fields()
        .iter()
        .filter(|info| info.name() != "DeletionFlag")
        .map(|info| LocalField {
            name: info.name().to_string(),
            descriptor: FieldDescriptor::from_field_info(info),
        })
        .collect())
}

/// Open the full shapefile (geometry + attributes) for record streaming.
pub fn open_shapefile(
    path: &Path,
) -> Result<shapefile::Reader<BufReader<File>, BufReader<File>>, SourceError> {
    shapefile::Reader::from_path(path).context(OpenShapefileSnafu { path })
}

/// Provenance label for a source file: its base name, extension
/// stripped. `/opt/geo/myshape0.shp` becomes `myshape0`.
pub fn provenance_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_provenance_label_strips_directory_and_extension() {
        assert_eq!(provenance_label(Path::new("/opt/geo/myshape0.shp")), "myshape0");
        assert_eq!(provenance_label(Path::new("tileA.shp")), "tileA");
    }

    #[test]
    fn test_missing_table_is_a_source_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path: PathBuf = dir.path().join("nothing.shp");
        let err = read_local_schema(&path).unwrap_err();
        assert!(matches!(err, SourceError::OpenTable { .. }));
    }
}
