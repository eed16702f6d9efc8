//! Flattened CSV attribute sink.

use std::fs::File;
use std::path::Path;

use snafu::prelude::*;

use crate::error::{CreateTableSnafu, FlushSnafu, SinkError, WriteHeaderSnafu, WriteRowSnafu};
use crate::schema::{render_value, CanonicalRow, CanonicalSchema};

/// Header name of the provenance column in tabular output.
pub const PROVENANCE_COLUMN: &str = "shapemerge_input";

/// Writes flattened attribute rows to a CSV file: one column per
/// canonical field, with the last column repurposed for provenance
/// labels (header and values both).
pub struct TableSink {
    writer: csv::Writer<File>,
    provenance_index: usize,
}

impl TableSink {
    /// Create the output table and write its header row. Header names
    /// are the canonical names stripped of non-alphanumeric characters.
    pub fn create(path: &Path, schema: &CanonicalSchema) -> Result<Self, SinkError> {
        let mut writer = csv::Writer::from_path(path).context(CreateTableSnafu { path })?;
        let provenance_index = schema.provenance_index();
        let mut header: Vec<String> = schema
            .fields()
            .iter()
            .map(|field| clean_header(&field.name))
            .collect();
        header[provenance_index] = PROVENANCE_COLUMN.to_string();
        writer.write_record(&header).context(WriteHeaderSnafu)?;
        Ok(Self {
            writer,
            provenance_index,
        })
    }

    /// Write one row, stamping the provenance label into its last
    /// column. The caller holds the sink's critical section.
    pub fn write(&mut self, row: CanonicalRow, provenance: &str) -> Result<(), SinkError> {
        let mut cells: Vec<String> = row.values.iter().map(render_value).collect();
        cells[self.provenance_index] = provenance.to_string();
        self.writer.write_record(&cells).context(WriteRowSnafu)
    }

    /// Flush buffered rows to disk.
    pub fn finish(mut self) -> Result<(), SinkError> {
        self.writer.flush().context(FlushSnafu)
    }
}

/// Strip non-alphanumeric characters from a header name.
fn clean_header(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}
