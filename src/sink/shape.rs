//! Merged shapefile sink.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use shapefile::dbase::{FieldName, FieldType, Record, TableWriterBuilder};
use shapefile::record::EsriShape;
use shapefile::{Shape, ShapeType, Writer};
use snafu::prelude::*;

use crate::error::{
    CreateShapefileSnafu, NullShapeOutputSnafu, ShapeConversionSnafu, SinkError, WriteShapeSnafu,
};
use crate::schema::{CanonicalRow, CanonicalSchema};

/// Decimal places declared for numeric output columns. Input tables do
/// not surface their declared decimal counts, so a fixed precision keeps
/// the output stable.
const NUMERIC_DECIMALS: u8 = 3;

/// Writes merged geometry + attribute rows to one output shapefile.
///
/// Each row is staged as a complete attribute record and committed
/// together with its geometry in a single writer call, so a rejected row
/// never leaves a partially written row behind.
pub struct ShapeSink {
    writer: Writer<BufWriter<File>>,
    shape_type: ShapeType,
    field_names: Vec<String>,
}

impl ShapeSink {
    /// Create the output shapefile with the canonical schema applied.
    /// Any failure here is fatal; nothing has been written yet.
    pub fn create(
        path: &Path,
        shape_type: ShapeType,
        schema: &CanonicalSchema,
    ) -> Result<Self, SinkError> {
        ensure!(shape_type != ShapeType::NullShape, NullShapeOutputSnafu);

        let mut builder = TableWriterBuilder::new();
        for field in schema.fields() {
            let name = FieldName::try_from(field.name.as_str()).map_err(|e| {
                SinkError::InvalidField {
                    name: field.name.clone(),
                    message: e.to_string(),
                }
            })?;
            builder = match field.kind {
                FieldType::Numeric => builder.add_numeric_field(name, field.length, NUMERIC_DECIMALS),
                FieldType::Float => builder.add_float_field(name, field.length, NUMERIC_DECIMALS),
                FieldType::Logical => builder.add_logical_field(name),
                FieldType::Date => builder.add_date_field(name),
                FieldType::Integer => builder.add_integer_field(name),
                _ => builder.add_character_field(name, field.length),
            };
        }

        let writer = Writer::from_path(path, builder).context(CreateShapefileSnafu { path })?;
        Ok(Self {
            writer,
            shape_type,
            field_names: schema.fields().iter().map(|f| f.name.clone()).collect(),
        })
    }

    /// Commit one geometry + attribute row as a unit.
    ///
    /// The caller holds the sink's critical section for the whole call.
    /// A conversion or write failure abandons this row only.
    pub fn write(&mut self, shape: Shape, row: CanonicalRow) -> Result<(), SinkError> {
        let record = self.build_record(row);
        match self.shape_type {
            ShapeType::Point => self.write_as::<shapefile::Point>(shape, &record),
            ShapeType::PointM => self.write_as::<shapefile::PointM>(shape, &record),
            ShapeType::PointZ => self.write_as::<shapefile::PointZ>(shape, &record),
            ShapeType::Polyline => self.write_as::<shapefile::Polyline>(shape, &record),
            ShapeType::PolylineM => self.write_as::<shapefile::PolylineM>(shape, &record),
            ShapeType::PolylineZ => self.write_as::<shapefile::PolylineZ>(shape, &record),
            ShapeType::Polygon => self.write_as::<shapefile::Polygon>(shape, &record),
            ShapeType::PolygonM => self.write_as::<shapefile::PolygonM>(shape, &record),
            ShapeType::PolygonZ => self.write_as::<shapefile::PolygonZ>(shape, &record),
            ShapeType::Multipoint => self.write_as::<shapefile::Multipoint>(shape, &record),
            ShapeType::MultipointM => self.write_as::<shapefile::MultipointM>(shape, &record),
            ShapeType::MultipointZ => self.write_as::<shapefile::MultipointZ>(shape, &record),
            ShapeType::Multipatch => self.write_as::<shapefile::Multipatch>(shape, &record),
            ShapeType::NullShape => NullShapeOutputSnafu.fail(),
        }
    }

    /// Close the writer. Headers are rewritten when the writer drops.
    pub fn finish(self) -> Result<(), SinkError> {
        drop(self.writer);
        Ok(())
    }

    fn write_as<S>(&mut self, shape: Shape, record: &Record) -> Result<(), SinkError>
    where
        S: EsriShape + TryFrom<Shape, Error = shapefile::Error>,
    {
        let shape = S::try_from(shape).context(ShapeConversionSnafu)?;
        self.writer
            .write_shape_and_record(&shape, record)
            .context(WriteShapeSnafu)
    }

    fn build_record(&self, row: CanonicalRow) -> Record {
        let mut record = Record::default();
        for (name, value) in self.field_names.iter().zip(row.values) {
            record.insert(name.clone(), value);
        }
        record
    }
}
