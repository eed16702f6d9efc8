//! Canonical schema types and field-name normalization.
//!
//! Shapefile attribute tables limit field names to 10 characters. Two
//! fields whose names agree under that truncation are treated as the
//! same output column and their values merge into it. This mirrors the
//! attribute format's own limit and is a deliberate lossy rule, tested
//! explicitly, not a bug to fix.

mod project;
mod registry;

pub use project::{project_row, render_value, CanonicalRow};
pub use registry::SchemaRegistry;

use shapefile::dbase::{FieldInfo, FieldType, FieldValue};

/// Maximum field-name width of the DBF attribute format.
pub const MAX_FIELD_NAME_LEN: usize = 10;

/// Reduce a field name to its canonical identity.
pub fn normalize_name(name: &str) -> String {
    name.chars().take(MAX_FIELD_NAME_LEN).collect()
}

/// A canonical output column.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Normalized name, at most [`MAX_FIELD_NAME_LEN`] characters.
    pub name: String,
    /// Output field kind. When same-named fields disagree across inputs,
    /// the first-seen kind wins and later values are coerced or rejected
    /// per row.
    pub kind: FieldType,
    /// Declared field width in bytes.
    pub length: u8,
}

impl FieldDescriptor {
    /// Build a descriptor from one input file's field declaration,
    /// degrading kinds the output table cannot declare to plain
    /// character fields.
    pub fn from_field_info(info: &FieldInfo) -> Self {
        let (kind, length) = match info.field_type() {
            FieldType::Memo => (FieldType::Character, 254),
            FieldType::Currency | FieldType::DateTime | FieldType::Double => {
                (FieldType::Character, 32)
            }
            kind => (kind, info.length()),
        };
        Self {
            name: normalize_name(info.name()),
            kind,
            length,
        }
    }

    /// The sentinel a row slot holds when its source file has no column
    /// for it. Character columns get an explicit empty string rather
    /// than a missing cell; many bulk-import tools choke on the latter.
    pub fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldType::Numeric => FieldValue::Numeric(None),
            FieldType::Float => FieldValue::Float(None),
            FieldType::Logical => FieldValue::Logical(None),
            FieldType::Date => FieldValue::Date(None),
            FieldType::Integer => FieldValue::Integer(0),
            _ => FieldValue::Character(Some(String::new())),
        }
    }
}

/// One field as declared by a single input file, before unification.
#[derive(Debug, Clone)]
pub struct LocalField {
    /// The name as stored in the file, used to look values up in that
    /// file's records.
    pub name: String,
    pub descriptor: FieldDescriptor,
}

/// The frozen, ordered set of output columns agreed across all inputs.
///
/// Built once by [`SchemaRegistry::finalize`] and immutable afterwards.
/// The sequence is the authoritative output column order and width.
#[derive(Debug)]
pub struct CanonicalSchema {
    fields: Vec<FieldDescriptor>,
}

impl CanonicalSchema {
    pub(crate) fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> &FieldDescriptor {
        &self.fields[index]
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Index of the column that carries provenance labels in tabular
    /// mode. The last canonical column is reused for this, header and
    /// values both.
    pub fn provenance_index(&self) -> usize {
        self.fields.len() - 1
    }
}

/// Per-file mapping from local field names to canonical column indices.
///
/// Built once during pass 1 and read-only afterwards. Every local column
/// maps to exactly one canonical column; a file never introduces a
/// canonical column after the schema is frozen.
#[derive(Debug, Clone, Default)]
pub struct FileMapping {
    entries: Vec<(String, usize)>,
}

impl FileMapping {
    pub(crate) fn push(&mut self, local_name: String, canonical_index: usize) {
        self.entries.push((local_name, canonical_index));
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_truncates_to_format_limit() {
        assert_eq!(normalize_name("NAME"), "NAME");
        assert_eq!(normalize_name("VERYLONGNAME1"), "VERYLONGNA");
        assert_eq!(normalize_name("VERYLONGNAME2"), "VERYLONGNA");
    }

    #[test]
    fn test_character_sentinel_is_empty_string() {
        let field = FieldDescriptor {
            name: "NAME".into(),
            kind: FieldType::Character,
            length: 20,
        };
        assert!(matches!(
            field.default_value(),
            FieldValue::Character(Some(s)) if s.is_empty()
        ));
    }

    #[test]
    fn test_typed_sentinels_are_null() {
        let field = FieldDescriptor {
            name: "POP".into(),
            kind: FieldType::Numeric,
            length: 10,
        };
        assert!(matches!(field.default_value(), FieldValue::Numeric(None)));
    }
}
