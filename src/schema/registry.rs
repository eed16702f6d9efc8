//! Pass-1 schema registry.

use snafu::prelude::*;
use std::collections::HashMap;

use super::{CanonicalSchema, FieldDescriptor, FileMapping, LocalField};
use crate::error::{EmptySchemaSnafu, SchemaError};

/// Collects per-file attribute schemas during pass 1 and produces the
/// canonical output schema plus one local→canonical mapping per file.
///
/// Registration is strictly sequential: canonical column order is the
/// first-seen order across inputs and must stay deterministic. The
/// schema is closed once [`finalize`](Self::finalize) runs; no column is
/// ever added during the copy pass.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    fields: Vec<FieldDescriptor>,
    index_by_name: HashMap<String, usize>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one input file's local schema, returning the mapping
    /// from its local field names to canonical column indices.
    ///
    /// A field whose normalized name was already seen resolves to the
    /// existing column; its declared kind and width are ignored
    /// (first-seen wins).
    pub fn register(&mut self, local_fields: &[LocalField]) -> FileMapping {
        let mut mapping = FileMapping::default();
        for field in local_fields {
            let identity = field.descriptor.name.clone();
            let index = match self.index_by_name.get(&identity) {
                Some(&index) => index,
                None => {
                    self.fields.push(field.descriptor.clone());
                    let index = self.fields.len() - 1;
                    self.index_by_name.insert(identity, index);
                    index
                }
            };
            mapping.push(field.name.clone(), index);
        }
        mapping
    }

    /// Freeze the canonical schema. Fails if no registered file
    /// contributed a single field.
    pub fn finalize(self) -> Result<CanonicalSchema, SchemaError> {
        ensure!(!self.fields.is_empty(), EmptySchemaSnafu);
        Ok(CanonicalSchema::new(self.fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::normalize_name;
    use shapefile::dbase::FieldType;

    fn local(name: &str, kind: FieldType) -> LocalField {
        LocalField {
            name: name.to_string(),
            descriptor: FieldDescriptor {
                name: normalize_name(name),
                kind,
                length: 20,
            },
        }
    }

    #[test]
    fn test_union_keeps_first_seen_order() {
        let mut registry = SchemaRegistry::new();
        registry.register(&[
            local("NAME", FieldType::Character),
            local("POP", FieldType::Numeric),
        ]);
        registry.register(&[
            local("NAME", FieldType::Character),
            local("AREA", FieldType::Numeric),
        ]);
        let schema = registry.finalize().unwrap();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["NAME", "POP", "AREA"]);
    }

    #[test]
    fn test_truncation_collision_merges_columns() {
        let mut registry = SchemaRegistry::new();
        let first = registry.register(&[local("VERYLONGNAME1", FieldType::Character)]);
        let second = registry.register(&[local("VERYLONGNAME2", FieldType::Character)]);
        assert_eq!(first.entries()[0].1, second.entries()[0].1);
        let schema = registry.finalize().unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.field(0).name, "VERYLONGNA");
    }

    #[test]
    fn test_first_seen_kind_wins() {
        let mut registry = SchemaRegistry::new();
        registry.register(&[local("POP", FieldType::Numeric)]);
        registry.register(&[local("POP", FieldType::Character)]);
        let schema = registry.finalize().unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.field(0).kind, FieldType::Numeric);
    }

    #[test]
    fn test_mapping_tracks_local_names() {
        let mut registry = SchemaRegistry::new();
        registry.register(&[local("NAME", FieldType::Character)]);
        let mapping = registry.register(&[
            local("AREA", FieldType::Numeric),
            local("NAME", FieldType::Character),
        ]);
        assert_eq!(
            mapping.entries().to_vec(),
            vec![("AREA".to_string(), 1), ("NAME".to_string(), 0)]
        );
    }

    #[test]
    fn test_finalize_rejects_empty_schema() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.finalize(),
            Err(SchemaError::EmptySchema)
        ));
    }
}
