//! Row projection into canonical column order.

use shapefile::dbase::{FieldType, FieldValue, Record};

use super::{CanonicalSchema, FileMapping};

/// A fully populated output row, aligned to the canonical schema.
///
/// Always exactly canonical width; slots whose column the source file
/// does not carry hold that column's sentinel. Produced per record and
/// consumed immediately by the sink.
#[derive(Debug, Clone)]
pub struct CanonicalRow {
    pub values: Vec<FieldValue>,
}

/// Project one file-local record into canonical column order.
///
/// Every slot is pre-filled with its column's sentinel before local
/// values are copied in, so the row never has a gap. Pure and free of
/// shared state; safe to call from any number of workers at once.
pub fn project_row(
    record: &Record,
    mapping: &FileMapping,
    schema: &CanonicalSchema,
) -> CanonicalRow {
    let mut values: Vec<FieldValue> = schema
        .fields()
        .iter()
        .map(|field| field.default_value())
        .collect();
    for (local_name, canonical_index) in mapping.entries() {
        if let Some(value) = record.get(local_name) {
            let kind = schema.field(*canonical_index).kind;
            values[*canonical_index] = coerce(value.clone(), kind);
        }
    }
    CanonicalRow { values }
}

/// Align a value with its canonical column kind where the conversion is
/// cheap and unambiguous. Anything else passes through unchanged; an
/// incompatible value then fails that one row's write, which is
/// non-fatal.
fn coerce(value: FieldValue, kind: FieldType) -> FieldValue {
    match (kind, value) {
        (FieldType::Character, FieldValue::Character(v)) => FieldValue::Character(v),
        (FieldType::Character, other) => FieldValue::Character(Some(render_value(&other))),
        (FieldType::Numeric, FieldValue::Integer(v)) => FieldValue::Numeric(Some(f64::from(v))),
        (FieldType::Numeric, FieldValue::Float(v)) => FieldValue::Numeric(v.map(f64::from)),
        (FieldType::Float, FieldValue::Numeric(v)) => FieldValue::Float(v.map(|n| n as f32)),
        (FieldType::Integer, FieldValue::Numeric(v)) => {
            FieldValue::Integer(v.unwrap_or(0.0) as i32)
        }
        (_, other) => other,
    }
}

/// Render a single attribute value as text, the empty string standing in
/// for nulls.
pub fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Character(v) => v.clone().unwrap_or_default(),
        FieldValue::Numeric(v) => v.map(|n| n.to_string()).unwrap_or_default(),
        FieldValue::Float(v) => v.map(|n| n.to_string()).unwrap_or_default(),
        FieldValue::Integer(v) => v.to_string(),
        FieldValue::Logical(v) => v.map(|b| b.to_string()).unwrap_or_default(),
        FieldValue::Date(v) => v
            .map(|d| format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
            .unwrap_or_default(),
        FieldValue::Double(v) => v.to_string(),
        FieldValue::Currency(v) => v.to_string(),
        FieldValue::Memo(v) => v.clone(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{normalize_name, FieldDescriptor, LocalField, SchemaRegistry};

    fn schema_and_mappings() -> (CanonicalSchema, FileMapping, FileMapping) {
        let character = |name: &str| LocalField {
            name: name.to_string(),
            descriptor: FieldDescriptor {
                name: normalize_name(name),
                kind: FieldType::Character,
                length: 20,
            },
        };
        let numeric = |name: &str| LocalField {
            name: name.to_string(),
            descriptor: FieldDescriptor {
                name: normalize_name(name),
                kind: FieldType::Numeric,
                length: 10,
            },
        };
        let mut registry = SchemaRegistry::new();
        let first = registry.register(&[character("NAME"), numeric("POP")]);
        let second = registry.register(&[character("NAME"), numeric("AREA")]);
        (registry.finalize().unwrap(), first, second)
    }

    #[test]
    fn test_row_width_matches_canonical_schema() {
        let (schema, first, second) = schema_and_mappings();
        let mut record = Record::default();
        record.insert("NAME".into(), FieldValue::Character(Some("A".into())));
        record.insert("POP".into(), FieldValue::Numeric(Some(7.0)));
        assert_eq!(project_row(&record, &first, &schema).values.len(), 3);
        assert_eq!(project_row(&record, &second, &schema).values.len(), 3);
    }

    #[test]
    fn test_absent_columns_keep_sentinel() {
        let (schema, _, second) = schema_and_mappings();
        let mut record = Record::default();
        record.insert("NAME".into(), FieldValue::Character(Some("X".into())));
        record.insert("AREA".into(), FieldValue::Numeric(Some(42.0)));
        let row = project_row(&record, &second, &schema);
        // Canonical order is NAME, POP, AREA; POP is absent from this file.
        assert!(matches!(
            &row.values[0],
            FieldValue::Character(Some(v)) if v == "X"
        ));
        assert!(matches!(row.values[1], FieldValue::Numeric(None)));
        assert!(matches!(row.values[2], FieldValue::Numeric(Some(v)) if v == 42.0));
    }

    #[test]
    fn test_values_coerce_toward_character_columns() {
        assert!(matches!(
            coerce(FieldValue::Numeric(Some(3.0)), FieldType::Character),
            FieldValue::Character(Some(v)) if v == "3"
        ));
        assert!(matches!(
            coerce(FieldValue::Integer(5), FieldType::Numeric),
            FieldValue::Numeric(Some(v)) if v == 5.0
        ));
    }

    #[test]
    fn test_render_value_uses_empty_string_for_null() {
        assert_eq!(render_value(&FieldValue::Numeric(None)), "");
        assert_eq!(render_value(&FieldValue::Character(None)), "");
        assert_eq!(render_value(&FieldValue::Character(Some("x".into()))), "x");
        assert_eq!(render_value(&FieldValue::Logical(Some(true))), "true");
    }
}
