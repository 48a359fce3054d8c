// src/identity/calculator.rs
//
// Identity calculator
//
// CRITICAL RULES:
// - Pure: same marked content -> same id, on any machine, in any order
// - Fields are keyed by name, never by declaration order
// - Sequences keep caller order (position is meaningful)
// - Nested entities contribute their fields, never their own id
// - Contract violations panic; they are defects, not bad input

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::field::{FieldValue, Identifiable};

/// Canonical identity shape of an entity.
///
/// Serialized as JSON with sorted object keys; `Null` is reserved for
/// absent values so it never collides with a present shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Shape {
    Null,
    Text(String),
    Integer(i64),
    Boolean(bool),
    Sequence(Vec<Shape>),
    Object(BTreeMap<&'static str, Shape>),
}

/// Computes the content-derived identifier of an entity.
///
/// SHA-256 over the canonical bytes, truncated to 128 bits and stamped as a
/// version 8 (custom) UUID. No time or randomness is involved.
pub fn compute_id(entity: &dyn Identifiable) -> Uuid {
    let digest = Sha256::digest(canonical_bytes(entity));
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::new_v8(bytes)
}

/// The exact bytes that get hashed for `entity`.
pub fn canonical_bytes(entity: &dyn Identifiable) -> Vec<u8> {
    let shape = identity_shape(entity);
    // Shapes hold only strings, integers and booleans under string keys.
    serde_json::to_vec(&shape).expect("identity shape is always serializable")
}

/// Extracts the marked fields of `entity` into its canonical shape.
pub fn identity_shape(entity: &dyn Identifiable) -> Shape {
    extract_entity(entity, None)
}

fn extract_entity(
    entity: &dyn Identifiable,
    restriction: Option<&'static [&'static str]>,
) -> Shape {
    let fields = entity.fields();

    if let Some(names) = restriction {
        for name in names {
            assert!(
                fields.iter().any(|field| field.name == *name),
                "identity restriction names field `{}` which the nested entity does not expose",
                name
            );
        }
    }

    let mut shape = BTreeMap::new();
    for field in fields {
        let marker = match restriction {
            Some(names) if !names.contains(&field.name) => continue,
            // A restricted selection may reach unmarked fields of the nested entity.
            Some(_) => field.marker.unwrap_or_default(),
            None => match field.marker {
                Some(marker) => marker,
                None => continue,
            },
        };

        let value = extract_value(field.name, field.value, marker.sub_fields);
        if shape.insert(field.name, value).is_some() {
            panic!("identity field `{}` is declared twice", field.name);
        }
    }

    Shape::Object(shape)
}

fn extract_value(
    name: &'static str,
    value: FieldValue<'_>,
    sub_fields: Option<&'static [&'static str]>,
) -> Shape {
    if sub_fields.is_some() && !matches!(value, FieldValue::Nested(_) | FieldValue::Sequence(_) | FieldValue::Absent) {
        panic!(
            "identity field `{}` restricts sub-fields but holds a {} value",
            name,
            value.kind()
        );
    }

    match value {
        FieldValue::Text(text) => Shape::Text(text.to_string()),
        FieldValue::Integer(number) => Shape::Integer(number),
        FieldValue::Boolean(flag) => Shape::Boolean(flag),
        FieldValue::Float(raw) => panic!(
            "identity field `{}` holds raw float {}; mark fixed-point values instead",
            name, raw
        ),
        FieldValue::Absent => Shape::Null,
        FieldValue::Nested(inner) => extract_entity(inner, sub_fields),
        FieldValue::Sequence(items) => Shape::Sequence(
            items
                .into_iter()
                .map(|item| extract_entity(item, sub_fields))
                .collect(),
        ),
    }
}
