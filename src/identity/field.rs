// src/identity/field.rs
//
// Field-selection metadata
//
// Content entities list their fields once, each optionally carrying a
// `Marker`. Only marked fields feed the identity hash. A marker on a
// relation may restrict which fields of the referenced entity are pulled in.

use super::fixed_point::fixed_point;

/// An entity that can describe its own fields to the identity calculator.
pub trait Identifiable {
    /// All selectable fields, marked or not.
    ///
    /// Unmarked fields are still listed so that a restricted marker on an
    /// outer entity can select them by name.
    fn fields(&self) -> Vec<FieldEntry<'_>>;
}

/// Declares that a field participates in identity computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Marker {
    /// When set, a nested entity contributes only these fields instead of
    /// its own marked ones.
    pub sub_fields: Option<&'static [&'static str]>,
}

/// One field of a content entity as seen by the calculator.
pub struct FieldEntry<'a> {
    pub name: &'static str,
    pub value: FieldValue<'a>,
    pub marker: Option<Marker>,
}

impl<'a> FieldEntry<'a> {
    /// A field that participates in the entity's identity.
    pub fn marked(name: &'static str, value: FieldValue<'a>) -> Self {
        Self {
            name,
            value,
            marker: Some(Marker::default()),
        }
    }

    /// A field that is stored but never hashed.
    pub fn unmarked(name: &'static str, value: FieldValue<'a>) -> Self {
        Self {
            name,
            value,
            marker: None,
        }
    }

    /// A marked relation that only pulls `sub_fields` from the nested entity.
    pub fn restricted(
        name: &'static str,
        value: FieldValue<'a>,
        sub_fields: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            value,
            marker: Some(Marker {
                sub_fields: Some(sub_fields),
            }),
        }
    }

    pub fn is_marked(&self) -> bool {
        self.marker.is_some()
    }
}

/// The value of a field.
pub enum FieldValue<'a> {
    Text(&'a str),
    Integer(i64),
    Boolean(bool),
    /// A raw float. Allowed on unmarked fields only; identities use
    /// `FieldValue::fixed` instead.
    Float(f64),
    /// An unset optional value or a missing nested entity.
    Absent,
    Nested(&'a dyn Identifiable),
    /// Ordered; position is part of the identity.
    Sequence(Vec<&'a dyn Identifiable>),
}

impl<'a> FieldValue<'a> {
    pub fn text(value: &'a str) -> Self {
        FieldValue::Text(value)
    }

    pub fn optional_text(value: Option<&'a str>) -> Self {
        value.map_or(FieldValue::Absent, FieldValue::Text)
    }

    /// Fixed-point form of a fractional quantity.
    pub fn fixed(value: f64) -> Self {
        FieldValue::Integer(fixed_point(value))
    }

    pub fn nested<T: Identifiable>(value: &'a T) -> Self {
        FieldValue::Nested(value)
    }

    pub fn optional_nested<T: Identifiable>(value: Option<&'a T>) -> Self {
        match value {
            Some(inner) => FieldValue::Nested(inner),
            None => FieldValue::Absent,
        }
    }

    pub fn sequence<T: Identifiable>(values: &'a [T]) -> Self {
        FieldValue::Sequence(values.iter().map(|v| v as &dyn Identifiable).collect())
    }

    /// Short name of the value's shape, for contract-violation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Integer(_) => "integer",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Float(_) => "float",
            FieldValue::Absent => "absent",
            FieldValue::Nested(_) => "nested",
            FieldValue::Sequence(_) => "sequence",
        }
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<u32> for FieldValue<'_> {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<bool> for FieldValue<'_> {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        FieldValue::Text(value)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(value: &'a String) -> Self {
        FieldValue::Text(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        left: String,
        right: i64,
    }

    impl Identifiable for Pair {
        fn fields(&self) -> Vec<FieldEntry<'_>> {
            vec![
                FieldEntry::marked("left", (&self.left).into()),
                FieldEntry::unmarked("right", self.right.into()),
            ]
        }
    }

    #[test]
    fn test_marked_and_unmarked_entries() {
        let pair = Pair {
            left: "a".to_string(),
            right: 1,
        };
        let fields = pair.fields();
        assert!(fields[0].is_marked());
        assert!(!fields[1].is_marked());
        assert_eq!(fields[0].marker, Some(Marker { sub_fields: None }));
    }

    #[test]
    fn test_restricted_entry_carries_sub_fields() {
        let pair = Pair {
            left: "a".to_string(),
            right: 1,
        };
        let entry = FieldEntry::restricted("pair", FieldValue::nested(&pair), &["left"]);
        assert_eq!(
            entry.marker.and_then(|m| m.sub_fields),
            Some(&["left"][..])
        );
        assert_eq!(entry.value.kind(), "nested");
    }

    #[test]
    fn test_optional_helpers_map_none_to_absent() {
        assert_eq!(FieldValue::optional_text(None).kind(), "absent");
        assert_eq!(FieldValue::optional_nested::<Pair>(None).kind(), "absent");
        assert!(matches!(FieldValue::fixed(1.5), FieldValue::Integer(1500)));
    }
}
