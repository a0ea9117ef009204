//! Field schemas describing the shape of a collection's documents.

use indexmap::IndexMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::errors::{ErrorKind, ReldocError, ReldocResult};

/// The declared type of a schema field.
///
/// Used only to pick a physical column type during reconciliation; it is
/// not persisted separately. The mapping is exhaustive by construction,
/// so adding a variant is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    DateTime,
    Mixed,
    Object,
    Reference,
}

impl FieldType {
    /// The physical column type for this field type.
    pub fn column_type(&self) -> &'static str {
        match self {
            FieldType::DateTime => "TIMESTAMP",
            FieldType::Mixed | FieldType::Object => "JSON",
            FieldType::Number => "INTEGER",
            FieldType::Reference => "VARCHAR(255)",
            FieldType::String => "VARCHAR(255)",
        }
    }
}

impl FromStr for FieldType {
    type Err = ReldocError;

    fn from_str(s: &str) -> ReldocResult<Self> {
        match s {
            "String" => Ok(FieldType::String),
            "Number" => Ok(FieldType::Number),
            "DateTime" => Ok(FieldType::DateTime),
            "Mixed" => Ok(FieldType::Mixed),
            "Object" => Ok(FieldType::Object),
            "Reference" => Ok(FieldType::Reference),
            other => {
                log::error!("Unknown schema field type: {}", other);
                Err(ReldocError::new(
                    &format!("Unknown schema field type: {}", other),
                    ErrorKind::SchemaError,
                ))
            }
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::DateTime => "DateTime",
            FieldType::Mixed => "Mixed",
            FieldType::Object => "Object",
            FieldType::Reference => "Reference",
        };
        write!(f, "{}", name)
    }
}

/// Declaration of a single schema field: its type and whether the
/// physical column carries a NOT NULL constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(field_type: FieldType) -> Self {
        FieldSpec {
            field_type,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Ordered mapping from field name to [FieldSpec].
///
/// Supplied by the caller per operation; immutable during the call and
/// never persisted by this crate. Schema reconciliation makes the backing
/// table's columns a superset of these fields, additively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    fields: IndexMap<String, FieldSpec>,
}

impl FieldSchema {
    pub fn new() -> Self {
        FieldSchema {
            fields: IndexMap::new(),
        }
    }

    /// Adds a field declaration, replacing any previous declaration for
    /// the same name.
    pub fn field(mut self, name: &str, spec: FieldSpec) -> Self {
        self.fields.insert(name.to_string(), spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSpec)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
