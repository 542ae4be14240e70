//! Entity schema definitions
//!
//! Supported field types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean
//! - date: calendar date, serialized as `YYYY-MM-DD`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field-name to value view of one entity.
///
/// Keys keep insertion order, so a record built in schema order serializes
/// in schema order.
pub type Record = Map<String, Value>;

/// Supported field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
    /// Calendar date
    Date,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float)
    }

    /// Whether values of `self` and `other` can be compared with each other.
    ///
    /// Numeric types are mutually comparable; every other type only compares
    /// with itself.
    pub fn is_comparable_with(&self, other: FieldType) -> bool {
        *self == other || (self.is_numeric() && other.is_numeric())
    }
}

/// A named, typed field of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// The ordered field set of one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Entity type name
    pub name: String,
    /// Field definitions, in serialization order
    pub fields: Vec<FieldDef>,
}

impl EntitySchema {
    /// Create an empty schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics if a field with the same name is already declared.
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        assert!(
            self.field(&name).is_none(),
            "duplicate field `{}` in schema `{}`",
            name,
            self.name
        );
        self.fields.push(FieldDef { name, field_type });
        self
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Type of the named field, if declared
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.field(name).map(|f| f.field_type)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}
