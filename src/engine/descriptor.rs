//! Structural descriptions of concrete Rust types
//!
//! Binding a type to a schema happens once, when a convergent lineage is
//! built. The descriptor is derived from a serialized sample of the type, so
//! it reflects exactly what the type's `Serialize` impl produces.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::BindError;

/// The JSON shape of one field of a sample value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    /// The sample held `null` (typically an `Option` that was `None`)
    Unknown,
    Bool,
    Integer,
    Number,
    String,
    Array,
    Object(BTreeMap<String, FieldShape>),
}

impl FieldShape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => FieldShape::Unknown,
            Value::Bool(_) => FieldShape::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => FieldShape::Integer,
            Value::Number(_) => FieldShape::Number,
            Value::String(_) => FieldShape::String,
            Value::Array(_) => FieldShape::Array,
            Value::Object(map) => FieldShape::Object(
                map.iter().map(|(k, v)| (k.clone(), FieldShape::of(v))).collect(),
            ),
        }
    }

    /// Whether a field of this shape can hold values of JSON Schema `type`
    pub fn accepts(&self, json_type: &str) -> bool {
        match self {
            FieldShape::Unknown => true,
            FieldShape::Bool => json_type == "boolean",
            FieldShape::Integer => json_type == "integer" || json_type == "number",
            FieldShape::Number => json_type == "number",
            FieldShape::String => json_type == "string",
            FieldShape::Array => json_type == "array",
            FieldShape::Object(_) => json_type == "object",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldShape::Unknown => "unknown",
            FieldShape::Bool => "boolean",
            FieldShape::Integer => "integer",
            FieldShape::Number => "number",
            FieldShape::String => "string",
            FieldShape::Array => "array",
            FieldShape::Object(_) => "object",
        }
    }
}

/// Field names and shapes of a concrete type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    type_name: String,
    fields: BTreeMap<String, FieldShape>,
}

impl TypeDescriptor {
    /// Describe `T` from its default value
    pub fn of<T: Serialize + Default>() -> Result<Self, BindError> {
        Self::from_sample(&T::default())
    }

    /// Describe `T` from a caller-provided sample
    pub fn from_sample<T: Serialize + ?Sized>(sample: &T) -> Result<Self, BindError> {
        let type_name = std::any::type_name::<T>().to_string();
        let value = serde_json::to_value(sample).map_err(|e| BindError::Structure {
            type_name: type_name.clone(),
            path: String::new(),
            reason: format!("cannot be serialized: {}", e),
        })?;

        match FieldShape::of(&value) {
            FieldShape::Object(fields) => Ok(Self { type_name, fields }),
            _ => Err(BindError::NotAnObject { type_name }),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldShape> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldShape> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Default)]
    struct Sample {
        name: String,
        count: u32,
        ratio: f64,
        tags: Vec<String>,
        nested: Inner,
        maybe: Option<bool>,
    }

    #[derive(Serialize, Default)]
    struct Inner {
        flag: bool,
    }

    #[test]
    fn test_describe_from_default() {
        let desc = TypeDescriptor::of::<Sample>().unwrap();
        assert!(desc.type_name().ends_with("Sample"));
        assert_eq!(desc.field("name"), Some(&FieldShape::String));
        assert_eq!(desc.field("count"), Some(&FieldShape::Integer));
        assert_eq!(desc.field("ratio"), Some(&FieldShape::Number));
        assert_eq!(desc.field("tags"), Some(&FieldShape::Array));
        assert_eq!(desc.field("maybe"), Some(&FieldShape::Unknown));
        match desc.field("nested") {
            Some(FieldShape::Object(inner)) => {
                assert_eq!(inner.get("flag"), Some(&FieldShape::Bool))
            }
            other => panic!("Expected nested object, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = TypeDescriptor::from_sample(&42u8).unwrap_err();
        assert!(matches!(err, BindError::NotAnObject { .. }));
    }

    #[test]
    fn test_shape_acceptance() {
        assert!(FieldShape::Integer.accepts("number"));
        assert!(!FieldShape::Number.accepts("integer"));
        assert!(FieldShape::Unknown.accepts("string"));
        assert!(!FieldShape::String.accepts("boolean"));
    }
}
