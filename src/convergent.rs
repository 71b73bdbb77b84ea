//! Binding concrete Rust types to schema versions
//!
//! A type is bound to one schema once, up front. The structural check runs
//! against a [`TypeDescriptor`] of the type, so converting values later never
//! has to rediscover the type's shape.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::endec::Endec;
use crate::engine::TypeDescriptor;
use crate::error::{BindError, Result};
use crate::lineage::Lineage;
use crate::mux::{new_typed_mux, new_value_mux, TypedMux, ValueMux};
use crate::schema::Schema;
use crate::version::SyntacticVersion;

/// Types that can be bound to a schema
pub trait Assignee: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Assignee for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// A schema whose values are known to convert into `T`
pub struct TypedSchema<T> {
    schema: Schema,
    type_name: String,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedSchema<T> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            type_name: self.type_name.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypedSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSchema")
            .field("schema", &self.schema)
            .field("type", &self.type_name)
            .finish()
    }
}

/// Bind `T` to a schema, describing it from `T::default()`
pub fn bind_type<T: Assignee + Default>(schema: &Schema) -> Result<TypedSchema<T>> {
    bind_type_with(schema, &T::default())
}

/// Bind `T` to a schema, describing it from a sample value
///
/// Use this when `T` has no meaningful default, or when optional fields of
/// the default would be skipped during serialization.
pub fn bind_type_with<T: Assignee>(schema: &Schema, sample: &T) -> Result<TypedSchema<T>> {
    let descriptor = TypeDescriptor::from_sample(sample)?;
    schema.handle().bind_type(&descriptor)?;
    debug!(schema = %schema, ty = descriptor.type_name(), "Bound type to schema");
    Ok(TypedSchema {
        schema: schema.clone(),
        type_name: descriptor.type_name().to_string(),
        _type: PhantomData,
    })
}

impl<T: Assignee> TypedSchema<T> {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn version(&self) -> SyntacticVersion {
        self.schema.version()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Convert a value already valid for this schema into `T`
    pub fn convert(&self, value: &Value) -> std::result::Result<T, BindError> {
        T::deserialize(value).map_err(|e| BindError::Conversion {
            type_name: self.type_name.clone(),
            version: self.version(),
            reason: e.to_string(),
        })
    }

    /// Serialize `T` into the map form of this schema's values
    pub fn to_map(&self, typed: &T) -> std::result::Result<Map<String, Value>, BindError> {
        match serde_json::to_value(typed) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(BindError::NotAnObject {
                type_name: self.type_name.clone(),
            }),
            Err(e) => Err(BindError::Conversion {
                type_name: self.type_name.clone(),
                version: self.version(),
                reason: e.to_string(),
            }),
        }
    }
}

/// A lineage with one version bound to `T`
///
/// Every typed value obtained through it is translated to that version first.
pub struct ConvergentLineage<T> {
    lineage: Lineage,
    typed: TypedSchema<T>,
}

impl<T> Clone for ConvergentLineage<T> {
    fn clone(&self) -> Self {
        Self {
            lineage: self.lineage.clone(),
            typed: self.typed.clone(),
        }
    }
}

impl<T> fmt::Debug for ConvergentLineage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvergentLineage")
            .field("lineage", &self.lineage.name())
            .field("bound", &self.typed)
            .finish()
    }
}

impl<T: Assignee> ConvergentLineage<T> {
    /// Bind `T` to `version`, describing it from `T::default()`
    pub fn bind(lineage: &Lineage, version: SyntacticVersion) -> Result<Self>
    where
        T: Default,
    {
        Self::bind_with(lineage, version, &T::default())
    }

    pub fn bind_with(lineage: &Lineage, version: SyntacticVersion, sample: &T) -> Result<Self> {
        let schema = lineage.schema(version)?;
        Ok(Self {
            lineage: lineage.clone(),
            typed: bind_type_with(&schema, sample)?,
        })
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn typed_schema(&self) -> &TypedSchema<T> {
        &self.typed
    }

    pub fn version(&self) -> SyntacticVersion {
        self.typed.version()
    }

    pub fn typed_mux<E: Endec + 'static>(&self, endec: E) -> TypedMux<T> {
        new_typed_mux(&self.typed, endec)
    }

    pub fn value_mux<E: Endec + 'static>(&self, endec: E) -> ValueMux<T> {
        new_value_mux(&self.typed, endec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LineageError;
    use crate::lineage::LineageOptions;
    use crate::version::sv;
    use serde::Deserialize;
    use serde_json::json;

    fn lineage() -> Lineage {
        Lineage::from_json_str(
            &json!({
                "name": "counter",
                "schemas": [{
                    "version": [0, 0],
                    "schema": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "count": {"type": "integer"},
                            "note": {"type": "string"}
                        },
                        "required": ["name", "count"],
                        "additionalProperties": false
                    }
                }]
            })
            .to_string(),
            LineageOptions::default(),
        )
        .unwrap()
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        name: String,
        count: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Renamed {
        label: String,
        count: i64,
    }

    #[test]
    fn test_bind_and_convert() {
        let typed = bind_type::<Counter>(&lineage().first()).unwrap();
        assert!(typed.type_name().ends_with("Counter"));

        let counter = typed.convert(&json!({"name": "a", "count": 2})).unwrap();
        assert_eq!(counter, Counter { name: "a".into(), count: 2, note: None });

        let map = typed.to_map(&counter).unwrap();
        assert_eq!(Value::Object(map), json!({"name": "a", "count": 2}));
    }

    #[test]
    fn test_bind_mismatch_fails_at_construction() {
        match ConvergentLineage::<Renamed>::bind(&lineage(), sv(0, 0)) {
            Err(LineageError::Bind(BindError::Structure { path, .. })) => assert_eq!(path, "name"),
            other => panic!("Expected structure mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_unknown_version() {
        let err = ConvergentLineage::<Counter>::bind(&lineage(), sv(1, 0)).unwrap_err();
        assert!(matches!(err, LineageError::NotFound { .. }));
    }

    #[test]
    fn test_convert_failure_is_conversion_error() {
        let convergent = ConvergentLineage::<Counter>::bind(&lineage(), sv(0, 0)).unwrap();
        assert_eq!(convergent.version(), sv(0, 0));
        let err = convergent
            .typed_schema()
            .convert(&json!({"name": "a", "count": "many"}))
            .unwrap_err();
        assert!(matches!(err, BindError::Conversion { .. }));
    }
}
