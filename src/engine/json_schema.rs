//! JSON Schema engine
//!
//! Validation is delegated to the `jsonschema` crate; translation applies the
//! lens declared by the successor schema.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use super::{FieldShape, SchemaEngine, SchemaHandle, TypeDescriptor};
use crate::compatibility::{CompatibilityChecker, CompatibilityResult};
use crate::error::{BindError, LensError, LineageError, Result, ValidationError, Violation};
use crate::lacuna::{Lacuna, LacunaKind};
use crate::lens::{apply_ops, Lens, LensOp};
use crate::schema::SchemaDefinition;

/// Engine for lineages whose schemas are JSON Schema documents
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaEngine {
    /// Draft to compile against; detected from `$schema` when unset
    draft: Option<Draft>,
}

impl JsonSchemaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = Some(draft);
        self
    }
}

impl SchemaEngine for JsonSchemaEngine {
    fn name(&self) -> &'static str {
        "json-schema"
    }

    fn compile(
        &self,
        definition: &SchemaDefinition,
        outgoing: Option<&Lens>,
    ) -> Result<Box<dyn SchemaHandle>> {
        let mut options = JSONSchema::options();
        if let Some(draft) = self.draft {
            options.with_draft(draft);
        }
        let validator = options
            .compile(&definition.schema)
            .map_err(|e| LineageError::InvalidSchema {
                version: definition.version,
                reason: e.to_string(),
            })?;

        Ok(Box::new(JsonSchemaHandle {
            validator,
            content: definition.schema.clone(),
            forward: outgoing.map(|lens| lens.forward.clone()),
            reverse: outgoing.and_then(Lens::reverse_ops),
        }))
    }

    fn compatibility(
        &self,
        old: &SchemaDefinition,
        new: &SchemaDefinition,
        strict: bool,
    ) -> Option<CompatibilityResult> {
        let checker = if strict {
            CompatibilityChecker::new().strict()
        } else {
            CompatibilityChecker::new()
        };
        Some(checker.check(&old.schema, &new.schema))
    }
}

struct JsonSchemaHandle {
    validator: JSONSchema,
    content: Value,
    /// Ops restating a value in the successor's shape; `None` for the latest schema
    forward: Option<Vec<LensOp>>,
    /// Ops restating a successor value in this shape, when an inverse exists
    reverse: Option<Vec<LensOp>>,
}

impl fmt::Debug for JsonSchemaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaHandle")
            .field("content", &self.content)
            .field("forward", &self.forward)
            .field("reverse", &self.reverse)
            .finish_non_exhaustive()
    }
}

impl SchemaHandle for JsonSchemaHandle {
    fn validate(&self, value: &Value) -> std::result::Result<(), ValidationError> {
        let Err(errors) = self.validator.validate(value) else {
            return Ok(());
        };

        let mut violations: Vec<Violation> = errors
            .map(|e| Violation {
                path: e.instance_path.to_string(),
                reason: e.to_string(),
            })
            .collect();
        if violations.is_empty() {
            violations.push(Violation {
                path: String::new(),
                reason: "rejected by schema".to_string(),
            });
        }
        Err(ValidationError::from_violations(violations))
    }

    fn translate_one_step(
        &self,
        value: &Value,
    ) -> std::result::Result<(Value, Vec<Lacuna>), LensError> {
        match &self.forward {
            Some(ops) => apply_ops(ops, value),
            None => Err(LensError::new("", "schema has no successor")),
        }
    }

    fn can_translate_back(&self) -> bool {
        self.reverse.is_some()
    }

    fn translate_one_step_back(
        &self,
        value: &Value,
    ) -> std::result::Result<(Value, Vec<Lacuna>), LensError> {
        let Some(ops) = &self.reverse else {
            return Err(LensError::new("", "lens has no inverse"));
        };
        let (mut out, mut lacunas) = apply_ops(ops, value)?;
        drop_undeclared(&self.content, &mut out, "", &mut lacunas);
        Ok((out, lacunas))
    }

    fn bind_type(&self, ty: &TypeDescriptor) -> std::result::Result<(), BindError> {
        check_object(&self.content, ty.fields(), "", ty.type_name())
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn declared_types(prop: &Value) -> Option<Vec<&str>> {
    match prop.get("type")? {
        Value::String(s) => Some(vec![s.as_str()]),
        Value::Array(types) => Some(types.iter().filter_map(Value::as_str).collect()),
        _ => None,
    }
}

/// Remove properties a closed object schema does not declare
///
/// Fields a successor added in a compatible bump have no place in a closed
/// predecessor, so stepping back drops them. Open objects keep them.
fn drop_undeclared(schema: &Value, value: &mut Value, path: &str, lacunas: &mut Vec<Lacuna>) {
    let Value::Object(map) = value else {
        return;
    };
    let properties = schema.get("properties").and_then(Value::as_object);

    if schema.get("additionalProperties") == Some(&Value::Bool(false)) {
        let undeclared: Vec<String> = map
            .keys()
            .filter(|name| !properties.map_or(false, |p| p.contains_key(name.as_str())))
            .cloned()
            .collect();
        for name in undeclared {
            if let Some(old) = map.remove(&name) {
                lacunas.push(Lacuna::new(
                    LacunaKind::FieldDropped,
                    join(path, &name),
                    format!("value {} is not declared by the earlier schema", old),
                ));
            }
        }
    }

    for (name, prop) in properties.into_iter().flatten() {
        if let Some(inner) = map.get_mut(name) {
            drop_undeclared(prop, inner, &join(path, name), lacunas);
        }
    }
}

/// Check a type's fields against an object schema
///
/// Required properties must exist on the type with an accepted shape.
/// Optional properties may be absent, since `skip_serializing_if` hides them
/// from the sample. Extra fields are rejected only when the schema closes the
/// object with `additionalProperties: false`.
fn check_object(
    schema: &Value,
    fields: &BTreeMap<String, FieldShape>,
    path: &str,
    type_name: &str,
) -> std::result::Result<(), BindError> {
    let mismatch = |path: String, reason: String| BindError::Structure {
        type_name: type_name.to_string(),
        path,
        reason,
    };

    let properties = schema.get("properties").and_then(Value::as_object);
    let required: HashSet<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    for (name, prop) in properties.into_iter().flatten() {
        let field_path = join(path, name);
        let Some(shape) = fields.get(name) else {
            if required.contains(name.as_str()) {
                return Err(mismatch(
                    field_path,
                    "is required by the schema but missing from the type".to_string(),
                ));
            }
            continue;
        };

        if let Some(types) = declared_types(prop) {
            if !types.iter().any(|t| shape.accepts(t)) {
                return Err(mismatch(
                    field_path,
                    format!(
                        "is {} in the type but {} in the schema",
                        shape.name(),
                        types.join(" | ")
                    ),
                ));
            }
        }
        if let FieldShape::Object(inner) = shape {
            check_object(prop, inner, &field_path, type_name)?;
        }
    }

    if schema.get("additionalProperties") == Some(&Value::Bool(false)) {
        for name in fields.keys() {
            if !properties.map_or(false, |p| p.contains_key(name)) {
                return Err(mismatch(join(path, name), "is not declared by the schema".to_string()));
            }
        }
    }

    Ok(())
}
