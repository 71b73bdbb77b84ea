//! Schema engines
//!
//! The lineage core never interprets schema definitions itself. It hands each
//! [`SchemaDefinition`] to a [`SchemaEngine`], which compiles it into a
//! [`SchemaHandle`] able to validate values, move them one step along the
//! lineage, and check static type bindings.
//!
//! [`JsonSchemaEngine`] is the bundled engine: JSON Schema validation plus
//! declarative [`Lens`](crate::lens::Lens) translation.

mod descriptor;
mod json_schema;

use std::fmt;

use serde_json::Value;

use crate::compatibility::CompatibilityResult;
use crate::error::{BindError, LensError, Result, ValidationError};
use crate::lacuna::Lacuna;
use crate::lens::Lens;
use crate::schema::SchemaDefinition;

pub use descriptor::{FieldShape, TypeDescriptor};
pub use json_schema::JsonSchemaEngine;

/// Compiles schema definitions into handles
pub trait SchemaEngine: Send + Sync + fmt::Debug {
    /// Engine name, used in log output
    fn name(&self) -> &'static str;

    /// Compile one schema node
    ///
    /// `outgoing` is the lens declared by the node's successor, absent for
    /// the latest schema.
    fn compile(
        &self,
        definition: &SchemaDefinition,
        outgoing: Option<&Lens>,
    ) -> Result<Box<dyn SchemaHandle>>;

    /// Diff two adjacent definitions for bind-time evolution checks
    ///
    /// Engines that cannot tell return `None` and the checks are skipped.
    fn compatibility(
        &self,
        _old: &SchemaDefinition,
        _new: &SchemaDefinition,
        _strict: bool,
    ) -> Option<CompatibilityResult> {
        None
    }
}

/// A compiled schema node
pub trait SchemaHandle: Send + Sync + fmt::Debug {
    fn validate(&self, value: &Value) -> std::result::Result<(), ValidationError>;

    /// Restate a value of this schema in its successor's shape
    fn translate_one_step(
        &self,
        value: &Value,
    ) -> std::result::Result<(Value, Vec<Lacuna>), LensError>;

    /// Whether [`translate_one_step_back`](Self::translate_one_step_back) is defined
    fn can_translate_back(&self) -> bool;

    /// Restate a value of the successor's shape in this schema
    ///
    /// Fields this schema cannot hold are dropped and reported as lacunas.
    fn translate_one_step_back(
        &self,
        value: &Value,
    ) -> std::result::Result<(Value, Vec<Lacuna>), LensError>;

    /// Check that a type with the described structure can hold this schema's values
    fn bind_type(&self, ty: &TypeDescriptor) -> std::result::Result<(), BindError>;
}
