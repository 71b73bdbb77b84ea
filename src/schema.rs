//! Schema definitions and schema handles

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checksum::Checksum;
use crate::engine::SchemaHandle;
use crate::error::{TranslationError, ValidationError};
use crate::lacuna::TranslationLacunas;
use crate::lens::Lens;
use crate::lineage::Lineage;
use crate::search::{self, SearchCriterion};
use crate::translate;
use crate::version::SyntacticVersion;

/// Source form of one schema in a lineage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub version: SyntacticVersion,
    /// The schema document, as understood by the lineage's engine
    pub schema: Value,
    /// How values of the predecessor are restated in this schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<Lens>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaDefinition {
    pub fn new(version: SyntacticVersion, schema: Value) -> Self {
        Self {
            version,
            schema,
            lens: None,
            description: None,
        }
    }

    pub fn with_lens(mut self, lens: Lens) -> Self {
        self.lens = Some(lens);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checksum of the schema document
    pub fn checksum(&self) -> Checksum {
        Checksum::of_json(&self.schema)
    }
}

/// One schema within a [`Lineage`]
///
/// A cheap handle: cloning it shares the lineage.
#[derive(Clone)]
pub struct Schema {
    lineage: Lineage,
    index: usize,
}

impl Schema {
    pub(crate) fn new(lineage: Lineage, index: usize) -> Self {
        debug_assert!(index < lineage.nodes().len());
        Self { lineage, index }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn handle(&self) -> &dyn SchemaHandle {
        self.lineage.nodes()[self.index].handle.as_ref()
    }

    pub fn version(&self) -> SyntacticVersion {
        self.definition().version
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn definition(&self) -> &SchemaDefinition {
        &self.lineage.nodes()[self.index].definition
    }

    pub fn checksum(&self) -> &Checksum {
        &self.lineage.nodes()[self.index].checksum
    }

    /// The next schema in the lineage, `None` for the latest
    pub fn successor(&self) -> Option<Schema> {
        (self.index + 1 < self.lineage.nodes().len())
            .then(|| Schema::new(self.lineage.clone(), self.index + 1))
    }

    /// The previous schema in the lineage, `None` for the first
    pub fn predecessor(&self) -> Option<Schema> {
        self.index
            .checked_sub(1)
            .map(|index| Schema::new(self.lineage.clone(), index))
    }

    pub fn is_latest(&self) -> bool {
        self.index + 1 == self.lineage.nodes().len()
    }

    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.handle()
            .validate(value)
            .map_err(|e| e.at(self.version()))
    }

    /// Validate a value and pair it with this schema
    pub fn instance(&self, value: Value) -> Result<Instance, ValidationError> {
        self.validate(&value)?;
        Ok(Instance {
            schema: self.clone(),
            value,
        })
    }

    /// Restate a value of this schema in its successor's schema
    pub fn translate_forward(
        &self,
        value: &Value,
    ) -> Result<(Value, TranslationLacunas), TranslationError> {
        if self.is_latest() {
            return Err(TranslationError::NoSuccessor {
                version: self.version(),
            });
        }
        let mut lacunas = TranslationLacunas::new();
        let out = translate::step_forward(&self.lineage, self.index, value, &mut lacunas)?;
        Ok((out, lacunas))
    }

    /// Search forward from this schema
    pub fn find(&self, criterion: SearchCriterion) -> Option<Schema> {
        search::find(self, criterion)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.lineage.same_as(&other.lineage)
    }
}

impl Eq for Schema {}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("lineage", &self.lineage.name())
            .field("version", &self.version())
            .finish()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.lineage.name(), self.version())
    }
}

/// A value known to conform to a particular schema
#[derive(Debug, Clone)]
pub struct Instance {
    schema: Schema,
    value: Value,
}

impl Instance {
    /// Pair a value with a schema that has already accepted it
    pub(crate) fn validated(schema: Schema, value: Value) -> Self {
        Self { schema, value }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn version(&self) -> SyntacticVersion {
        self.schema.version()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Translate to another version of the same lineage
    pub fn translate(
        &self,
        to: SyntacticVersion,
    ) -> Result<(Instance, TranslationLacunas), TranslationError> {
        let lineage = self.schema.lineage();
        let target = lineage
            .index_of(to)
            .ok_or_else(|| TranslationError::VersionNotFound {
                lineage: lineage.name().to_string(),
                version: to,
            })?;

        let (value, lacunas) =
            translate::translate_validated(lineage, &self.value, self.schema.index(), target)?;
        Ok((
            Instance {
                schema: Schema::new(lineage.clone(), target),
                value,
            },
            lacunas,
        ))
    }
}
