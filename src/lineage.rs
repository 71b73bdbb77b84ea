//! Lineages: ordered, immutable families of schema versions
//!
//! A lineage is built once from a [`LineageSource`] and never changes
//! afterwards. Its schemas live in one version-ordered vector, so a
//! [`Schema`] handle is just the lineage plus an index.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::checksum::Checksum;
use crate::engine::{JsonSchemaEngine, SchemaEngine, SchemaHandle};
use crate::error::{ConfigError, LineageError, ResolutionError, Result};
use crate::lacuna::TranslationLacunas;
use crate::lens::Lens;
use crate::resolve;
use crate::schema::{Schema, SchemaDefinition};
use crate::search::{self, SearchCriterion};
use crate::translate;
use crate::version::SyntacticVersion;

/// Options fixed when a lineage is loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageOptions {
    /// Allow translating values to older versions
    pub reverse_translation: bool,
    /// Skip the check that every major bump actually breaks compatibility.
    ///
    /// The check relies on a structural diff that cannot see semantic breaks
    /// (a changed default, for one), so lineages may need to opt out of it.
    /// Nothing else is skipped: version sequencing, schema compilation and
    /// value validation all still apply.
    pub skip_buggy_checks: bool,
    /// Treat any change between adjacent schemas as breaking
    pub strict_compatibility: bool,
}

impl LineageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reverse_translation(mut self) -> Self {
        self.reverse_translation = true;
        self
    }

    pub fn with_skip_buggy_checks(mut self) -> Self {
        self.skip_buggy_checks = true;
        self
    }

    pub fn with_strict_compatibility(mut self) -> Self {
        self.strict_compatibility = true;
        self
    }

    /// Reject contradictory combinations
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.strict_compatibility && self.skip_buggy_checks {
            return Err(ConfigError::InvalidBindOptions(
                "strict_compatibility and skip_buggy_checks cannot be combined".to_string(),
            ));
        }
        Ok(())
    }
}

/// Source document a lineage is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageSource {
    pub name: String,
    /// Oldest first
    pub schemas: Vec<SchemaDefinition>,
}

impl LineageSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schemas: Vec::new(),
        }
    }

    pub fn with_schema(mut self, definition: SchemaDefinition) -> Self {
        self.schemas.push(definition);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

pub(crate) struct Node {
    pub(crate) definition: SchemaDefinition,
    pub(crate) handle: Box<dyn SchemaHandle>,
    pub(crate) checksum: Checksum,
}

struct LineageInner {
    name: String,
    nodes: Vec<Node>,
    options: LineageOptions,
    fingerprint: Checksum,
}

/// An immutable, shareable lineage of schemas
#[derive(Clone)]
pub struct Lineage {
    inner: Arc<LineageInner>,
}

/// Build a lineage from its source, checking every lineage invariant
pub fn load_lineage(
    source: &LineageSource,
    engine: &dyn SchemaEngine,
    options: LineageOptions,
) -> Result<Lineage> {
    options.validate()?;

    let name = source.name.trim();
    if name.is_empty() {
        return Err(LineageError::invalid_lineage("", "lineage name must not be empty"));
    }

    let first = source
        .schemas
        .first()
        .ok_or_else(|| LineageError::invalid_lineage(name, "lineage contains no schemas"))?;
    if first.version != SyntacticVersion::default() {
        return Err(LineageError::invalid_lineage(
            name,
            format!("first schema must be version 0.0, found {}", first.version),
        ));
    }
    if first.lens.is_some() {
        return Err(LineageError::invalid_lineage(
            name,
            "the first schema has no predecessor and cannot declare a lens",
        ));
    }

    for pair in source.schemas.windows(2) {
        check_succession(name, &pair[0], &pair[1], engine, &options)?;
    }

    let identity = Lens::default();
    let mut nodes = Vec::with_capacity(source.schemas.len());
    for (i, definition) in source.schemas.iter().enumerate() {
        let outgoing = source
            .schemas
            .get(i + 1)
            .map(|next| next.lens.as_ref().unwrap_or(&identity));
        nodes.push(Node {
            handle: engine.compile(definition, outgoing)?,
            checksum: definition.checksum(),
            definition: definition.clone(),
        });
    }

    let fingerprint = Checksum::combine(nodes.iter().map(|n| &n.checksum));
    debug!(
        lineage = name,
        engine = engine.name(),
        schemas = nodes.len(),
        latest = %source.schemas[source.schemas.len() - 1].version,
        fingerprint = fingerprint.short(),
        "Lineage loaded"
    );

    Ok(Lineage {
        inner: Arc::new(LineageInner {
            name: name.to_string(),
            nodes,
            options,
            fingerprint,
        }),
    })
}

fn check_succession(
    name: &str,
    prev: &SchemaDefinition,
    next: &SchemaDefinition,
    engine: &dyn SchemaEngine,
    options: &LineageOptions,
) -> Result<()> {
    if !next.version.follows(&prev.version) {
        return Err(LineageError::invalid_lineage(
            name,
            format!(
                "version {} cannot follow {}: expected {} or {}",
                next.version,
                prev.version,
                prev.version.next_minor(),
                prev.version.next_major()
            ),
        ));
    }

    let major = next.version.is_major_bump_from(&prev.version);
    if major && next.lens.is_none() {
        return Err(LineageError::invalid_lineage(
            name,
            format!("major version {} must declare a lens from {}", next.version, prev.version),
        ));
    }

    if prev.checksum() == next.checksum() {
        warn!(lineage = name, version = %next.version, "Schema is identical to its predecessor");
    }

    let Some(result) = engine.compatibility(prev, next, options.strict_compatibility) else {
        return Ok(());
    };

    if !major && result.is_breaking {
        let details = result.breaking_descriptions();
        return Err(LineageError::invalid_lineage(
            name,
            format!(
                "minor version {} breaks compatibility with {}: {}{}",
                next.version,
                prev.version,
                result.summary,
                if details.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", details.join("; "))
                }
            ),
        ));
    }

    if major && !result.is_breaking {
        if options.skip_buggy_checks {
            debug!(
                lineage = name,
                version = %next.version,
                "Major version has no detectable breaking change; check skipped"
            );
        } else {
            return Err(LineageError::invalid_lineage(
                name,
                format!(
                    "major version {} introduces no breaking change from {}; \
                     declare it as {} instead",
                    next.version,
                    prev.version,
                    prev.version.next_minor()
                ),
            ));
        }
    }

    Ok(())
}

impl Lineage {
    /// Build a lineage of JSON Schemas from its JSON source document
    pub fn from_json_str(json: &str, options: LineageOptions) -> Result<Self> {
        let source = LineageSource::from_json_str(json)?;
        load_lineage(&source, &JsonSchemaEngine::new(), options)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn options(&self) -> &LineageOptions {
        &self.inner.options
    }

    /// Combined checksum of every schema, oldest first
    pub fn fingerprint(&self) -> &Checksum {
        &self.inner.fingerprint
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.inner.nodes
    }

    pub(crate) fn same_as(&self, other: &Lineage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn index_of(&self, version: SyntacticVersion) -> Option<usize> {
        self.inner
            .nodes
            .binary_search_by_key(&version, |n| n.definition.version)
            .ok()
    }

    pub fn schema_count(&self) -> usize {
        self.inner.nodes.len()
    }

    /// The oldest schema, version 0.0
    pub fn first(&self) -> Schema {
        Schema::new(self.clone(), 0)
    }

    pub fn latest(&self) -> Schema {
        Schema::new(self.clone(), self.inner.nodes.len() - 1)
    }

    /// The schema with exactly this version
    pub fn schema(&self, version: SyntacticVersion) -> Result<Schema> {
        self.index_of(version)
            .map(|index| Schema::new(self.clone(), index))
            .ok_or_else(|| LineageError::NotFound {
                lineage: self.name().to_string(),
                version,
            })
    }

    /// Every schema, oldest first
    pub fn iter(&self) -> impl Iterator<Item = Schema> + '_ {
        (0..self.inner.nodes.len()).map(move |index| Schema::new(self.clone(), index))
    }

    pub fn versions(&self) -> Vec<SyntacticVersion> {
        self.inner.nodes.iter().map(|n| n.definition.version).collect()
    }

    /// Search the whole lineage
    pub fn find(&self, criterion: SearchCriterion) -> Option<Schema> {
        search::find(&self.first(), criterion)
    }

    /// Find the newest schema the value conforms to
    pub fn search_and_validate(
        &self,
        value: &Value,
    ) -> std::result::Result<Schema, ResolutionError> {
        resolve::search_and_validate(&self.first(), value)
    }

    /// Translate a value of version `from` into version `to`
    pub fn translate(
        &self,
        value: &Value,
        from: SyntacticVersion,
        to: SyntacticVersion,
    ) -> Result<(Value, TranslationLacunas)> {
        translate::translate(self, value, from, to)
    }
}

impl fmt::Debug for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lineage")
            .field("name", &self.inner.name)
            .field("versions", &self.versions())
            .field("options", &self.inner.options)
            .finish()
    }
}
