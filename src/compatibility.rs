//! Schema compatibility checking
//!
//! Diffs two adjacent JSON Schemas of a lineage and classifies each change as
//! breaking or compatible. Lineage construction uses the result to check that
//! minor bumps stay compatible and that major bumps actually break something.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a compatibility check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityResult {
    /// Whether this is a breaking change
    pub is_breaking: bool,
    /// List of changes detected
    pub changes: Vec<SchemaChange>,
    /// Summary of the compatibility check
    pub summary: String,
}

impl CompatibilityResult {
    fn from_changes(changes: Vec<SchemaChange>, strict: bool) -> Self {
        let breaking = changes.iter().filter(|c| c.is_breaking).count();
        let (is_breaking, summary) = if changes.is_empty() {
            (false, "No changes detected".to_string())
        } else if strict {
            (true, format!("Strict mode: {} changes detected", changes.len()))
        } else if breaking > 0 {
            (true, format!("{} breaking changes detected", breaking))
        } else {
            (false, format!("{} compatible changes detected", changes.len()))
        };
        Self {
            is_breaking,
            changes,
            summary,
        }
    }

    /// Descriptions of the breaking changes, for error messages
    pub fn breaking_descriptions(&self) -> Vec<&str> {
        self.changes
            .iter()
            .filter(|c| c.is_breaking)
            .map(|c| c.description.as_str())
            .collect()
    }
}

/// A detected change between schema versions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaChange {
    /// Type of change
    pub change_type: ChangeType,
    /// Path to the changed element (e.g., "properties.name.type")
    pub path: String,
    /// Old value (if applicable)
    pub old_value: Option<String>,
    /// New value (if applicable)
    pub new_value: Option<String>,
    /// Whether this change is breaking
    pub is_breaking: bool,
    /// Human-readable description
    pub description: String,
}

/// Type of schema change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// A new field was added
    FieldAdded,
    /// A field was removed
    FieldRemoved,
    /// A field's type changed
    TypeChanged,
    /// A field's optionality changed (required <-> optional)
    OptionalityChanged,
    /// Default value changed
    DefaultChanged,
    /// Enum variant added
    EnumVariantAdded,
    /// Enum variant removed
    EnumVariantRemoved,
    /// An enum constraint was introduced on a previously open value
    EnumIntroduced,
}

impl ChangeType {
    /// Check if this change type is typically breaking
    pub fn is_typically_breaking(&self) -> bool {
        matches!(
            self,
            ChangeType::FieldRemoved
                | ChangeType::TypeChanged
                | ChangeType::EnumVariantRemoved
                | ChangeType::EnumIntroduced
        )
    }
}

/// Compatibility checker for adjacent JSON Schemas
#[derive(Debug, Clone, Default)]
pub struct CompatibilityChecker {
    /// Strict mode - any change is considered breaking
    strict_mode: bool,
}

impl CompatibilityChecker {
    /// Create a new compatibility checker
    pub fn new() -> Self {
        Self { strict_mode: false }
    }

    /// Enable strict mode
    pub fn strict(mut self) -> Self {
        self.strict_mode = true;
        self
    }

    /// Check compatibility of `new` as a successor of `old`
    pub fn check(&self, old: &Value, new: &Value) -> CompatibilityResult {
        let mut changes = Vec::new();
        detect_changes(old, new, "", &mut changes);
        CompatibilityResult::from_changes(changes, self.strict_mode)
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}

fn required_set(schema: &Value) -> HashSet<&str> {
    schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default()
}

fn change(
    change_type: ChangeType,
    path: String,
    old_value: Option<&Value>,
    new_value: Option<&Value>,
    description: String,
) -> SchemaChange {
    SchemaChange {
        change_type,
        is_breaking: change_type.is_typically_breaking(),
        path,
        old_value: old_value.map(|v| v.to_string()),
        new_value: new_value.map(|v| v.to_string()),
        description,
    }
}

/// Detect changes between two (sub)schemas rooted at `path`
fn detect_changes(old: &Value, new: &Value, path: &str, changes: &mut Vec<SchemaChange>) {
    let label = if path.is_empty() { "<root>" } else { path };

    let old_type = old.get("type");
    let new_type = new.get("type");
    if old_type != new_type {
        changes.push(change(
            ChangeType::TypeChanged,
            join(path, "type"),
            old_type,
            new_type,
            format!("Type of '{}' changed", label),
        ));
    }

    let old_default = old.get("default");
    let new_default = new.get("default");
    if old_default != new_default {
        changes.push(change(
            ChangeType::DefaultChanged,
            join(path, "default"),
            old_default,
            new_default,
            format!("Default of '{}' changed", label),
        ));
    }

    detect_enum_changes(old, new, path, label, changes);
    detect_property_changes(old, new, path, changes);
}

fn detect_enum_changes(
    old: &Value,
    new: &Value,
    path: &str,
    label: &str,
    changes: &mut Vec<SchemaChange>,
) {
    let enum_path = join(path, "enum");
    match (
        old.get("enum").and_then(|e| e.as_array()),
        new.get("enum").and_then(|e| e.as_array()),
    ) {
        (Some(old_enum), Some(new_enum)) => {
            for removed in old_enum.iter().filter(|v| !new_enum.contains(v)) {
                changes.push(change(
                    ChangeType::EnumVariantRemoved,
                    enum_path.clone(),
                    Some(removed),
                    None,
                    format!("Enum variant {} of '{}' was removed", removed, label),
                ));
            }
            for added in new_enum.iter().filter(|v| !old_enum.contains(v)) {
                changes.push(change(
                    ChangeType::EnumVariantAdded,
                    enum_path.clone(),
                    None,
                    Some(added),
                    format!("Enum variant {} of '{}' was added", added, label),
                ));
            }
        }
        (None, Some(_)) => {
            changes.push(change(
                ChangeType::EnumIntroduced,
                enum_path,
                None,
                new.get("enum"),
                format!("Values of '{}' were restricted to an enum", label),
            ));
        }
        // Dropping an enum only widens the accepted values.
        (Some(_), None) => {
            changes.push(change(
                ChangeType::EnumVariantAdded,
                enum_path,
                old.get("enum"),
                None,
                format!("Enum restriction on '{}' was lifted", label),
            ));
        }
        (None, None) => {}
    }
}

fn detect_property_changes(old: &Value, new: &Value, path: &str, changes: &mut Vec<SchemaChange>) {
    let empty = serde_json::Map::new();
    let old_props = old.get("properties").and_then(|p| p.as_object()).unwrap_or(&empty);
    let new_props = new.get("properties").and_then(|p| p.as_object()).unwrap_or(&empty);
    let old_required = required_set(old);
    let new_required = required_set(new);

    // Check for removed properties
    for (name, old_prop) in old_props {
        if !new_props.contains_key(name) {
            changes.push(change(
                ChangeType::FieldRemoved,
                join(path, &format!("properties.{}", name)),
                Some(old_prop),
                None,
                format!("Property '{}' was removed", name),
            ));
        }
    }

    for (name, new_prop) in new_props {
        let prop_path = join(path, &format!("properties.{}", name));
        match old_props.get(name) {
            // Check for added properties
            None => {
                let required = new_required.contains(name.as_str());
                let mut added = change(
                    ChangeType::FieldAdded,
                    prop_path,
                    None,
                    Some(new_prop),
                    if required {
                        format!("Required property '{}' was added (breaking)", name)
                    } else {
                        format!("Optional property '{}' was added", name)
                    },
                );
                added.is_breaking = required;
                changes.push(added);
            }
            // Recurse into common properties
            Some(old_prop) => {
                let was_required = old_required.contains(name.as_str());
                let is_required = new_required.contains(name.as_str());
                if was_required != is_required {
                    let mut optionality = change(
                        ChangeType::OptionalityChanged,
                        prop_path.clone(),
                        None,
                        None,
                        if is_required {
                            format!("Property '{}' became required (breaking)", name)
                        } else {
                            format!("Property '{}' became optional", name)
                        },
                    );
                    optionality.is_breaking = is_required;
                    changes.push(optionality);
                }
                detect_changes(old_prop, new_prop, &prop_path, changes);
            }
        }
    }
}
