//! Declarative lenses between adjacent schema versions
//!
//! A lens is attached to the later of two adjacent schemas and lists the
//! operations that restate a value of the earlier schema in the later one.
//! Every operation that loses or invents information reports a [`Lacuna`].
//! Inverse operations are derived automatically where one exists; a lens may
//! also spell out its reverse explicitly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LensError;
use crate::lacuna::{Lacuna, LacunaKind};

/// One value substitution performed by [`LensOp::MapValues`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueMapping {
    pub from: Value,
    pub to: Value,
}

/// A single field-level operation
///
/// Field paths are dot-separated and address nested objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LensOp {
    /// Move a field to a new name
    Rename { from: String, to: String },
    /// Introduce a field, filling `default` when the input lacks it
    Add { field: String, default: Value },
    /// Discard a field; `default` makes the removal reversible
    Remove {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },
    /// Replace the old default value with the new one
    ChangeDefault { field: String, from: Value, to: Value },
    /// Substitute values; unmapped values become `fallback` when one is given
    MapValues {
        field: String,
        mapping: Vec<ValueMapping>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<Value>,
    },
}

impl LensOp {
    /// The operation undoing this one, if it has a defined inverse
    pub fn invert(&self) -> Option<LensOp> {
        match self {
            LensOp::Rename { from, to } => Some(LensOp::Rename {
                from: to.clone(),
                to: from.clone(),
            }),
            LensOp::Add { field, default } => Some(LensOp::Remove {
                field: field.clone(),
                default: Some(default.clone()),
            }),
            LensOp::Remove { field, default } => default.as_ref().map(|d| LensOp::Add {
                field: field.clone(),
                default: d.clone(),
            }),
            LensOp::ChangeDefault { field, from, to } => Some(LensOp::ChangeDefault {
                field: field.clone(),
                from: to.clone(),
                to: from.clone(),
            }),
            LensOp::MapValues { field, mapping, .. } => {
                let injective = mapping
                    .iter()
                    .enumerate()
                    .all(|(i, m)| mapping[i + 1..].iter().all(|other| other.to != m.to));
                injective.then(|| LensOp::MapValues {
                    field: field.clone(),
                    mapping: mapping
                        .iter()
                        .map(|m| ValueMapping {
                            from: m.to.clone(),
                            to: m.from.clone(),
                        })
                        .collect(),
                    fallback: None,
                })
            }
        }
    }

    fn apply(&self, root: &mut Value, lacunas: &mut Vec<Lacuna>) -> Result<(), LensError> {
        match self {
            LensOp::Rename { from, to } => {
                let Some(moved) = take(root, from)? else {
                    return Ok(());
                };
                let Some((map, leaf)) = parent_mut(root, to)? else {
                    return Err(LensError::new(to.as_str(), "rename target has no parent object"));
                };
                if let Some(clobbered) = map.insert(leaf.to_string(), moved) {
                    lacunas.push(Lacuna::new(
                        LacunaKind::FieldDropped,
                        to.as_str(),
                        format!(
                            "existing value {} was overwritten by renamed field '{}'",
                            clobbered, from
                        ),
                    ));
                }
            }
            LensOp::Add { field, default } => {
                if let Some((map, leaf)) = parent_mut(root, field)? {
                    if !map.contains_key(leaf) {
                        map.insert(leaf.to_string(), default.clone());
                        lacunas.push(Lacuna::new(
                            LacunaKind::DefaultSubstituted,
                            field.as_str(),
                            format!("absent from input, filled with default {}", default),
                        ));
                    }
                }
            }
            LensOp::Remove { field, default } => {
                if let Some(old) = take(root, field)? {
                    if default.as_ref() != Some(&old) {
                        lacunas.push(Lacuna::new(
                            LacunaKind::FieldDropped,
                            field.as_str(),
                            format!("value {} has no counterpart in the target schema", old),
                        ));
                    }
                }
            }
            LensOp::ChangeDefault { field, from, to } => {
                if let Some(current) = get_mut(root, field)? {
                    if current == from {
                        *current = to.clone();
                        lacunas.push(Lacuna::new(
                            LacunaKind::ChangedDefault,
                            field.as_str(),
                            format!("old default {} replaced by new default {}", from, to),
                        ));
                    }
                }
            }
            LensOp::MapValues { field, mapping, fallback } => {
                if let Some(current) = get_mut(root, field)? {
                    if let Some(m) = mapping.iter().find(|m| m.from == *current) {
                        *current = m.to.clone();
                    } else if let Some(fallback) = fallback {
                        lacunas.push(Lacuna::new(
                            LacunaKind::ValueNarrowed,
                            field.as_str(),
                            format!(
                                "value {} has no counterpart, replaced with {}",
                                current, fallback
                            ),
                        ));
                        *current = fallback.clone();
                    }
                }
            }
        }
        Ok(())
    }
}

/// The operations translating between two adjacent schema versions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    #[serde(default)]
    pub forward: Vec<LensOp>,
    /// Overrides the automatically inverted forward operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse: Option<Vec<LensOp>>,
}

impl Lens {
    pub fn new(forward: Vec<LensOp>) -> Self {
        Self {
            forward,
            reverse: None,
        }
    }

    pub fn with_reverse(mut self, reverse: Vec<LensOp>) -> Self {
        self.reverse = Some(reverse);
        self
    }

    /// Operations translating a value back across this lens, if defined
    pub fn reverse_ops(&self) -> Option<Vec<LensOp>> {
        match &self.reverse {
            Some(explicit) => Some(explicit.clone()),
            None => self.forward.iter().rev().map(LensOp::invert).collect(),
        }
    }

    pub fn apply_forward(&self, value: &Value) -> Result<(Value, Vec<Lacuna>), LensError> {
        apply_ops(&self.forward, value)
    }
}

/// Apply operations in order to a copy of `value`
pub fn apply_ops(ops: &[LensOp], value: &Value) -> Result<(Value, Vec<Lacuna>), LensError> {
    let mut out = value.clone();
    let mut lacunas = Vec::new();
    if ops.is_empty() {
        return Ok((out, lacunas));
    }
    if !out.is_object() {
        return Err(LensError::new("", "lenses only apply to objects"));
    }
    for op in ops {
        op.apply(&mut out, &mut lacunas)?;
    }
    Ok((out, lacunas))
}

/// Resolve the object holding the last segment of `path`
///
/// `Ok(None)` means an intermediate object is absent.
fn parent_mut<'v, 'p>(
    root: &'v mut Value,
    path: &'p str,
) -> Result<Option<(&'v mut Map<String, Value>, &'p str)>, LensError> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut current = root;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            current = match current {
                Value::Object(map) => match map.get_mut(segment) {
                    Some(next) => next,
                    None => return Ok(None),
                },
                _ => {
                    let reason = format!("'{}' is not inside an object", segment);
                    return Err(LensError::new(path, reason));
                }
            };
        }
    }

    match current {
        Value::Object(map) => Ok(Some((map, leaf))),
        _ => Err(LensError::new(path, "parent is not an object")),
    }
}

fn get_mut<'v>(root: &'v mut Value, path: &str) -> Result<Option<&'v mut Value>, LensError> {
    Ok(parent_mut(root, path)?.and_then(|(map, leaf)| map.get_mut(leaf)))
}

fn take(root: &mut Value, path: &str) -> Result<Option<Value>, LensError> {
    Ok(parent_mut(root, path)?.and_then(|(map, leaf)| map.remove(leaf)))
}
