//! Reference lineages embedded in the crate
//!
//! Each exemplar demonstrates one kind of schema evolution:
//!
//! | name            | evolution                                         |
//! |-----------------|---------------------------------------------------|
//! | `rename`        | a field is renamed across a major bump            |
//! | `expand`        | optional then required fields are added           |
//! | `narrowing`     | a string field becomes a boolean                  |
//! | `defaultchange` | only a field's default changes                    |
//! | `single`        | one schema, no evolution                          |

use std::collections::BTreeMap;

use include_dir::{include_dir, Dir};

use crate::engine::JsonSchemaEngine;
use crate::error::{LineageError, Result};
use crate::lineage::{load_lineage, Lineage, LineageOptions, LineageSource};

static EXEMPLARS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/exemplars");

/// Names of every exemplar
pub const NAMES: [&str; 5] = ["defaultchange", "expand", "narrowing", "rename", "single"];

/// Options an exemplar cannot be loaded without
fn required_options(name: &str) -> LineageOptions {
    match name {
        // a changed default is breaking but structurally invisible
        "defaultchange" => LineageOptions::default().with_skip_buggy_checks(),
        _ => LineageOptions::default(),
    }
}

/// The source document of an exemplar
pub fn source(name: &str) -> Result<LineageSource> {
    let contents = EXEMPLARS
        .get_file(format!("{}.json", name))
        .and_then(|file| file.contents_utf8())
        .ok_or_else(|| LineageError::invalid_lineage(name, "no exemplar with this name"))?;
    LineageSource::from_json_str(contents)
}

/// Load an exemplar, adding whatever options it requires
pub fn load(name: &str, options: LineageOptions) -> Result<Lineage> {
    let required = required_options(name);
    let options = LineageOptions {
        reverse_translation: options.reverse_translation || required.reverse_translation,
        skip_buggy_checks: options.skip_buggy_checks || required.skip_buggy_checks,
        strict_compatibility: options.strict_compatibility || required.strict_compatibility,
    };
    load_lineage(&source(name)?, &JsonSchemaEngine::new(), options)
}

/// Every exemplar, keyed by name
pub fn all(options: LineageOptions) -> Result<BTreeMap<String, Lineage>> {
    NAMES
        .iter()
        .map(|name| Ok((name.to_string(), load(name, options)?)))
        .collect()
}

pub fn rename(options: LineageOptions) -> Result<Lineage> {
    load("rename", options)
}

pub fn expand(options: LineageOptions) -> Result<Lineage> {
    load("expand", options)
}

pub fn narrowing(options: LineageOptions) -> Result<Lineage> {
    load("narrowing", options)
}

pub fn defaultchange(options: LineageOptions) -> Result<Lineage> {
    load("defaultchange", options)
}

pub fn single(options: LineageOptions) -> Result<Lineage> {
    load("single", options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::sv;

    #[test]
    fn test_every_embedded_file_is_named() {
        let mut embedded: Vec<_> = EXEMPLARS
            .files()
            .filter_map(|f| f.path().file_stem()?.to_str())
            .collect();
        embedded.sort_unstable();
        assert_eq!(embedded, NAMES.to_vec());
    }

    #[test]
    fn test_all_load() {
        let all = all(LineageOptions::default()).unwrap();
        assert_eq!(all.len(), NAMES.len());
        for (name, lineage) in &all {
            assert_eq!(lineage.name(), name);
        }
        assert_eq!(all["expand"].versions(), vec![sv(0, 0), sv(0, 1), sv(1, 0)]);
        assert_eq!(all["single"].schema_count(), 1);
    }

    #[test]
    fn test_defaultchange_needs_skip() {
        let err = load_lineage(
            &source("defaultchange").unwrap(),
            &JsonSchemaEngine::new(),
            LineageOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LineageError::InvalidLineage { .. }));

        let lineage = defaultchange(LineageOptions::default()).unwrap();
        assert!(lineage.options().skip_buggy_checks);
    }

    #[test]
    fn test_unknown_exemplar() {
        assert!(load("nope", LineageOptions::default()).is_err());
    }
}
