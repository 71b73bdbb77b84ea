//! Newest-first resolution of values to schemas

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::ResolutionError;
use crate::schema::Schema;

/// Group `start` and its successors by major version
///
/// Outer entries are in ascending major order and inner entries in ascending
/// minor order. The result is a snapshot; nothing in it aliases the lineage
/// beyond shared schema handles.
pub fn as_array(start: &Schema) -> Vec<Vec<Schema>> {
    let mut groups: Vec<Vec<Schema>> = Vec::new();
    for schema in std::iter::successors(Some(start.clone()), Schema::successor) {
        match groups.last_mut() {
            Some(group) if group[0].version().major == schema.version().major => group.push(schema),
            _ => groups.push(vec![schema]),
        }
    }
    groups
}

/// Find the newest schema, at or after `start`, that accepts `value`
///
/// Schemas are tried newest first. If none accepts the value, the error
/// carries every rejection in the order the schemas were tried.
pub fn search_and_validate(start: &Schema, value: &Value) -> Result<Schema, ResolutionError> {
    let mut attempts = Vec::new();
    let newest_first = as_array(start)
        .into_iter()
        .rev()
        .flat_map(|group| group.into_iter().rev());

    for schema in newest_first {
        match schema.validate(value) {
            Ok(()) => {
                debug!(schema = %schema, rejected = attempts.len(), "Resolved value to schema");
                return Ok(schema);
            }
            Err(err) => {
                trace!(schema = %schema, error = %err, "Schema rejected value");
                attempts.push((schema.version(), err));
            }
        }
    }

    Err(ResolutionError {
        lineage: start.lineage().name().to_string(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::Lens;
    use crate::lineage::{Lineage, LineageOptions, LineageSource};
    use crate::schema::SchemaDefinition;
    use crate::version::sv;
    use serde_json::json;

    /// 0.0, 0.1, 1.0, 1.1, 2.0; version i adds field `fi`, required on major bumps
    fn ladder() -> Lineage {
        let versions = [sv(0, 0), sv(0, 1), sv(1, 0), sv(1, 1), sv(2, 0)];
        let mut source = LineageSource::new("ladder");
        let mut properties = serde_json::Map::new();
        let mut required: Vec<String> = Vec::new();
        for (i, version) in versions.into_iter().enumerate() {
            let field = format!("f{}", i);
            properties.insert(field.clone(), json!({"type": "string"}));
            if version.minor == 0 {
                required.push(field);
            }
            let schema = json!({"type": "object", "properties": properties, "required": required});
            let mut definition = SchemaDefinition::new(version, schema);
            if i > 0 && version.minor == 0 {
                definition = definition.with_lens(Lens::default());
            }
            source = source.with_schema(definition);
        }
        crate::lineage::load_lineage(
            &source,
            &crate::engine::JsonSchemaEngine::new(),
            LineageOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_as_array_groups_by_major() {
        let lineage = ladder();
        let groups = as_array(&lineage.first());
        let versions: Vec<Vec<_>> = groups
            .iter()
            .map(|g| g.iter().map(Schema::version).collect())
            .collect();
        assert_eq!(
            versions,
            vec![vec![sv(0, 0), sv(0, 1)], vec![sv(1, 0), sv(1, 1)], vec![sv(2, 0)]]
        );

        let from_middle = as_array(&lineage.schema(sv(1, 1)).unwrap());
        assert_eq!(from_middle.len(), 2);
        assert_eq!(from_middle[0].len(), 1);
    }

    #[test]
    fn test_newest_accepting_schema_wins() {
        let lineage = ladder();
        let start = lineage.first();

        let found = search_and_validate(&start, &json!({"f0": "a"})).unwrap();
        assert_eq!(found.version(), sv(0, 1));

        let found = search_and_validate(&start, &json!({"f0": "a", "f2": "b", "f4": "c"})).unwrap();
        assert_eq!(found.version(), sv(2, 0));
    }

    #[test]
    fn test_all_failures_are_collected() {
        let lineage = ladder();
        let err = search_and_validate(&lineage.first(), &json!({"f0": 7})).unwrap_err();
        assert_eq!(err.lineage, "ladder");
        let tried: Vec<_> = err.attempts.iter().map(|(v, _)| *v).collect();
        assert_eq!(tried, vec![sv(2, 0), sv(1, 1), sv(1, 0), sv(0, 1), sv(0, 0)]);
        assert_eq!(err.last_failure().unwrap().version, Some(sv(0, 0)));
    }

    #[test]
    fn test_search_never_goes_backwards() {
        let lineage = ladder();
        let start = lineage.schema(sv(1, 0)).unwrap();
        let err = search_and_validate(&start, &json!({"f0": "a"})).unwrap_err();
        assert_eq!(err.attempts.len(), 3);
    }
}
