//! Search and Resolution Tests
//!
//! Uses a ladder lineage spanning four majors:
//! 0.0, 0.1, 0.2, 1.0, 1.1, 2.0, 3.0

use serde_json::json;

use schema_lineage::{
    as_array, exemplars, find, find_with, search_and_validate, sv, ConfigError, Lineage,
    LineageOptions, SearchCriterion, SearchSpec, SyntacticVersion,
};

fn ladder() -> Lineage {
    Lineage::from_json_str(include_str!("fixtures/ladder.json"), LineageOptions::default()).unwrap()
}

fn found(
    lineage: &Lineage,
    start: SyntacticVersion,
    criterion: SearchCriterion,
) -> Option<SyntacticVersion> {
    find(&lineage.schema(start).unwrap(), criterion).map(|s| s.version())
}

// =============================================================================
// Find Tests
// =============================================================================

#[test]
fn test_latest_has_no_successor() {
    let lineage = ladder();
    for schema in lineage.iter() {
        let latest = find(&schema, SearchCriterion::Latest).unwrap();
        assert_eq!(latest.version(), sv(3, 0));
        assert!(latest.successor().is_none());
    }
}

#[test]
fn test_exact() {
    let lineage = ladder();
    assert_eq!(found(&lineage, sv(0, 0), SearchCriterion::Exact(sv(1, 1))), Some(sv(1, 1)));
    assert_eq!(found(&lineage, sv(1, 1), SearchCriterion::Exact(sv(1, 1))), Some(sv(1, 1)));
    assert_eq!(found(&lineage, sv(0, 0), SearchCriterion::Exact(sv(0, 3))), None);
    assert_eq!(found(&lineage, sv(0, 0), SearchCriterion::Exact(sv(5, 0))), None);
    // forward only
    assert_eq!(found(&lineage, sv(2, 0), SearchCriterion::Exact(sv(1, 1))), None);
}

#[test]
fn test_latest_in_major() {
    let lineage = ladder();
    let start = sv(0, 0);
    assert_eq!(found(&lineage, start, SearchCriterion::LatestInMajor(0)), Some(sv(0, 2)));
    assert_eq!(found(&lineage, start, SearchCriterion::LatestInMajor(1)), Some(sv(1, 1)));
    assert_eq!(found(&lineage, start, SearchCriterion::LatestInMajor(2)), Some(sv(2, 0)));
    assert_eq!(found(&lineage, start, SearchCriterion::LatestInMajor(3)), Some(sv(3, 0)));
    assert_eq!(found(&lineage, start, SearchCriterion::LatestInMajor(4)), None);

    // target major behind the start
    assert_eq!(found(&lineage, sv(1, 0), SearchCriterion::LatestInMajor(0)), None);
    assert_eq!(found(&lineage, sv(1, 0), SearchCriterion::LatestInMajor(1)), Some(sv(1, 1)));
}

#[test]
fn test_latest_in_current_major() {
    let lineage = ladder();
    assert_eq!(found(&lineage, sv(0, 1), SearchCriterion::LatestInCurrentMajor), Some(sv(0, 2)));
    assert_eq!(found(&lineage, sv(1, 0), SearchCriterion::LatestInCurrentMajor), Some(sv(1, 1)));
    assert_eq!(found(&lineage, sv(3, 0), SearchCriterion::LatestInCurrentMajor), Some(sv(3, 0)));
}

#[test]
fn test_find_with_spec() {
    let lineage = ladder();
    let first = lineage.first();

    assert!(matches!(
        find_with(&first, &SearchSpec::default()),
        Err(ConfigError::NoCriterion)
    ));

    let two = SearchSpec {
        latest_in_current_major: true,
        latest_in_major: Some(1),
        ..Default::default()
    };
    assert!(matches!(
        find_with(&first, &two),
        Err(ConfigError::ConflictingCriteria(_))
    ));

    let one = SearchSpec {
        latest_in_major: Some(1),
        ..Default::default()
    };
    assert_eq!(find_with(&first, &one).unwrap().unwrap().version(), sv(1, 1));
}

#[test]
fn test_lineage_find_from_text() {
    let lineage = ladder();
    let criterion: SearchCriterion = "latest-in-major:2".parse().unwrap();
    assert_eq!(lineage.find(criterion).unwrap().version(), sv(2, 0));
    let criterion: SearchCriterion = "exact:0.1".parse().unwrap();
    assert_eq!(lineage.find(criterion).unwrap().version(), sv(0, 1));
}

// =============================================================================
// Resolution Tests
// =============================================================================

#[test]
fn test_as_array_shape() {
    let lineage = ladder();
    let groups = as_array(&lineage.first());
    let sizes: Vec<_> = groups.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 2, 1, 1]);
    assert_eq!(groups[1][1].version(), sv(1, 1));
}

#[test]
fn test_newest_first_resolution() {
    // valid at 0.0, 0.1 and 1.0
    let lineage = exemplars::expand(LineageOptions::default()).unwrap();
    let value = json!({"init": "a", "withDefault": "x"});
    for version in [sv(0, 0), sv(0, 1), sv(1, 0)] {
        assert!(lineage.schema(version).unwrap().validate(&value).is_ok());
    }
    assert_eq!(lineage.search_and_validate(&value).unwrap().version(), sv(1, 0));
}

#[test]
fn test_resolution_in_ladder() {
    let lineage = ladder();
    let start = lineage.first();
    let resolve = |value| search_and_validate(&start, &value).map(|s| s.version());

    assert_eq!(resolve(json!({"a": "x"})).unwrap(), sv(0, 2));
    assert_eq!(resolve(json!({"a": "x", "d": "y"})).unwrap(), sv(1, 1));
    assert_eq!(resolve(json!({"a": "x", "d": "y", "f": "z"})).unwrap(), sv(2, 0));

    let err = resolve(json!({"a": 1})).unwrap_err();
    assert_eq!(err.attempts.len(), lineage.schema_count());
    assert!(err.failure_for(sv(3, 0)).is_some());
    assert_eq!(err.last_failure().unwrap().version, Some(sv(0, 0)));
}
