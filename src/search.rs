//! Searching a lineage for a schema
//!
//! Searches walk forward from a starting schema through its successors, so
//! they never return a schema older than the start.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ConfigError;
use crate::schema::Schema;
use crate::version::SyntacticVersion;

/// What a search is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchCriterion {
    /// The newest schema in the lineage
    Latest,
    /// The newest schema whose major version is the given one
    LatestInMajor(u32),
    /// The newest schema sharing the starting schema's major version
    LatestInCurrentMajor,
    /// The schema with exactly this version
    Exact(SyntacticVersion),
}

impl fmt::Display for SearchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchCriterion::Latest => write!(f, "latest"),
            SearchCriterion::LatestInMajor(major) => write!(f, "latest-in-major:{}", major),
            SearchCriterion::LatestInCurrentMajor => write!(f, "latest-in-current-major"),
            SearchCriterion::Exact(version) => write!(f, "exact:{}", version),
        }
    }
}

impl FromStr for SearchCriterion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigError::UnknownCriterion(s.to_string());
        match s.trim() {
            "latest" => Ok(SearchCriterion::Latest),
            "latest-in-current-major" => Ok(SearchCriterion::LatestInCurrentMajor),
            other => match other.split_once(':') {
                Some(("latest-in-major", major)) => major
                    .trim()
                    .parse()
                    .map(SearchCriterion::LatestInMajor)
                    .map_err(|_| unknown()),
                Some(("exact", version)) => version
                    .parse()
                    .map(SearchCriterion::Exact)
                    .map_err(|_| unknown()),
                _ => Err(unknown()),
            },
        }
    }
}

/// Loosely-specified search options, as they arrive from configuration
///
/// Exactly one field must be set; [`SearchSpec::criterion`] enforces that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSpec {
    pub latest: bool,
    pub latest_in_major: Option<u32>,
    pub latest_in_current_major: bool,
    pub exact: Option<SyntacticVersion>,
}

impl SearchSpec {
    pub fn criterion(&self) -> Result<SearchCriterion, ConfigError> {
        let mut selected = Vec::new();
        if self.latest {
            selected.push(("latest", SearchCriterion::Latest));
        }
        if let Some(major) = self.latest_in_major {
            selected.push(("latest_in_major", SearchCriterion::LatestInMajor(major)));
        }
        if self.latest_in_current_major {
            selected.push(("latest_in_current_major", SearchCriterion::LatestInCurrentMajor));
        }
        if let Some(version) = self.exact {
            selected.push(("exact", SearchCriterion::Exact(version)));
        }

        match selected.as_slice() {
            [] => Err(ConfigError::NoCriterion),
            [(_, criterion)] => Ok(*criterion),
            many => Err(ConfigError::ConflictingCriteria(
                many.iter().map(|(name, _)| *name).collect(),
            )),
        }
    }
}

impl TryFrom<SearchSpec> for SearchCriterion {
    type Error = ConfigError;

    fn try_from(spec: SearchSpec) -> Result<Self, Self::Error> {
        spec.criterion()
    }
}

impl From<SearchCriterion> for SearchSpec {
    fn from(criterion: SearchCriterion) -> Self {
        let mut spec = SearchSpec::default();
        match criterion {
            SearchCriterion::Latest => spec.latest = true,
            SearchCriterion::LatestInMajor(major) => spec.latest_in_major = Some(major),
            SearchCriterion::LatestInCurrentMajor => spec.latest_in_current_major = true,
            SearchCriterion::Exact(version) => spec.exact = Some(version),
        }
        spec
    }
}

/// The starting schema followed by every successor
fn walk(start: &Schema) -> impl Iterator<Item = Schema> {
    std::iter::successors(Some(start.clone()), Schema::successor)
}

/// Find the schema matching `criterion`, searching forward from `start`
///
/// `Latest` always finds a schema. The others return `None` when nothing at
/// or after `start` matches.
pub fn find(start: &Schema, criterion: SearchCriterion) -> Option<Schema> {
    let found = match criterion {
        SearchCriterion::Latest => walk(start).last(),
        SearchCriterion::Exact(version) => walk(start).find(|s| s.version() == version),
        SearchCriterion::LatestInMajor(major) => latest_in_major(start, major),
        SearchCriterion::LatestInCurrentMajor => latest_in_major(start, start.version().major),
    };
    trace!(
        start = %start,
        criterion = %criterion,
        found = ?found.as_ref().map(Schema::version),
        "Searched lineage"
    );
    found
}

fn latest_in_major(start: &Schema, major: u32) -> Option<Schema> {
    if start.version().major > major {
        return None;
    }
    walk(start)
        .take_while(|s| s.version().major <= major)
        .last()
        .filter(|s| s.version().major == major)
}

/// Find using loosely-specified options, rejecting anything but one criterion
pub fn find_with(start: &Schema, spec: &SearchSpec) -> Result<Option<Schema>, ConfigError> {
    let criterion = spec.criterion()?;
    Ok(find(start, criterion))
}
