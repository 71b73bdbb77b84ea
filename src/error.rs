//! Error types for schema lineages

use thiserror::Error;

use crate::version::SyntacticVersion;

/// Result type for lineage operations
pub type Result<T> = std::result::Result<T, LineageError>;

/// Top-level error returned by lineage operations
#[derive(Error, Debug)]
pub enum LineageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("Invalid lineage '{name}': {reason}")]
    InvalidLineage { name: String, reason: String },

    #[error("Invalid schema definition at {version}: {reason}")]
    InvalidSchema {
        version: SyntacticVersion,
        reason: String,
    },

    #[error("Schema not found: lineage '{lineage}' has no version {version}")]
    NotFound {
        lineage: String,
        version: SyntacticVersion,
    },

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Endec '{endec}' failed to decode input: {reason}")]
    Decode { endec: String, reason: String },

    #[error("Endec '{endec}' failed to encode output: {reason}")]
    Encode { endec: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),
}

impl LineageError {
    pub(crate) fn invalid_lineage(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidLineage {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Invalid or conflicting configuration, raised before any traversal work
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("exactly one search criterion must be selected, none was")]
    NoCriterion,

    #[error("exactly one search criterion must be selected, got {}: {}", .0.len(), .0.join(", "))]
    ConflictingCriteria(Vec<&'static str>),

    #[error("unrecognized search criterion '{0}'")]
    UnknownCriterion(String),

    #[error("invalid bind options: {0}")]
    InvalidBindOptions(String),

    #[error("failed to load configuration: {0}")]
    Load(#[from] config_crate::ConfigError),
}

/// A single reason a value failed to conform to a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Location of the offending value, as a JSON pointer ("" for the root)
    pub path: String,
    pub reason: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

/// A value does not conform to a schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "value does not conform to schema{}: {}",
    version_suffix(.version),
    first_violation(.violations)
)]
pub struct ValidationError {
    /// Version of the rejecting schema, once known
    pub version: Option<SyntacticVersion>,
    /// Never empty
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::from_violations(vec![Violation {
            path: path.into(),
            reason: reason.into(),
        }])
    }

    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            version: None,
            violations,
        }
    }

    /// Attach the version of the schema that rejected the value
    pub fn at(mut self, version: SyntacticVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Paths of every offending value
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.path.as_str())
    }
}

fn version_suffix(version: &Option<SyntacticVersion>) -> String {
    version.map(|v| format!(" {}", v)).unwrap_or_default()
}

fn first_violation(violations: &[Violation]) -> String {
    match violations {
        [] => "unknown reason".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

/// No schema in a lineage accepts a value
#[derive(Error, Debug, Clone)]
#[error(
    "no schema in lineage '{lineage}' accepts the value ({} versions tried){}",
    .attempts.len(),
    last_reason(.attempts)
)]
pub struct ResolutionError {
    pub lineage: String,
    /// Every rejection, in the order schemas were tried (newest first)
    pub attempts: Vec<(SyntacticVersion, ValidationError)>,
}

impl ResolutionError {
    /// The failure from the last schema tried, which is the oldest one
    pub fn last_failure(&self) -> Option<&ValidationError> {
        self.attempts.last().map(|(_, err)| err)
    }

    /// The failure reported by a particular version, if it was tried
    pub fn failure_for(&self, version: SyntacticVersion) -> Option<&ValidationError> {
        self.attempts
            .iter()
            .find(|(v, _)| *v == version)
            .map(|(_, err)| err)
    }
}

fn last_reason(attempts: &[(SyntacticVersion, ValidationError)]) -> String {
    attempts
        .last()
        .map(|(_, err)| format!("; last failure: {}", err))
        .unwrap_or_default()
}

/// A lens could not be applied to a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("lens failed at '{path}': {reason}")]
pub struct LensError {
    pub path: String,
    pub reason: String,
}

impl LensError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A requested translation cannot be performed
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    #[error("reverse translation from {from} to {to} is disabled")]
    ReverseDisabled {
        from: SyntacticVersion,
        to: SyntacticVersion,
    },

    #[error("lineage '{lineage}' has no schema version {version}")]
    VersionNotFound {
        lineage: String,
        version: SyntacticVersion,
    },

    #[error("no reverse lens is defined from {from} to {to}")]
    NoReverseLens {
        from: SyntacticVersion,
        to: SyntacticVersion,
    },

    #[error("schema {version} is the latest in its lineage and has no successor")]
    NoSuccessor { version: SyntacticVersion },

    #[error("translating from {from} to {to} failed: {source}")]
    LensFailed {
        from: SyntacticVersion,
        to: SyntacticVersion,
        #[source]
        source: LensError,
    },

    #[error("translation produced a value that does not conform to {version}: {source}")]
    InvalidResult {
        version: SyntacticVersion,
        #[source]
        source: ValidationError,
    },
}

/// A concrete type's structure disagrees with the schema it is bound to
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("cannot bind {type_name}: field '{path}' {reason}")]
    Structure {
        type_name: String,
        path: String,
        reason: String,
    },

    #[error("cannot convert value at {version} into {type_name}: {reason}")]
    Conversion {
        type_name: String,
        version: SyntacticVersion,
        reason: String,
    },

    #[error("{type_name} does not serialize to an object")]
    NotAnObject { type_name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::sv;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("/before", "is not of type \"string\"").at(sv(1, 0));
        assert_eq!(
            err.to_string(),
            "value does not conform to schema 1.0: /before: is not of type \"string\""
        );
    }

    #[test]
    fn test_validation_error_counts_extra_violations() {
        let err = ValidationError::from_violations(vec![
            Violation { path: "/a".into(), reason: "missing".into() },
            Violation { path: "/b".into(), reason: "missing".into() },
        ]);
        assert!(err.to_string().ends_with("/a: missing (and 1 more)"));
        assert_eq!(err.paths().collect::<Vec<_>>(), vec!["/a", "/b"]);
    }

    #[test]
    fn test_resolution_error_keeps_every_attempt() {
        let err = ResolutionError {
            lineage: "rename".into(),
            attempts: vec![
                (sv(1, 0), ValidationError::new("", "after is required").at(sv(1, 0))),
                (sv(0, 0), ValidationError::new("", "before is required").at(sv(0, 0))),
            ],
        };
        assert_eq!(err.last_failure().unwrap().version, Some(sv(0, 0)));
        assert!(err.failure_for(sv(1, 0)).is_some());
        assert!(err.failure_for(sv(2, 0)).is_none());
        assert!(err.to_string().contains("2 versions tried"));
    }

    #[test]
    fn test_conflicting_criteria_message() {
        let err = ConfigError::ConflictingCriteria(vec!["latest", "exact"]);
        assert_eq!(
            err.to_string(),
            "exactly one search criterion must be selected, got 2: latest, exact"
        );
    }
}
