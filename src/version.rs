//! Syntactic schema versions
//!
//! A lineage numbers its schemas with a `(major, minor)` pair. A major bump
//! marks a breaking change; a minor bump marks a compatible, additive one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LineageError;

/// The version of one schema within a lineage
///
/// Ordering compares `major` first, then `minor`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "VersionRepr", into = "[u32; 2]")]
pub struct SyntacticVersion {
    pub major: u32,
    pub minor: u32,
}

/// Shorthand for [`SyntacticVersion::new`]
pub const fn sv(major: u32, minor: u32) -> SyntacticVersion {
    SyntacticVersion::new(major, minor)
}

impl SyntacticVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse "1.2" or "v1.2"
    pub fn parse(version_str: &str) -> Result<Self, LineageError> {
        let trimmed = version_str.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let invalid = || LineageError::InvalidVersion(format!(
            "'{}' is not of the form <major>.<minor>",
            version_str
        ));

        let (major, minor) = trimmed.split_once('.').ok_or_else(invalid)?;
        let major = major.parse::<u32>().map_err(|_| invalid())?;
        let minor = minor.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self::new(major, minor))
    }

    /// The version a compatible change to this one would carry
    pub fn next_minor(&self) -> Self {
        Self::new(self.major, self.minor + 1)
    }

    /// The version a breaking change to this one would carry
    pub fn next_major(&self) -> Self {
        Self::new(self.major + 1, 0)
    }

    /// Check if this version is a breaking (major) bump from another version
    pub fn is_major_bump_from(&self, other: &SyntacticVersion) -> bool {
        self.major > other.major
    }

    /// Check if this version is a compatible (minor) bump from another version
    pub fn is_minor_bump_from(&self, other: &SyntacticVersion) -> bool {
        self.major == other.major && self.minor > other.minor
    }

    /// Whether this version may directly follow `prev` in a lineage
    pub fn follows(&self, prev: &SyntacticVersion) -> bool {
        *self == prev.next_minor() || *self == prev.next_major()
    }

    /// Parse a semver string such as "1.2.0"
    pub fn from_semver_str(s: &str) -> Result<Self, LineageError> {
        let version = semver::Version::parse(s.trim())?;
        Self::try_from(&version)
    }

    /// The equivalent semver version (`major.minor.0`)
    pub fn to_semver(&self) -> semver::Version {
        semver::Version::new(self.major.into(), self.minor.into(), 0)
    }
}

impl fmt::Display for SyntacticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for SyntacticVersion {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<(u32, u32)> for SyntacticVersion {
    fn from((major, minor): (u32, u32)) -> Self {
        Self::new(major, minor)
    }
}

impl From<SyntacticVersion> for [u32; 2] {
    fn from(v: SyntacticVersion) -> Self {
        [v.major, v.minor]
    }
}

impl TryFrom<&semver::Version> for SyntacticVersion {
    type Error = LineageError;

    fn try_from(v: &semver::Version) -> Result<Self, Self::Error> {
        if v.patch != 0 || !v.pre.is_empty() || !v.build.is_empty() {
            return Err(LineageError::InvalidVersion(format!(
                "{} has no syntactic equivalent: patch, pre-release and build must be empty",
                v
            )));
        }
        let narrow = |n: u64| {
            u32::try_from(n)
                .map_err(|_| LineageError::InvalidVersion(format!("{} is out of range", v)))
        };
        Ok(Self::new(narrow(v.major)?, narrow(v.minor)?))
    }
}

/// Accepted serialized forms: `[1, 0]` or `"1.0"`
#[derive(Deserialize)]
#[serde(untagged)]
enum VersionRepr {
    Pair([u32; 2]),
    Text(String),
}

impl TryFrom<VersionRepr> for SyntacticVersion {
    type Error = LineageError;

    fn try_from(repr: VersionRepr) -> Result<Self, Self::Error> {
        match repr {
            VersionRepr::Pair([major, minor]) => Ok(Self::new(major, minor)),
            VersionRepr::Text(s) => Self::parse(&s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        assert_eq!(SyntacticVersion::parse("1.2").unwrap(), sv(1, 2));
        assert_eq!(SyntacticVersion::parse("v0.3").unwrap(), sv(0, 3));
        assert!(SyntacticVersion::parse("1").is_err());
        assert!(SyntacticVersion::parse("1.2.3").is_err());
        assert!(SyntacticVersion::parse("one.two").is_err());
    }

    #[test]
    fn test_ordering_is_major_then_minor() {
        assert!(sv(0, 9) < sv(1, 0));
        assert!(sv(1, 0) < sv(1, 1));
        assert!(sv(2, 0) > sv(1, 99));
        assert_eq!(sv(1, 1), sv(1, 1));
    }

    #[test]
    fn test_ordering_is_transitive() {
        let versions = [sv(0, 0), sv(0, 1), sv(0, 7), sv(1, 0), sv(1, 3), sv(4, 0)];
        for a in &versions {
            for b in &versions {
                for c in &versions {
                    if a < b && b < c {
                        assert!(a < c, "{} < {} < {} but not {} < {}", a, b, c, a, c);
                    }
                }
            }
        }
    }

    #[test]
    fn test_bumps() {
        let v = sv(1, 2);
        assert_eq!(v.next_minor(), sv(1, 3));
        assert_eq!(v.next_major(), sv(2, 0));
        assert!(sv(2, 0).is_major_bump_from(&v));
        assert!(sv(1, 3).is_minor_bump_from(&v));
        assert!(sv(1, 3).follows(&v));
        assert!(sv(2, 0).follows(&v));
        assert!(!sv(1, 4).follows(&v));
        assert!(!sv(2, 1).follows(&v));
    }

    #[test]
    fn test_serde_forms() {
        let v: SyntacticVersion = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(v, sv(1, 2));
        let v: SyntacticVersion = serde_json::from_str("\"v3.4\"").unwrap();
        assert_eq!(v, sv(3, 4));
        assert_eq!(serde_json::to_string(&sv(1, 2)).unwrap(), "[1,2]");
    }

    #[test]
    fn test_semver_interop() {
        assert_eq!(sv(1, 2).to_semver(), semver::Version::new(1, 2, 0));
        let back = SyntacticVersion::try_from(&semver::Version::new(1, 2, 0)).unwrap();
        assert_eq!(back, sv(1, 2));
        assert!(SyntacticVersion::try_from(&semver::Version::new(1, 2, 3)).is_err());

        assert_eq!(SyntacticVersion::from_semver_str("2.1.0").unwrap(), sv(2, 1));
        assert!(matches!(
            SyntacticVersion::from_semver_str("2.1"),
            Err(LineageError::Semver(_))
        ));
    }
}
