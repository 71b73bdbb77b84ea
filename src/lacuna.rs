//! Lacunas: records of information altered, defaulted or discarded while a
//! value crosses schema version boundaries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::SyntacticVersion;

/// What happened to the affected field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LacunaKind {
    /// A value absent from the input was filled with a default
    DefaultSubstituted,
    /// The input held the old default, which was replaced by the new default
    ChangedDefault,
    /// A field with no counterpart in the target schema was discarded
    FieldDropped,
    /// A value outside the target's narrower domain was replaced
    ValueNarrowed,
}

impl fmt::Display for LacunaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LacunaKind::DefaultSubstituted => "default substituted",
            LacunaKind::ChangedDefault => "changed default",
            LacunaKind::FieldDropped => "field dropped",
            LacunaKind::ValueNarrowed => "value narrowed",
        };
        f.write_str(s)
    }
}

/// The version boundary a lacuna arose at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub from: SyntacticVersion,
    pub to: SyntacticVersion,
}

/// One record of lost or altered information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lacuna {
    /// Dot-separated path of the affected field
    pub path: String,
    pub message: String,
    pub kind: LacunaKind,
    /// Set once the translation engine knows which step produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Boundary>,
}

impl Lacuna {
    pub fn new(kind: LacunaKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
            boundary: None,
        }
    }
}

impl fmt::Display for Lacuna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(b) = self.boundary {
            write!(f, "[{} -> {}] ", b.from, b.to)?;
        }
        write!(f, "{} at '{}': {}", self.kind, self.path, self.message)
    }
}

/// Ordered lacunas accumulated over one translation call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationLacunas {
    lacunas: Vec<Lacuna>,
}

impl TranslationLacunas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lacunas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lacunas.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Lacuna> {
        self.lacunas.iter()
    }

    pub fn as_slice(&self) -> &[Lacuna] {
        &self.lacunas
    }

    /// Lacunas of one kind, in order
    pub fn of_kind(&self, kind: LacunaKind) -> impl Iterator<Item = &Lacuna> {
        self.lacunas.iter().filter(move |l| l.kind == kind)
    }

    /// Append the lacunas of one translation step, stamping the boundary
    pub(crate) fn record_step(
        &mut self,
        from: SyntacticVersion,
        to: SyntacticVersion,
        step: Vec<Lacuna>,
    ) {
        self.lacunas.extend(step.into_iter().map(|mut l| {
            l.boundary = Some(Boundary { from, to });
            l
        }));
    }
}

impl<'a> IntoIterator for &'a TranslationLacunas {
    type Item = &'a Lacuna;
    type IntoIter = std::slice::Iter<'a, Lacuna>;

    fn into_iter(self) -> Self::IntoIter {
        self.lacunas.iter()
    }
}

impl IntoIterator for TranslationLacunas {
    type Item = Lacuna;
    type IntoIter = std::vec::IntoIter<Lacuna>;

    fn into_iter(self) -> Self::IntoIter {
        self.lacunas.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::sv;

    #[test]
    fn test_record_step_stamps_boundary_in_order() {
        let mut lacunas = TranslationLacunas::new();
        lacunas.record_step(
            sv(0, 0),
            sv(1, 0),
            vec![Lacuna::new(LacunaKind::FieldDropped, "a", "dropped")],
        );
        lacunas.record_step(
            sv(1, 0),
            sv(2, 0),
            vec![Lacuna::new(LacunaKind::DefaultSubstituted, "b", "filled")],
        );

        let paths: Vec<_> = lacunas.iter().map(|l| l.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "b"]);
        assert_eq!(
            lacunas.as_slice()[1].boundary,
            Some(Boundary { from: sv(1, 0), to: sv(2, 0) })
        );
        assert_eq!(lacunas.of_kind(LacunaKind::FieldDropped).count(), 1);
    }

    #[test]
    fn test_display() {
        let mut l = Lacuna::new(LacunaKind::ChangedDefault, "aunion", "\"foo\" became \"bar\"");
        assert_eq!(l.to_string(), "changed default at 'aunion': \"foo\" became \"bar\"");
        l.boundary = Some(Boundary { from: sv(0, 0), to: sv(1, 0) });
        assert!(l.to_string().starts_with("[0.0 -> 1.0] "));
    }
}
