//! Translation of values between versions of a lineage
//!
//! Forward translation walks successor lenses one step at a time; reverse
//! translation walks their inverses and must be enabled on the lineage. Every
//! intermediate result is validated against the schema it claims to conform
//! to, and each step's lacunas are stamped with the boundary that produced them.

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Result, TranslationError};
use crate::lacuna::TranslationLacunas;
use crate::lineage::Lineage;
use crate::version::SyntacticVersion;

/// Translate a value of version `from` into version `to`
///
/// The input is validated against `from` before anything else, so a
/// same-version translation doubles as a validity check.
pub fn translate(
    lineage: &Lineage,
    value: &Value,
    from: SyntacticVersion,
    to: SyntacticVersion,
) -> Result<(Value, TranslationLacunas)> {
    let from_index = index_of(lineage, from)?;
    let to_index = index_of(lineage, to)?;

    lineage.schema(from)?.validate(value)?;

    Ok(translate_validated(lineage, value, from_index, to_index)?)
}

fn index_of(
    lineage: &Lineage,
    version: SyntacticVersion,
) -> std::result::Result<usize, TranslationError> {
    lineage
        .index_of(version)
        .ok_or_else(|| TranslationError::VersionNotFound {
            lineage: lineage.name().to_string(),
            version,
        })
}

/// Translate a value already known to conform to the schema at `from`
pub(crate) fn translate_validated(
    lineage: &Lineage,
    value: &Value,
    from: usize,
    to: usize,
) -> std::result::Result<(Value, TranslationLacunas), TranslationError> {
    let mut lacunas = TranslationLacunas::new();
    if from == to {
        return Ok((value.clone(), lacunas));
    }

    let nodes = lineage.nodes();
    let (from_version, to_version) = (nodes[from].definition.version, nodes[to].definition.version);

    let mut current = value.clone();
    if from < to {
        for i in from..to {
            current = step_forward(lineage, i, &current, &mut lacunas)?;
        }
    } else {
        if !lineage.options().reverse_translation {
            return Err(TranslationError::ReverseDisabled {
                from: from_version,
                to: to_version,
            });
        }
        // Fail before doing any work if some step has no inverse
        if let Some(i) = (to..from).find(|&i| !nodes[i].handle.can_translate_back()) {
            return Err(TranslationError::NoReverseLens {
                from: nodes[i + 1].definition.version,
                to: nodes[i].definition.version,
            });
        }
        for i in (to..from).rev() {
            current = step_back(lineage, i, &current, &mut lacunas)?;
        }
    }

    debug!(
        lineage = lineage.name(),
        from = %from_version,
        to = %to_version,
        lacunas = lacunas.len(),
        "Translated value"
    );
    Ok((current, lacunas))
}

/// Apply the lens from the schema at `index` to its successor
pub(crate) fn step_forward(
    lineage: &Lineage,
    index: usize,
    value: &Value,
    lacunas: &mut TranslationLacunas,
) -> std::result::Result<Value, TranslationError> {
    let nodes = lineage.nodes();
    let (source, target) = (&nodes[index], &nodes[index + 1]);
    let (from, to) = (source.definition.version, target.definition.version);

    let (out, step) = source
        .handle
        .translate_one_step(value)
        .map_err(|source| TranslationError::LensFailed { from, to, source })?;
    target
        .handle
        .validate(&out)
        .map_err(|e| TranslationError::InvalidResult {
            version: to,
            source: e.at(to),
        })?;

    trace!(%from, %to, lacunas = step.len(), "Translated one step forward");
    lacunas.record_step(from, to, step);
    Ok(out)
}

/// Apply the inverse of the lens from the schema at `index` to its successor
fn step_back(
    lineage: &Lineage,
    index: usize,
    value: &Value,
    lacunas: &mut TranslationLacunas,
) -> std::result::Result<Value, TranslationError> {
    let target = &lineage.nodes()[index];
    let from = lineage.nodes()[index + 1].definition.version;
    let to = target.definition.version;

    let (out, step) = target
        .handle
        .translate_one_step_back(value)
        .map_err(|source| TranslationError::LensFailed { from, to, source })?;
    target
        .handle
        .validate(&out)
        .map_err(|e| TranslationError::InvalidResult {
            version: to,
            source: e.at(to),
        })?;

    trace!(%from, %to, lacunas = step.len(), "Translated one step back");
    lacunas.record_step(from, to, step);
    Ok(out)
}
