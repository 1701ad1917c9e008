use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Top-level error returned from a full assessment run.
#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("Request was considered invalid due to error: {0}")]
    InvalidRequest(#[from] anyhow::Error),
    #[error("Error identified during assessment calculation: {0}")]
    FailureInCalculation(#[from] EngineError),
    #[error("Error while writing assessment results: {0}")]
    ErrorInOutput(OutputError),
}

/// Errors raised by the calculation components themselves.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    #[error("No {kind} reference data found for '{name}'")]
    MissingReferenceData { kind: ReferenceKind, name: String },
    #[error("Required configuration is missing: {0}")]
    MissingConfiguration(String),
}

impl EngineError {
    pub(crate) fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_reference(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Self::MissingReferenceData {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn missing_configuration(what: impl Into<String>) -> Self {
        Self::MissingConfiguration(what.into())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    EnergySource,
    Material,
    ConstructionMaterial,
    MeasurementPrice,
    EnergyPrice,
}

impl Display for ReferenceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReferenceKind::EnergySource => "energy source",
            ReferenceKind::Material => "material",
            ReferenceKind::ConstructionMaterial => "construction material",
            ReferenceKind::MeasurementPrice => "measurement price",
            ReferenceKind::EnergyPrice => "energy price",
        };
        write!(f, "{label}")
    }
}

/// A record of an input item that was left out of an aggregate result because the
/// reference data it needs is not in the active table.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ExclusionNote {
    pub kind: ReferenceKind,
    pub name: String,
    pub reason: String,
}

impl ExclusionNote {
    pub(crate) fn from_error(error: &EngineError) -> Option<Self> {
        match error {
            EngineError::MissingReferenceData { kind, name } => Some(Self {
                kind: *kind,
                name: name.clone(),
                reason: error.to_string(),
            }),
            _ => None,
        }
    }
}

/// Combine notes from several sub-results, keeping one note per excluded item.
pub(crate) fn merge_exclusions<'a>(
    groups: impl IntoIterator<Item = &'a Vec<ExclusionNote>>,
) -> Vec<ExclusionNote> {
    groups
        .into_iter()
        .flatten()
        .unique_by(|note| (note.kind, note.name.clone()))
        .cloned()
        .collect()
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct OutputError {
    error: anyhow::Error,
}

impl OutputError {
    pub fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_name_the_violated_field_in_invalid_input_message() {
        let error = EngineError::invalid_input("heated_floor_area", "must be greater than zero");
        assert_eq!(
            error.to_string(),
            "Invalid input for field 'heated_floor_area': must be greater than zero"
        );
    }

    #[rstest]
    fn should_build_exclusion_note_only_from_missing_reference_data() {
        let missing = EngineError::missing_reference(ReferenceKind::Material, "cork");
        let note = ExclusionNote::from_error(&missing).unwrap();
        assert_eq!(note.kind, ReferenceKind::Material);
        assert_eq!(note.name, "cork");
        assert_eq!(note.reason, "No material reference data found for 'cork'");

        let invalid = EngineError::invalid_input("quantity", "negative");
        assert!(ExclusionNote::from_error(&invalid).is_none());
    }
}
