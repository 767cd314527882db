//! Minimum-field validation, run by the orchestrator before a transition is
//! attempted. The state machine itself mutates nothing when validation
//! fails.

use crate::award::bundle::AwardBundle;
use crate::award::types::{AwardStatus, Stage};
use crate::error::MissingFieldError;
use crate::sections::schema::{label_for, SectionSchema};
use crate::sections::store;
use crate::sections::types::Subaward;

/// Check that a section has all of its minimum fields populated.
pub fn validate_minimum_fields<S: SectionSchema>(section: &S) -> Vec<MissingFieldError> {
    S::minimum_fields()
        .iter()
        .filter(|&&name| !section.is_field_set(name))
        .map(|&name| MissingFieldError {
            field: name,
            label: label_for::<S>(name),
        })
        .collect()
}

/// Validate the section(s) that must be complete before the award can leave
/// its current status.
///
/// Subawards are validated row by row: every subaward on the award must meet
/// its minimum fields before the subaward stage can complete.
pub fn validate_before_advance(
    bundle: &mut AwardBundle,
    triggering_stage: Option<Stage>,
) -> Vec<MissingFieldError> {
    match bundle.award.status() {
        AwardStatus::Intake => {
            let acceptance = store::current_acceptance(bundle);
            validate_minimum_fields(acceptance)
        }
        AwardStatus::ManagementSubaward if triggering_stage == Some(Stage::Subaward) => bundle
            .subawards
            .iter()
            .flat_map(validate_subaward)
            .collect(),
        _ => Vec::new(),
    }
}

fn validate_subaward(subaward: &Subaward) -> Vec<MissingFieldError> {
    validate_minimum_fields(subaward)
}
