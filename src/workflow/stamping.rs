//! Completion stamping.
//!
//! After every transition the award's new position determines which section
//! completion dates are set and which audit trail entries are opened or
//! closed. Centralizing this here keeps the transition operations themselves
//! free of bookkeeping branches.

use chrono::{DateTime, Utc};

use crate::audit;
use crate::award::bundle::AwardBundle;
use crate::award::state::WorkflowState;
use crate::award::types::{AwardStatus, Stage};
use crate::sections::store;

/// Stamp section completion dates and audit entries for the award's current
/// position. Idempotent per logical transition: re-running for the same
/// position does not double-book time ranges.
pub fn stamp_stage_completion(bundle: &mut AwardBundle, now: DateTime<Utc>) {
    let generation = bundle.generation_label();
    let modification_label = bundle.modification_label();
    let cycle_count = bundle.acceptances.len();
    let state = bundle.award.state;

    match state.status() {
        AwardStatus::Negotiation => {
            complete_current_acceptance(bundle, now);
            audit::record_stage_entry(bundle, &generation, Stage::Acceptance, now);
            audit::record_stage_entry(bundle, &generation, Stage::Negotiation, now);
            match state {
                WorkflowState::ParallelNegotiationModification { .. } => {
                    audit::record_stage_entry(bundle, &modification_label, Stage::Modification, now);
                }
                WorkflowState::ParallelNegotiationSetup { .. } => {
                    audit::record_stage_entry(bundle, &generation, Stage::Setup, now);
                }
                _ => {}
            }
        }

        AwardStatus::Setup => {
            // Whichever of negotiation or acceptance actually handled the
            // previous status gets its completion stamped.
            if bundle.award.assignments.negotiation.is_some() {
                let negotiation = store::current_negotiation_mut(bundle);
                negotiation.negotiation_completion_date.get_or_insert(now);
                audit::record_stage_entry(bundle, &generation, Stage::Negotiation, now);
            } else {
                complete_current_acceptance(bundle, now);
                audit::record_stage_entry(bundle, &generation, Stage::Acceptance, now);
            }
            match state {
                WorkflowState::Sequential { .. } => {
                    audit::record_stage_entry(bundle, &generation, Stage::Setup, now);
                }
                WorkflowState::RoutedToModification { .. } => {
                    audit::record_stage_entry(bundle, &modification_label, Stage::Modification, now);
                }
                _ => {}
            }
        }

        AwardStatus::ManagementSubaward => {
            match state {
                WorkflowState::Sequential { .. } => {
                    // A completed first-cycle setup keeps its original date.
                    let already_complete = bundle.setup.setup_completion_date.is_some();
                    if !(already_complete && cycle_count == 1) {
                        bundle.setup.setup_completion_date = Some(now);
                        audit::record_stage_entry(bundle, &generation, Stage::Setup, now);
                    }
                }
                WorkflowState::ParallelNegotiationSetup { .. } => {}
                WorkflowState::ParallelNegotiationModification { common: true, .. } => {}
                WorkflowState::ParallelNegotiationModification { common: false, .. }
                | WorkflowState::RoutedToModification { .. } => {
                    if let Some(modification) = bundle.latest_edited_modification_mut() {
                        modification.modification_completion_date = Some(now);
                    }
                    audit::record_stage_entry(bundle, &modification_label, Stage::Modification, now);
                }
            }
            if bundle.award.assignments.subaward.is_some() {
                audit::record_stage_entry(bundle, &generation, Stage::Subaward, now);
            }
            audit::record_stage_entry(bundle, &generation, Stage::Management, now);
        }

        AwardStatus::Closeout => {
            audit::record_stage_entry(bundle, &generation, Stage::Closeout, now);
        }

        AwardStatus::Complete => {
            bundle.closeout.closeout_completion_date = Some(now);
            audit::record_stage_entry(bundle, &generation, Stage::Closeout, now);
        }

        AwardStatus::New | AwardStatus::Intake => {}
    }
}

fn complete_current_acceptance(bundle: &mut AwardBundle, now: DateTime<Utc>) {
    let acceptance = store::current_acceptance_mut(bundle);
    acceptance.acceptance_completion_date.get_or_insert(now);
}
