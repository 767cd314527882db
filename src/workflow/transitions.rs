//! The workflow state machine's transition operations.
//!
//! Every operation here is a pure mutation of an owned [`AwardBundle`]:
//! callers load a bundle, apply one operation, and persist the result as a
//! single unit. On error the bundle is discarded unpersisted, so a failed
//! transition never leaves partial state behind.

use chrono::{DateTime, Utc};

use crate::assignment;
use crate::audit;
use crate::award::bundle::AwardBundle;
use crate::award::state::WorkflowState;
use crate::award::types::{AwardStatus, Stage};
use crate::config::NotificationConfig;
use crate::error::WorkflowError;
use crate::notify::{self, Notification};
use crate::proposal;
use crate::sections::registry;
use crate::sections::store;
use crate::sections::types::AwardModification;
use crate::workflow::stamping::stamp_stage_completion;

/// Result of a transition: whether the status moved, plus the notifications
/// to dispatch once the bundle has committed.
#[derive(Debug)]
pub struct TransitionOutcome {
    pub advanced: bool,
    pub notifications: Vec<Notification>,
}

/// Move the award to the next step.
///
/// At `ManagementSubaward` the triggering sub-stage's done-flag is set (and
/// an unstaffed partner stage auto-completes); the status only increments
/// once both flags are set. After incrementing, stages whose sections have
/// no assigned user are skipped until a staffed stage or the terminal status
/// is reached.
pub fn advance(
    bundle: &mut AwardBundle,
    triggering_stage: Option<Stage>,
    config: &NotificationConfig,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, WorkflowError> {
    let status = bundle.award.status();
    if status.is_terminal() {
        return Err(WorkflowError::InvalidTransition { status });
    }

    let mut notifications = Vec::new();

    if status == AwardStatus::ManagementSubaward {
        let stage = match triggering_stage {
            Some(stage @ (Stage::Subaward | Stage::Management)) => stage,
            _ => return Err(WorkflowError::InvalidTransition { status }),
        };
        let generation = bundle.generation_label();

        if stage == Stage::Subaward
            || assignment::resolve_user(&bundle.award, Stage::Subaward, false).is_none()
        {
            bundle.award.subaward_done = true;
            if bundle.award.assignments.subaward.is_some() {
                audit::record_stage_entry(bundle, &generation, Stage::Subaward, now);
                if let Some(subaward) = bundle.latest_subaward_mut() {
                    subaward.subaward_completion_date = Some(now);
                }
            }
        }
        if stage == Stage::Management
            || assignment::resolve_user(&bundle.award, Stage::Management, false).is_none()
        {
            bundle.award.management_done = true;
            audit::record_stage_entry(bundle, &generation, Stage::Management, now);
            bundle.management.management_completion_date = Some(now);
        }

        if !(bundle.award.subaward_done && bundle.award.management_done) {
            tracing::info!(
                award.id = bundle.award.id,
                stage = stage.name(),
                "sub-stage complete, holding until partner stage finishes"
            );
            return Ok(TransitionOutcome {
                advanced: false,
                notifications,
            });
        }
    }

    // A routed award leaving negotiation hands its pending modification row
    // its assignment date.
    if status == AwardStatus::Negotiation && bundle.award.state.routed_to_modification() {
        if let Some(modification) = bundle.latest_pending_modification_mut() {
            modification.date_assigned = Some(now);
        }
    }

    loop {
        let current = bundle.award.status();
        // Parallel tracks collapse as the status they paired with completes.
        if current == AwardStatus::Setup && bundle.award.state.dual_setup() {
            bundle.award.state.collapse_to_sequential();
        }
        if current == AwardStatus::ManagementSubaward && bundle.award.state.dual_modification() {
            bundle.award.state.collapse_to_sequential();
        }

        let next = bundle
            .award
            .status()
            .next()
            .ok_or(WorkflowError::InvalidTransition { status: current })?;
        bundle.award.state.set_status(next);

        if next == AwardStatus::Complete {
            break;
        }
        if !assignment::resolve_active_users(&bundle.award).is_empty() {
            set_date_assigned_for_active_stages(bundle, now);
            break;
        }
        tracing::debug!(
            award.id = bundle.award.id,
            status = ?next,
            "no assigned user at status, skipping forward"
        );
    }

    let new_status = bundle.award.status();
    tracing::info!(
        award.id = bundle.award.id,
        from = ?status,
        to = ?new_status,
        "award advanced"
    );

    if !matches!(new_status, AwardStatus::New | AwardStatus::Complete)
        && !bundle.award.state.dual_setup()
    {
        notifications.push(notify::stage_update(bundle, config, false));
    }
    if new_status == AwardStatus::Setup {
        proposal::copy_proposal_into_setup(bundle);
        notifications.push(notify::setup_reached(bundle, config));
        if bundle.award.assignments.subaward.is_some()
            && !bundle.award.state.routed_to_modification()
            && !bundle.award.state.dual_setup()
        {
            notifications.push(notify::subaward_heads_up(bundle, config));
        }
    }

    stamp_stage_completion(bundle, now);
    Ok(TransitionOutcome {
        advanced: true,
        notifications,
    })
}

/// Hand intake off to negotiation and setup concurrently.
///
/// Status moves to negotiation when a negotiator exists, otherwise straight
/// to setup. With `dual_mode` both tracks are marked active and both
/// sections get their assignment date.
pub fn split_to_parallel_tracks(
    bundle: &mut AwardBundle,
    dual_mode: bool,
    config: &NotificationConfig,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, WorkflowError> {
    let status = bundle.award.status();
    require_sequential(bundle, "parallel negotiation/setup hand-off")?;
    if matches!(status, AwardStatus::New | AwardStatus::Complete) {
        return Err(WorkflowError::InvalidTransition { status });
    }

    step_past_intake(bundle, now);

    if dual_mode {
        store::current_negotiation_mut(bundle).date_assigned = Some(now);
        bundle.setup.date_assigned = Some(now);
        bundle.award.state = WorkflowState::ParallelNegotiationSetup {
            status: bundle.award.status(),
        };
    }

    let mut notifications = Vec::new();
    let new_status = bundle.award.status();
    if !matches!(new_status, AwardStatus::New | AwardStatus::Complete) {
        notifications.push(notify::stage_update(bundle, config, false));
    }
    if new_status == AwardStatus::Negotiation
        && bundle.award.assignments.subaward.is_some()
        && bundle.award.state.dual_setup()
    {
        notifications.push(notify::subaward_heads_up(bundle, config));
    }

    stamp_stage_completion(bundle, now);
    Ok(TransitionOutcome {
        advanced: true,
        notifications,
    })
}

/// Hand intake off to negotiation paired with a modification section, so the
/// negotiation and post-award teams can work concurrently.
pub fn route_to_modification_track(
    bundle: &mut AwardBundle,
    dual_modification: bool,
    config: &NotificationConfig,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, WorkflowError> {
    let status = bundle.award.status();
    require_sequential(bundle, "negotiation/modification hand-off")?;
    if matches!(status, AwardStatus::New | AwardStatus::Complete) {
        return Err(WorkflowError::InvalidTransition { status });
    }

    step_past_intake(bundle, now);

    if let Some(modification) = bundle.latest_modification_mut() {
        modification.date_assigned = Some(now);
    }
    if dual_modification {
        bundle.award.state = WorkflowState::ParallelNegotiationModification {
            status: bundle.award.status(),
            common: true,
        };
    }

    let mut notifications = Vec::new();
    let new_status = bundle.award.status();
    if !matches!(new_status, AwardStatus::New | AwardStatus::Complete) {
        notifications.push(notify::stage_update(bundle, config, false));
    }

    stamp_stage_completion(bundle, now);
    Ok(TransitionOutcome {
        advanced: true,
        notifications,
    })
}

/// Decide, inside the setup flow, whether setup work is redirected into a
/// modification section.
///
/// With `modification_flag` the award is routed to the modification track:
/// the pending modification row is marked edited and the setup section's
/// fields are cloned into a fresh pending row. `setup_flag` only controls
/// the assignment notification on the normal setup path.
pub fn mark_modification_flow(
    bundle: &mut AwardBundle,
    modification_flag: bool,
    setup_flag: bool,
    config: &NotificationConfig,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, WorkflowError> {
    let status = bundle.award.status();
    require_sequential(bundle, "setup/modification routing")?;
    if matches!(status, AwardStatus::New | AwardStatus::Complete) {
        return Err(WorkflowError::InvalidTransition { status });
    }

    step_past_intake(bundle, now);

    if modification_flag {
        bundle.award.state = WorkflowState::RoutedToModification {
            status: bundle.award.status(),
        };
    }

    let mut notifications = Vec::new();
    let new_status = bundle.award.status();
    if setup_flag {
        notifications.push(notify::stage_update(bundle, config, false));
    }
    if new_status == AwardStatus::Setup && modification_flag {
        notifications.push(notify::stage_update(bundle, config, true));
    }
    if new_status == AwardStatus::Setup {
        proposal::copy_proposal_into_setup(bundle);
    }

    if modification_flag {
        if let Some(pending) = bundle.latest_pending_modification_mut() {
            pending.is_edited = true;
        }
        let id = bundle.alloc_section_id();
        let row = AwardModification::cloned_from_setup(id, &bundle.setup);
        bundle.modifications.push(row);
        tracing::info!(
            award.id = bundle.award.id,
            "setup redirected to modification track"
        );
    }

    stamp_stage_completion(bundle, now);
    Ok(TransitionOutcome {
        advanced: true,
        notifications,
    })
}

/// Start a new modification cycle.
///
/// Closes out the current acceptance and negotiation cycles, clones them
/// into fresh current rows labeled by generation, resets the award to
/// intake, clears all routing and done flags, and opens a fresh pending
/// modification row. Runs as one all-or-nothing unit with the surrounding
/// save.
pub fn create_modification_cycle(
    bundle: &mut AwardBundle,
    award_type_label: &str,
    config: &NotificationConfig,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, WorkflowError> {
    let status = bundle.award.status();
    if status == AwardStatus::New {
        return Err(WorkflowError::InvalidTransition { status });
    }
    if award_type_label.trim().is_empty() {
        return Err(WorkflowError::Validation(
            "a label is required to create a modification".to_string(),
        ));
    }

    let label = if award_type_label == "Modification" {
        format!("Modification #{}", bundle.acceptances.len())
    } else {
        award_type_label.to_string()
    };

    let mut notifications = Vec::new();
    if store::current_acceptance(bundle).phs_funded == Some(true) {
        notifications.push(notify::phs_funded(bundle, config, true));
    }

    store::current_acceptance_mut(bundle)
        .acceptance_completion_date
        .get_or_insert(now);
    store::clone_acceptance_into_new_cycle(bundle, &label, now);

    store::current_negotiation_mut(bundle)
        .negotiation_completion_date
        .get_or_insert(now);
    store::clone_negotiation_into_new_cycle(bundle, &label, now);

    bundle.setup.wait_for = None;
    if let Some(modification) = bundle.latest_modification_mut() {
        modification.is_edited = true;
    }
    let id = bundle.alloc_section_id();
    let award_id = bundle.award.id;
    bundle.modifications.push(AwardModification::new(id, award_id));

    bundle.award.state = WorkflowState::Sequential {
        status: AwardStatus::Intake,
    };
    bundle.award.subaward_done = false;
    bundle.award.management_done = false;

    // Open step ranges belong to the cycle that ends here; only acceptance
    // rows stay open across generations.
    for entry in bundle.audit.iter_mut() {
        if entry.is_open() && entry.workflow_step != Stage::Acceptance.name() {
            entry.date_completed = Some(now);
        }
    }

    let generation = bundle.generation_label();
    audit::record_stage_entry(bundle, &generation, Stage::Acceptance, now);
    notifications.push(notify::stage_update(bundle, config, false));

    tracing::info!(
        award.id = bundle.award.id,
        label = %label,
        "modification cycle created, award reset to intake"
    );
    Ok(TransitionOutcome {
        advanced: true,
        notifications,
    })
}

/// Stamp `date_assigned` on the sections of the currently active stages.
fn set_date_assigned_for_active_stages(bundle: &mut AwardBundle, now: DateTime<Utc>) {
    for &stage in registry::active_stages(bundle.award.status()) {
        match stage {
            Stage::Negotiation => {
                store::current_negotiation_mut(bundle).date_assigned = Some(now);
            }
            Stage::Setup => bundle.setup.date_assigned = Some(now),
            Stage::Management => bundle.management.date_assigned = Some(now),
            Stage::Closeout => bundle.closeout.date_assigned = Some(now),
            // Acceptance cycles track their creation date; subawards are
            // independent rows with their own dates.
            _ => {}
        }
    }
}

/// Shared hand-off step: move into negotiation when a negotiator exists,
/// otherwise jump intake straight to setup.
fn step_past_intake(bundle: &mut AwardBundle, now: DateTime<Utc>) {
    let status = bundle.award.status();
    if bundle.award.assignments.negotiation.is_some() {
        if let Some(next) = status.next() {
            bundle.award.state.set_status(next);
        }
        let negotiation = store::current_negotiation_mut(bundle);
        if negotiation.date_assigned.is_none() {
            negotiation.date_assigned = Some(now);
        }
    } else {
        if status == AwardStatus::Intake {
            bundle.award.state.set_status(AwardStatus::Setup);
        }
        bundle.setup.date_assigned = Some(now);
    }
}

fn require_sequential(bundle: &AwardBundle, operation: &str) -> Result<(), WorkflowError> {
    if matches!(bundle.award.state, WorkflowState::Sequential { .. }) {
        Ok(())
    } else {
        Err(WorkflowError::UnsupportedCombination {
            status: bundle.award.status(),
            detail: format!("{operation} requires the sequential track"),
        })
    }
}
